use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::{NaiveDate, Utc};
use fishledger_core::{LocationId, ProductId};
use fishledger_inventory::{NewBatch, SourceRef, StockLedger};

const FISH: ProductId = ProductId(1);
const STORE: LocationId = LocationId(1);

fn ledger_with(batches: usize) -> StockLedger {
    let mut ledger = StockLedger::default();
    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    for i in 0..batches {
        // Reverse expiry order so every walk has to sort.
        let expiry = start + chrono::Days::new((batches - i) as u64);
        ledger
            .receive(NewBatch {
                product: FISH,
                location: STORE,
                lot: format!("L{i}"),
                quantity: 10.0,
                unit_cost: 5000.0 + i as f64,
                expiry,
                source: SourceRef::Opening,
            })
            .unwrap();
    }
    ledger
}

/// Raw FEFO walk draining half of the location.
fn bench_raw_consume(c: &mut Criterion) {
    let mut group = c.benchmark_group("raw_consume");
    for batches in [10usize, 100, 1_000] {
        group.throughput(Throughput::Elements(batches as u64));
        group.bench_with_input(BenchmarkId::from_parameter(batches), &batches, |b, &n| {
            let ledger = ledger_with(n);
            b.iter(|| {
                let mut ledger = ledger.clone();
                black_box(ledger.consume(FISH, STORE, n as f64 * 5.0));
            });
        });
    }
    group.finish();
}

/// Transactional consume + commit + apply: only the touched slice is copied.
fn bench_transactional_consume(c: &mut Criterion) {
    let mut group = c.benchmark_group("transactional_consume");
    for batches in [10usize, 100, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(batches), &batches, |b, &n| {
            let ledger = ledger_with(n);
            b.iter(|| {
                let mut ledger = ledger.clone();
                let mut tx = ledger.begin(Utc::now());
                tx.consume(FISH, STORE, n as f64 * 5.0);
                let changes = tx.commit().unwrap();
                black_box(ledger.apply(changes));
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_raw_consume, bench_transactional_consume);
criterion_main!(benches);
