use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use fishledger_catalog::Catalog;
use fishledger_core::{DomainError, DomainResult, Entity, LocationId, SaleClosureId, SalesUnitId};
use fishledger_inventory::{LedgerTransaction, StockResult};

use crate::fulfilment::{LineValuation, SoldQuantity, consume_sold};

/// Closure status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClosureStatus {
    Draft,
    Validated,
}

/// Till line: what was rung up for one sales unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleLine {
    pub line_no: u32,
    pub sales_unit: SalesUnitId,
    pub quantity: f64,
    pub valuation: Option<LineValuation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClosureSummary {
    pub revenue: f64,
    pub cost: f64,
    pub margin: f64,
}

/// End-of-day till closure for one store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleClosure {
    pub id: SaleClosureId,
    pub location: LocationId,
    pub business_date: NaiveDate,
    pub status: ClosureStatus,
    pub lines: Vec<SaleLine>,
    pub summary: Option<ClosureSummary>,
}

impl SaleClosure {
    pub fn draft(id: SaleClosureId, location: LocationId, business_date: NaiveDate) -> Self {
        Self {
            id,
            location,
            business_date,
            status: ClosureStatus::Draft,
            lines: Vec::new(),
            summary: None,
        }
    }

    pub fn add_line(&mut self, sales_unit: SalesUnitId, quantity: f64) -> DomainResult<u32> {
        if self.status != ClosureStatus::Draft {
            return Err(DomainError::invariant("cannot modify a validated closure"));
        }
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        let line_no = self.lines.len() as u32 + 1;
        self.lines.push(SaleLine {
            line_no,
            sales_unit,
            quantity,
            valuation: None,
        });
        Ok(line_no)
    }

    /// Consume stock for every line and freeze the closure.
    pub fn validate(
        &mut self,
        tx: &mut LedgerTransaction<'_>,
        catalog: &dyn Catalog,
    ) -> StockResult<ClosureSummary> {
        if self.status != ClosureStatus::Draft {
            return Err(DomainError::invariant("closure was already validated").into());
        }
        if self.lines.is_empty() {
            return Err(DomainError::validation("cannot validate an empty closure").into());
        }

        let sold: Vec<SoldQuantity> = self
            .lines
            .iter()
            .map(|l| SoldQuantity {
                sales_unit: l.sales_unit,
                quantity: l.quantity,
            })
            .collect();
        let valuations = consume_sold(tx, catalog, self.location, &sold, &[])?;

        let revenue: f64 = valuations.iter().map(|v| v.revenue).sum();
        let cost: f64 = valuations.iter().map(|v| v.cost).sum();
        let summary = ClosureSummary {
            revenue,
            cost,
            margin: revenue - cost,
        };

        for (line, valuation) in self.lines.iter_mut().zip(valuations) {
            line.valuation = Some(valuation);
        }
        self.status = ClosureStatus::Validated;
        self.summary = Some(summary);
        Ok(summary)
    }
}

impl Entity for SaleClosure {
    type Id = SaleClosureId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fishledger_catalog::{InMemoryCatalog, Location, LocationKind, Product, SalesUnit, StockUnit};
    use fishledger_core::{DocumentId, ProductId};
    use fishledger_inventory::{NewBatch, SourceRef, StockError, StockLedger};

    const FISH: ProductId = ProductId(1);
    const SQUID: ProductId = ProductId(2);
    const STORE: LocationId = LocationId(1);
    const WHOLE: SalesUnitId = SalesUnitId(10);
    const FILLET: SalesUnitId = SalesUnitId(11);
    const RINGS: SalesUnitId = SalesUnitId(20);

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 8).unwrap()
    }

    fn catalog() -> InMemoryCatalog {
        let mut catalog = InMemoryCatalog::new();
        catalog.add_product(Product::new(FISH, "bream", StockUnit::Kg, 5600.0).unwrap()).unwrap();
        catalog.add_product(Product::new(SQUID, "squid", StockUnit::Kg, 3000.0).unwrap()).unwrap();
        catalog.add_sales_unit(SalesUnit::new(WHOLE, "whole kg", FISH, 1.0, 7000.0).unwrap()).unwrap();
        catalog.add_sales_unit(SalesUnit::new(FILLET, "fillet 250g", FISH, 0.5, 2500.0).unwrap()).unwrap();
        catalog.add_sales_unit(SalesUnit::new(RINGS, "rings kg", SQUID, 1.0, 4500.0).unwrap()).unwrap();
        catalog
            .add_location(Location {
                id: STORE,
                name: "Market".to_string(),
                kind: LocationKind::Store,
            })
            .unwrap();
        catalog
    }

    fn ledger() -> StockLedger {
        let mut ledger = StockLedger::default();
        for (product, lot, qty, cost) in [(FISH, "A", 100.0, 5500.0), (FISH, "B", 30.0, 5800.0), (SQUID, "S", 2.0, 2800.0)] {
            ledger
                .receive(NewBatch {
                    product,
                    location: STORE,
                    lot: lot.to_string(),
                    quantity: qty,
                    unit_cost: cost,
                    expiry: if lot == "B" { day().succ_opt().unwrap() } else { day() },
                    source: SourceRef::Opening,
                })
                .unwrap();
        }
        ledger
    }

    fn closure() -> SaleClosure {
        SaleClosure::draft(SaleClosureId::new(DocumentId::from_sequence(1)), STORE, day())
    }

    #[test]
    fn validation_converts_units_and_costs_fefo() {
        let mut ledger = ledger();
        let mut closure = closure();
        closure.add_line(WHOLE, 100.0).unwrap();
        closure.add_line(FILLET, 20.0).unwrap();

        let mut tx = ledger.begin(Utc::now());
        let summary = closure.validate(&mut tx, &catalog()).unwrap();
        let changes = tx.commit().unwrap();
        ledger.apply(changes);

        // 100 kg from A, then 20 fillets = 10 kg from B
        assert_eq!(summary.cost, 608_000.0);
        assert_eq!(summary.revenue, 100.0 * 7000.0 + 20.0 * 2500.0);
        assert_eq!(summary.margin, summary.revenue - summary.cost);
        assert_eq!(closure.lines[1].valuation.as_ref().unwrap().base_quantity, 10.0);
        assert_eq!(ledger.on_hand(FISH, STORE), 20.0);
        assert_eq!(closure.status, ClosureStatus::Validated);
    }

    #[test]
    fn short_line_aborts_the_whole_closure() {
        let ledger = ledger();
        let mut closure = closure();
        closure.add_line(WHOLE, 5.0).unwrap();
        closure.add_line(RINGS, 3.0).unwrap();

        let mut tx = ledger.begin(Utc::now());
        closure.validate(&mut tx, &catalog()).unwrap();
        let err = tx.commit().unwrap_err();

        assert_eq!(err.shortfalls().len(), 1);
        assert_eq!(err.shortfalls()[0].product, SQUID);
        assert_eq!(ledger.on_hand(FISH, STORE), 130.0);
        assert_eq!(ledger.on_hand(SQUID, STORE), 2.0);
    }

    #[test]
    fn unknown_sales_unit_aborts_before_consuming() {
        let ledger = ledger();
        let mut closure = closure();
        closure.add_line(WHOLE, 5.0).unwrap();
        closure.add_line(SalesUnitId(99), 1.0).unwrap();

        let mut tx = ledger.begin(Utc::now());
        let err = closure.validate(&mut tx, &catalog()).unwrap_err();

        assert!(matches!(err, StockError::ReferenceNotFound(ref what) if what.contains("99")));
        assert_eq!(tx.on_hand(FISH, STORE), 130.0);
        assert_eq!(closure.status, ClosureStatus::Draft);
    }

    #[test]
    fn empty_or_validated_closures_are_rejected() {
        let ledger = ledger();
        let mut closure = closure();
        let mut tx = ledger.begin(Utc::now());
        assert!(closure.validate(&mut tx, &catalog()).is_err());

        closure.add_line(WHOLE, 1.0).unwrap();
        closure.validate(&mut tx, &catalog()).unwrap();
        assert!(closure.add_line(WHOLE, 1.0).is_err());
        assert!(closure.validate(&mut tx, &catalog()).is_err());
    }
}
