//! Stock valuation and expiry queries.

use chrono::NaiveDate;
use serde::Serialize;

use fishledger_core::{LocationId, ProductId};

use crate::batch::Batch;
use crate::ledger::StockLedger;

/// Value of the stock held at one (product, location).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockValuation {
    pub product: ProductId,
    pub location: LocationId,
    pub quantity: f64,
    pub value: f64,
    pub average_cost: Option<f64>,
    pub batches: usize,
}

/// A batch that expires before a given date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpiringBatch {
    pub product: ProductId,
    pub location: LocationId,
    pub batch: Batch,
}

impl StockLedger {
    /// One row per non-empty (product, location), ordered by product then location.
    pub fn valuation(&self) -> Vec<StockValuation> {
        self.slices()
            .map(|(product, location, batches)| {
                let quantity: f64 = batches.iter().map(|b| b.quantity).sum();
                let value: f64 = batches.iter().map(Batch::value).sum();
                StockValuation {
                    product,
                    location,
                    quantity,
                    value,
                    average_cost: self.weighted_average_cost(product, location),
                    batches: batches.len(),
                }
            })
            .collect()
    }

    pub fn total_value(&self) -> f64 {
        self.slices()
            .flat_map(|(_, _, batches)| batches.iter())
            .map(Batch::value)
            .sum()
    }

    /// Batches with `expiry < date`, soonest first.
    pub fn expiring_before(&self, date: NaiveDate) -> Vec<ExpiringBatch> {
        let mut expiring: Vec<ExpiringBatch> = self
            .slices()
            .flat_map(|(product, location, batches)| {
                batches
                    .iter()
                    .filter(move |b| b.expiry < date)
                    .map(move |b| ExpiringBatch {
                        product,
                        location,
                        batch: b.clone(),
                    })
            })
            .collect();
        expiring.sort_by(|a, b| a.batch.expiry.cmp(&b.batch.expiry));
        expiring
    }
}
