//! FEFO consumption walk.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::batch::{Batch, SourceRef};

/// Slice taken from one batch by a consumption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumedLine {
    pub lot: String,
    pub quantity: f64,
    /// Lot cost at receipt, not a blended average.
    pub unit_cost: f64,
    pub expiry: NaiveDate,
    pub source: SourceRef,
}

impl ConsumedLine {
    pub fn cost(&self) -> f64 {
        self.quantity * self.unit_cost
    }
}

/// Outcome of consuming a quantity at one (product, location).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionResult {
    pub requested: f64,
    pub lines: Vec<ConsumedLine>,
    pub total_cost: f64,
    pub shortfall: f64,
}

impl ConsumptionResult {
    pub fn empty() -> Self {
        Self {
            requested: 0.0,
            lines: Vec::new(),
            total_cost: 0.0,
            shortfall: 0.0,
        }
    }

    /// Quantity actually taken from batches.
    pub fn taken(&self) -> f64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn is_short(&self, epsilon: f64) -> bool {
        self.shortfall > epsilon
    }
}

/// Consume `requested` from `batches`, earliest expiry first.
///
/// Batches are stably sorted by expiry, so equal expiries keep insertion
/// order. Batches left at or below `epsilon` are removed. Non-positive or
/// non-finite requests take nothing.
pub(crate) fn consume_fefo(batches: &mut Vec<Batch>, requested: f64, epsilon: f64) -> ConsumptionResult {
    if !requested.is_finite() || requested <= 0.0 {
        return ConsumptionResult::empty();
    }

    batches.sort_by(|a, b| a.expiry.cmp(&b.expiry));

    let mut remaining = requested;
    let mut total_cost = 0.0;
    let mut lines = Vec::new();

    for batch in batches.iter_mut() {
        if remaining <= epsilon {
            break;
        }
        let taken = batch.quantity.min(remaining);
        if taken <= 0.0 {
            continue;
        }
        batch.quantity -= taken;
        remaining -= taken;
        total_cost += taken * batch.unit_cost;
        lines.push(ConsumedLine {
            lot: batch.lot.clone(),
            quantity: taken,
            unit_cost: batch.unit_cost,
            expiry: batch.expiry,
            source: batch.source,
        });
    }

    batches.retain(|b| b.quantity > epsilon);

    ConsumptionResult {
        requested,
        lines,
        total_cost,
        shortfall: remaining.max(0.0),
    }
}

/// `Σ qty·cost / Σ qty`, or `None` when there is nothing to average over.
pub(crate) fn weighted_average_cost(batches: &[Batch], epsilon: f64) -> Option<f64> {
    let quantity: f64 = batches.iter().map(|b| b.quantity).sum();
    if quantity <= epsilon {
        return None;
    }
    let value: f64 = batches.iter().map(Batch::value).sum();
    Some(value / quantity)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 0.001;

    fn batch(lot: &str, quantity: f64, unit_cost: f64, day: u32) -> Batch {
        Batch {
            lot: lot.to_string(),
            quantity,
            unit_cost,
            expiry: NaiveDate::from_ymd_opt(2025, 8, day).unwrap(),
            source: SourceRef::Opening,
        }
    }

    #[test]
    fn takes_earliest_expiry_first_regardless_of_storage_order() {
        let mut batches = vec![batch("late", 10.0, 2.0, 20), batch("early", 10.0, 1.0, 5)];

        let result = consume_fefo(&mut batches, 4.0, EPS);

        assert_eq!(result.lines.len(), 1);
        assert_eq!(result.lines[0].lot, "early");
        assert_eq!(result.total_cost, 4.0);
        assert_eq!(batches.iter().find(|b| b.lot == "late").unwrap().quantity, 10.0);
    }

    #[test]
    fn equal_expiries_keep_insertion_order() {
        let mut batches = vec![batch("first", 5.0, 1.0, 8), batch("second", 5.0, 9.0, 8)];

        let result = consume_fefo(&mut batches, 6.0, EPS);

        let lots: Vec<_> = result.lines.iter().map(|l| l.lot.as_str()).collect();
        assert_eq!(lots, vec!["first", "second"]);
        assert_eq!(result.total_cost, 5.0 + 9.0);
    }

    #[test]
    fn residue_below_epsilon_is_pruned() {
        let mut batches = vec![batch("A", 1.0005, 1.0, 1)];

        let result = consume_fefo(&mut batches, 1.0, EPS);

        assert!(batches.is_empty());
        assert_eq!(result.shortfall, 0.0);
    }

    #[test]
    fn shortfall_reports_what_could_not_be_taken() {
        let mut batches = vec![batch("A", 3.0, 2.0, 1)];

        let result = consume_fefo(&mut batches, 5.0, EPS);

        assert_eq!(result.taken(), 3.0);
        assert_eq!(result.shortfall, 2.0);
        assert!(result.is_short(EPS));
        assert!(batches.is_empty());
    }

    #[test]
    fn non_positive_request_is_a_no_op() {
        let mut batches = vec![batch("A", 3.0, 2.0, 1)];
        assert_eq!(consume_fefo(&mut batches, 0.0, EPS), ConsumptionResult::empty());
        assert_eq!(consume_fefo(&mut batches, -2.0, EPS), ConsumptionResult::empty());
        assert_eq!(batches[0].quantity, 3.0);
    }

    #[test]
    fn weighted_average_is_none_for_empty_slice() {
        assert_eq!(weighted_average_cost(&[], EPS), None);
        let batches = vec![batch("A", 100.0, 5500.0, 8), batch("B", 30.0, 5800.0, 10)];
        let avg = weighted_average_cost(&batches, EPS).unwrap();
        assert!((avg - 724_000.0 / 130.0).abs() < 1e-9);
    }
}
