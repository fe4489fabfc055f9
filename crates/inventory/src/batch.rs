use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use fishledger_core::{
    ArrivalId, DomainError, DomainResult, InventoryCountId, LocationId, ProductId,
    ProductionOrderId, TransferId,
};

/// Document a batch originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum SourceRef {
    /// Stock loaded when the ledger was opened.
    Opening,
    Arrival(ArrivalId),
    Transfer(TransferId),
    Production(ProductionOrderId),
    Adjustment(InventoryCountId),
}

/// A lot of one product physically present at one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub lot: String,
    pub quantity: f64,
    /// CUMP at receipt.
    pub unit_cost: f64,
    pub expiry: NaiveDate,
    pub source: SourceRef,
}

impl Batch {
    pub fn value(&self) -> f64 {
        self.quantity * self.unit_cost
    }
}

/// Request to put a new batch on the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBatch {
    pub product: ProductId,
    pub location: LocationId,
    pub lot: String,
    pub quantity: f64,
    pub unit_cost: f64,
    pub expiry: NaiveDate,
    pub source: SourceRef,
}

impl NewBatch {
    /// Invalid quantities and costs are rejected, never clamped.
    pub fn validate(&self) -> DomainResult<()> {
        if self.lot.trim().is_empty() {
            return Err(DomainError::validation("lot cannot be empty"));
        }
        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(DomainError::validation(format!(
                "lot {}: quantity must be positive (got {})",
                self.lot, self.quantity
            )));
        }
        if !self.unit_cost.is_finite() || self.unit_cost < 0.0 {
            return Err(DomainError::validation(format!(
                "lot {}: unit cost must be a non-negative number (got {})",
                self.lot, self.unit_cost
            )));
        }
        Ok(())
    }

    pub(crate) fn into_batch(self) -> Batch {
        Batch {
            lot: self.lot,
            quantity: self.quantity,
            unit_cost: self.unit_cost,
            expiry: self.expiry,
            source: self.source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(quantity: f64, unit_cost: f64) -> NewBatch {
        NewBatch {
            product: ProductId::new(1),
            location: LocationId::new(1),
            lot: "A".to_string(),
            quantity,
            unit_cost,
            expiry: NaiveDate::from_ymd_opt(2025, 8, 8).unwrap(),
            source: SourceRef::Opening,
        }
    }

    #[test]
    fn rejects_non_positive_or_non_finite_quantity() {
        assert!(request(0.0, 10.0).validate().is_err());
        assert!(request(-1.0, 10.0).validate().is_err());
        assert!(request(f64::NAN, 10.0).validate().is_err());
        assert!(request(1.0, 10.0).validate().is_ok());
    }

    #[test]
    fn rejects_negative_cost_but_accepts_free_stock() {
        assert!(request(1.0, -0.5).validate().is_err());
        assert!(request(1.0, 0.0).validate().is_ok());
    }

    #[test]
    fn source_ref_is_tagged() {
        let json = serde_json::to_value(SourceRef::Opening).unwrap();
        assert_eq!(json["kind"], "opening");
    }
}
