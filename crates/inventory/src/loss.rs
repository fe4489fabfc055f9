//! Loss records: declared waste and value lost through counts or transit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use fishledger_core::{
    DomainError, Entity, InventoryCountId, LocationId, LossId, ProductId, TransferId,
};

use crate::consumption::ConsumedLine;
use crate::error::StockResult;
use crate::transaction::LedgerTransaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossKind {
    Spoilage,
    Breakage,
    InventoryGap,
    InTransit,
    Other,
}

impl LossKind {
    /// Kinds a user may declare by hand; the others are produced by counts
    /// and transfers.
    pub fn is_declarable(self) -> bool {
        matches!(self, LossKind::Spoilage | LossKind::Breakage | LossKind::Other)
    }
}

/// What produced the loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum LossOrigin {
    Declared,
    Count(InventoryCountId),
    Transfer(TransferId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loss {
    pub id: LossId,
    pub product: ProductId,
    pub location: LocationId,
    pub kind: LossKind,
    pub origin: LossOrigin,
    pub quantity: f64,
    pub value: f64,
    pub date: NaiveDate,
    /// Lots the loss was taken from, when stock was consumed.
    pub lines: Vec<ConsumedLine>,
    pub note: Option<String>,
}

/// Input of a hand-declared loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclareLoss {
    pub product: ProductId,
    pub location: LocationId,
    pub kind: LossKind,
    pub quantity: f64,
    pub note: Option<String>,
}

impl Loss {
    /// Remove declared waste from stock (FEFO) and value it at lot cost.
    pub fn declare(
        tx: &mut LedgerTransaction<'_>,
        id: LossId,
        request: DeclareLoss,
        date: NaiveDate,
    ) -> StockResult<Self> {
        if !request.kind.is_declarable() {
            return Err(DomainError::validation(format!(
                "{:?} losses are recorded automatically",
                request.kind
            ))
            .into());
        }
        if !request.quantity.is_finite() || request.quantity <= 0.0 {
            return Err(DomainError::validation("loss quantity must be positive").into());
        }

        let consumption = tx.consume(request.product, request.location, request.quantity);
        Ok(Self {
            id,
            product: request.product,
            location: request.location,
            kind: request.kind,
            origin: LossOrigin::Declared,
            quantity: consumption.taken(),
            value: consumption.total_cost,
            date,
            lines: consumption.lines,
            note: request.note,
        })
    }

    /// Shrinkage found by an inventory count; stock was already consumed.
    pub fn inventory_gap(
        id: LossId,
        count: InventoryCountId,
        product: ProductId,
        location: LocationId,
        lines: Vec<ConsumedLine>,
        date: NaiveDate,
    ) -> Self {
        Self {
            id,
            product,
            location,
            kind: LossKind::InventoryGap,
            origin: LossOrigin::Count(count),
            quantity: lines.iter().map(|l| l.quantity).sum(),
            value: lines.iter().map(ConsumedLine::cost).sum(),
            date,
            lines,
            note: None,
        }
    }

    /// Quantity shipped but never received at the destination.
    pub fn in_transit(
        id: LossId,
        transfer: TransferId,
        product: ProductId,
        destination: LocationId,
        quantity: f64,
        unit_cost: f64,
        date: NaiveDate,
    ) -> Self {
        Self {
            id,
            product,
            location: destination,
            kind: LossKind::InTransit,
            origin: LossOrigin::Transfer(transfer),
            quantity,
            value: quantity * unit_cost,
            date,
            lines: Vec::new(),
            note: None,
        }
    }
}

impl Entity for Loss {
    type Id = LossId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{NewBatch, SourceRef};
    use crate::error::StockError;
    use crate::ledger::StockLedger;
    use chrono::Utc;
    use fishledger_core::DocumentId;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 8).unwrap()
    }

    fn ledger() -> StockLedger {
        let mut ledger = StockLedger::default();
        ledger
            .receive(NewBatch {
                product: ProductId(1),
                location: LocationId(1),
                lot: "A".to_string(),
                quantity: 10.0,
                unit_cost: 4000.0,
                expiry: day(),
                source: SourceRef::Opening,
            })
            .unwrap();
        ledger
    }

    fn request(kind: LossKind, quantity: f64) -> DeclareLoss {
        DeclareLoss {
            product: ProductId(1),
            location: LocationId(1),
            kind,
            quantity,
            note: Some("fridge failure".to_string()),
        }
    }

    #[test]
    fn declared_spoilage_consumes_and_values_at_lot_cost() {
        let ledger = ledger();
        let mut tx = ledger.begin(Utc::now());

        let loss = Loss::declare(&mut tx, LossId::new(DocumentId::from_sequence(1)), request(LossKind::Spoilage, 2.5), day())
            .unwrap();

        assert_eq!(loss.value, 10_000.0);
        assert_eq!(loss.quantity, 2.5);
        assert_eq!(loss.origin, LossOrigin::Declared);
        assert_eq!(tx.on_hand(ProductId(1), LocationId(1)), 7.5);
    }

    #[test]
    fn generated_kinds_cannot_be_declared() {
        let ledger = ledger();
        let mut tx = ledger.begin(Utc::now());
        let err = Loss::declare(&mut tx, LossId::new(DocumentId::from_sequence(1)), request(LossKind::InTransit, 1.0), day())
            .unwrap_err();
        assert!(matches!(err, StockError::Domain(DomainError::Validation(_))));
    }

    #[test]
    fn declaring_more_than_on_hand_fails_at_commit() {
        let ledger = ledger();
        let mut tx = ledger.begin(Utc::now());
        Loss::declare(&mut tx, LossId::new(DocumentId::from_sequence(1)), request(LossKind::Breakage, 12.0), day()).unwrap();
        assert!(matches!(tx.commit(), Err(StockError::Insufficient(_))));
    }

    #[test]
    fn in_transit_loss_is_valued_at_shipped_cost() {
        let loss = Loss::in_transit(
            LossId::new(DocumentId::from_sequence(3)),
            TransferId::new(DocumentId::from_sequence(2)),
            ProductId(1),
            LocationId(2),
            1.5,
            5800.0,
            day(),
        );
        assert_eq!(loss.value, 8700.0);
        assert_eq!(loss.kind, LossKind::InTransit);
    }
}
