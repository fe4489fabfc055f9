//! Transfers between locations.
//!
//! Dispatch consumes FEFO at the source and ships the consumed slices as
//! transfer lines; receipt books each line at the destination with its
//! as-shipped cost and expiry. Whatever goes missing on the road becomes an
//! in-transit loss.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use fishledger_core::{DomainError, Entity, IdGenerator, LocationId, LossId, ProductId, TransferId};

use crate::batch::{NewBatch, SourceRef};
use crate::error::StockResult;
use crate::loss::Loss;
use crate::transaction::LedgerTransaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    InTransit,
    Received,
}

/// What the source is asked to ship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequestLine {
    pub product: ProductId,
    pub quantity: f64,
}

/// One shipped lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferLine {
    pub line_no: u32,
    pub product: ProductId,
    pub lot: String,
    pub quantity_sent: f64,
    pub quantity_received: Option<f64>,
    pub unit_cost: f64,
    pub expiry: NaiveDate,
}

/// Quantity actually counted at the destination for one line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceivedQuantity {
    pub line_no: u32,
    pub quantity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: TransferId,
    pub from: LocationId,
    pub to: LocationId,
    pub status: TransferStatus,
    pub dispatched_on: NaiveDate,
    pub received_on: Option<NaiveDate>,
    pub lines: Vec<TransferLine>,
}

impl Transfer {
    /// Consume the requested quantities at `from` and build the shipment.
    pub fn dispatch(
        tx: &mut LedgerTransaction<'_>,
        id: TransferId,
        from: LocationId,
        to: LocationId,
        requests: &[TransferRequestLine],
        date: NaiveDate,
    ) -> StockResult<Self> {
        if from == to {
            return Err(DomainError::validation("transfer source and destination must differ").into());
        }
        if requests.is_empty() {
            return Err(DomainError::validation("transfer must have lines").into());
        }
        if let Some(bad) = requests.iter().find(|r| !r.quantity.is_finite() || r.quantity <= 0.0) {
            return Err(DomainError::validation(format!(
                "transfer quantity for {} must be positive",
                bad.product
            ))
            .into());
        }

        let mut lines: Vec<TransferLine> = Vec::new();
        for request in requests {
            let consumption = tx.consume(request.product, from, request.quantity);
            for slice in consumption.lines {
                // Two requests for the same product can split one lot.
                if let Some(line) = lines
                    .iter_mut()
                    .find(|l| l.product == request.product && l.lot == slice.lot)
                {
                    line.quantity_sent += slice.quantity;
                    continue;
                }
                lines.push(TransferLine {
                    line_no: lines.len() as u32 + 1,
                    product: request.product,
                    lot: slice.lot,
                    quantity_sent: slice.quantity,
                    quantity_received: None,
                    unit_cost: slice.unit_cost,
                    expiry: slice.expiry,
                });
            }
        }

        Ok(Self {
            id,
            from,
            to,
            status: TransferStatus::InTransit,
            dispatched_on: date,
            received_on: None,
            lines,
        })
    }

    /// Book the shipment at the destination.
    ///
    /// Lines absent from `received` are taken as received in full. Returns
    /// one in-transit loss per line that arrived short.
    pub fn receive(
        &mut self,
        tx: &mut LedgerTransaction<'_>,
        received: &[ReceivedQuantity],
        ids: &dyn IdGenerator,
        date: NaiveDate,
    ) -> StockResult<Vec<Loss>> {
        if self.status != TransferStatus::InTransit {
            return Err(DomainError::invariant("transfer was already received").into());
        }

        let epsilon = tx.epsilon();
        let mut counted: HashMap<u32, f64> = HashMap::new();
        for r in received {
            if !self.lines.iter().any(|l| l.line_no == r.line_no) {
                return Err(DomainError::validation(format!("transfer has no line {}", r.line_no)).into());
            }
            counted.insert(r.line_no, r.quantity);
        }

        let mut quantities = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            let got = counted.get(&line.line_no).copied().unwrap_or(line.quantity_sent);
            if !got.is_finite() || got < 0.0 {
                return Err(DomainError::validation(format!(
                    "line {}: received quantity must be non-negative",
                    line.line_no
                ))
                .into());
            }
            if got > line.quantity_sent + epsilon {
                return Err(DomainError::validation(format!(
                    "line {}: received {} but only {} was sent",
                    line.line_no, got, line.quantity_sent
                ))
                .into());
            }
            quantities.push(got);
        }

        let prefix = tx.config().transfer_lot_prefix.clone();
        let mut losses = Vec::new();
        for (line, got) in self.lines.iter().zip(&quantities) {
            let got = *got;
            if got > epsilon {
                tx.receive(NewBatch {
                    product: line.product,
                    location: self.to,
                    lot: format!("{}{}-{}", prefix, self.id.short(), line.lot),
                    quantity: got,
                    unit_cost: line.unit_cost,
                    expiry: line.expiry,
                    source: SourceRef::Transfer(self.id),
                })?;
            }

            let discrepancy = line.quantity_sent - got;
            if discrepancy > epsilon {
                losses.push(Loss::in_transit(
                    LossId::new(ids.next_id()),
                    self.id,
                    line.product,
                    self.to,
                    discrepancy,
                    line.unit_cost,
                    date,
                ));
            }
        }

        for (line, got) in self.lines.iter_mut().zip(quantities) {
            line.quantity_received = Some(got);
        }
        self.status = TransferStatus::Received;
        self.received_on = Some(date);
        Ok(losses)
    }

    pub fn value_sent(&self) -> f64 {
        self.lines.iter().map(|l| l.quantity_sent * l.unit_cost).sum()
    }
}

impl Entity for Transfer {
    type Id = TransferId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StockError;
    use crate::ledger::StockLedger;
    use crate::loss::LossKind;
    use chrono::Utc;
    use fishledger_core::{DocumentId, SequenceIdGenerator};

    const FISH: ProductId = ProductId(1);
    const WAREHOUSE: LocationId = LocationId(1);
    const STORE: LocationId = LocationId(2);

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, d).unwrap()
    }

    fn transfer_id() -> TransferId {
        TransferId::new(DocumentId::from_sequence(42))
    }

    fn ledger() -> StockLedger {
        let mut ledger = StockLedger::default();
        for (lot, qty, cost, day) in [("A", 100.0, 5500.0, 8), ("B", 30.0, 5800.0, 10)] {
            ledger
                .receive(NewBatch {
                    product: FISH,
                    location: WAREHOUSE,
                    lot: lot.to_string(),
                    quantity: qty,
                    unit_cost: cost,
                    expiry: date(day),
                    source: SourceRef::Opening,
                })
                .unwrap();
        }
        ledger
    }

    fn dispatch(ledger: &mut StockLedger, quantity: f64) -> Transfer {
        let mut tx = ledger.begin(Utc::now());
        let transfer = Transfer::dispatch(
            &mut tx,
            transfer_id(),
            WAREHOUSE,
            STORE,
            &[TransferRequestLine { product: FISH, quantity }],
            date(1),
        )
        .unwrap();
        let changes = tx.commit().unwrap();
        ledger.apply(changes);
        transfer
    }

    #[test]
    fn dispatch_ships_consumed_slices_with_their_cost_and_expiry() {
        let mut ledger = ledger();

        let transfer = dispatch(&mut ledger, 110.0);

        assert_eq!(transfer.status, TransferStatus::InTransit);
        assert_eq!(transfer.lines.len(), 2);
        assert_eq!(transfer.lines[0].lot, "A");
        assert_eq!(transfer.lines[0].quantity_sent, 100.0);
        assert_eq!(transfer.lines[1].unit_cost, 5800.0);
        assert_eq!(transfer.lines[1].expiry, date(10));
        assert_eq!(transfer.value_sent(), 608_000.0);
        assert_eq!(ledger.on_hand(FISH, WAREHOUSE), 20.0);
    }

    #[test]
    fn split_requests_for_one_lot_merge_into_one_line() {
        let ledger = ledger();
        let mut tx = ledger.begin(Utc::now());
        let transfer = Transfer::dispatch(
            &mut tx,
            transfer_id(),
            WAREHOUSE,
            STORE,
            &[
                TransferRequestLine { product: FISH, quantity: 10.0 },
                TransferRequestLine { product: FISH, quantity: 5.0 },
            ],
            date(1),
        )
        .unwrap();
        assert_eq!(transfer.lines.len(), 1);
        assert_eq!(transfer.lines[0].quantity_sent, 15.0);
    }

    #[test]
    fn dispatch_beyond_stock_aborts() {
        let ledger = ledger();
        let mut tx = ledger.begin(Utc::now());
        Transfer::dispatch(
            &mut tx,
            transfer_id(),
            WAREHOUSE,
            STORE,
            &[TransferRequestLine { product: FISH, quantity: 500.0 }],
            date(1),
        )
        .unwrap();
        assert!(matches!(tx.commit(), Err(StockError::Insufficient(_))));
        assert_eq!(ledger.on_hand(FISH, WAREHOUSE), 130.0);
    }

    #[test]
    fn receipt_books_renamed_lots_and_records_transit_loss() {
        let mut ledger = ledger();
        let mut transfer = dispatch(&mut ledger, 110.0);
        let ids = SequenceIdGenerator::new();

        let mut tx = ledger.begin(Utc::now());
        let losses = transfer
            .receive(&mut tx, &[ReceivedQuantity { line_no: 2, quantity: 8.5 }], &ids, date(2))
            .unwrap();
        let changes = tx.commit().unwrap();
        ledger.apply(changes);

        assert_eq!(transfer.status, TransferStatus::Received);
        assert_eq!(transfer.lines[0].quantity_received, Some(100.0));
        assert_eq!(losses.len(), 1);
        assert_eq!(losses[0].kind, LossKind::InTransit);
        assert_eq!(losses[0].quantity, 1.5);
        assert_eq!(losses[0].value, 1.5 * 5800.0);

        let lots: Vec<_> = ledger.batches(FISH, STORE).iter().map(|b| b.lot.clone()).collect();
        assert_eq!(lots, vec!["TR0000002A-A".to_string(), "TR0000002A-B".to_string()]);
        assert_eq!(ledger.batches(FISH, STORE)[0].unit_cost, 5500.0);
        assert_eq!(ledger.on_hand(FISH, STORE), 108.5);
    }

    #[test]
    fn receiving_more_than_sent_is_rejected() {
        let mut ledger = ledger();
        let mut transfer = dispatch(&mut ledger, 10.0);
        let ids = SequenceIdGenerator::new();

        let mut tx = ledger.begin(Utc::now());
        let err = transfer
            .receive(&mut tx, &[ReceivedQuantity { line_no: 1, quantity: 11.0 }], &ids, date(2))
            .unwrap_err();
        assert!(matches!(err, StockError::Domain(DomainError::Validation(_))));
    }

    #[test]
    fn transfer_cannot_be_received_twice() {
        let mut ledger = ledger();
        let mut transfer = dispatch(&mut ledger, 10.0);
        let ids = SequenceIdGenerator::new();

        let mut tx = ledger.begin(Utc::now());
        transfer.receive(&mut tx, &[], &ids, date(2)).unwrap();
        let err = transfer.receive(&mut tx, &[], &ids, date(3)).unwrap_err();
        assert!(matches!(err, StockError::Domain(DomainError::InvariantViolation(_))));
    }

    #[test]
    fn same_source_and_destination_is_rejected() {
        let ledger = ledger();
        let mut tx = ledger.begin(Utc::now());
        let err = Transfer::dispatch(
            &mut tx,
            transfer_id(),
            WAREHOUSE,
            WAREHOUSE,
            &[TransferRequestLine { product: FISH, quantity: 1.0 }],
            date(1),
        )
        .unwrap_err();
        assert!(matches!(err, StockError::Domain(DomainError::Validation(_))));
    }
}
