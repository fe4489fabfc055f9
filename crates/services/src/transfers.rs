use std::sync::Arc;

use fishledger_catalog::Catalog;
use fishledger_core::{DomainResult, LocationId, LossId, TransferId};
use fishledger_inventory::{
    Loss, ReceivedQuantity, StockError, StockResult, Transfer, TransferRequestLine,
};

use crate::ledger::LedgerService;
use crate::losses::record_all;
use crate::store::{DocumentStore, insert, load, save};

/// Stock moves between locations.
pub struct TransferService {
    ledger: Arc<LedgerService>,
    catalog: Arc<dyn Catalog>,
    transfers: Arc<dyn DocumentStore<TransferId, Transfer>>,
    losses: Arc<dyn DocumentStore<LossId, Loss>>,
}

impl TransferService {
    pub fn new(
        ledger: Arc<LedgerService>,
        catalog: Arc<dyn Catalog>,
        transfers: Arc<dyn DocumentStore<TransferId, Transfer>>,
        losses: Arc<dyn DocumentStore<LossId, Loss>>,
    ) -> Self {
        Self {
            ledger,
            catalog,
            transfers,
            losses,
        }
    }

    pub fn get(&self, id: TransferId) -> DomainResult<Option<Transfer>> {
        self.transfers.get(&id)
    }

    pub fn list(&self) -> DomainResult<Vec<Transfer>> {
        self.transfers.list()
    }

    /// Take the requested quantities out of `from`, FEFO.
    pub fn dispatch(
        &self,
        from: LocationId,
        to: LocationId,
        lines: &[TransferRequestLine],
    ) -> StockResult<Transfer> {
        for location in [from, to] {
            if self.catalog.location(location).is_none() {
                return Err(StockError::reference(location));
            }
        }
        if let Some(line) = lines.iter().find(|l| self.catalog.product(l.product).is_none()) {
            return Err(StockError::reference(line.product));
        }

        let id = TransferId::new(self.ledger.ids().next_id());
        let date = self.ledger.today();
        self.ledger.execute_and_record(
            "transfer.dispatch",
            |tx| Transfer::dispatch(tx, id, from, to, lines, date),
            |transfer| Ok(insert(self.transfers.as_ref(), transfer.clone())?),
        )
    }

    /// Book the shipment at its destination; short lines become in-transit
    /// losses.
    pub fn receive(
        &self,
        id: TransferId,
        received: &[ReceivedQuantity],
    ) -> StockResult<(Transfer, Vec<Loss>)> {
        let date = self.ledger.today();
        let ids = self.ledger.ids();
        self.ledger.execute_and_record(
            "transfer.receive",
            |tx| {
                let mut transfer = load(self.transfers.as_ref(), &id, "transfer")?;
                let losses = transfer.receive(tx, received, ids, date)?;
                Ok((transfer, losses))
            },
            |(transfer, losses): &(Transfer, Vec<Loss>)| {
                save(self.transfers.as_ref(), transfer.clone())?;
                record_all(self.losses.as_ref(), losses)
            },
        )
    }
}
