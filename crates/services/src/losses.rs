use std::sync::Arc;

use fishledger_catalog::Catalog;
use fishledger_core::{DomainResult, LossId};
use fishledger_inventory::{DeclareLoss, Loss, StockError, StockResult};

use crate::ledger::LedgerService;
use crate::store::{DocumentStore, insert};

/// Declared waste plus the losses recorded by counts and transfers.
pub struct LossService {
    ledger: Arc<LedgerService>,
    catalog: Arc<dyn Catalog>,
    losses: Arc<dyn DocumentStore<LossId, Loss>>,
}

impl LossService {
    pub fn new(
        ledger: Arc<LedgerService>,
        catalog: Arc<dyn Catalog>,
        losses: Arc<dyn DocumentStore<LossId, Loss>>,
    ) -> Self {
        Self {
            ledger,
            catalog,
            losses,
        }
    }

    pub fn get(&self, id: LossId) -> DomainResult<Option<Loss>> {
        self.losses.get(&id)
    }

    pub fn list(&self) -> DomainResult<Vec<Loss>> {
        let mut losses = self.losses.list()?;
        losses.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(losses)
    }

    pub fn declare(&self, request: DeclareLoss) -> StockResult<Loss> {
        if self.catalog.product(request.product).is_none() {
            return Err(StockError::reference(request.product));
        }
        if self.catalog.location(request.location).is_none() {
            return Err(StockError::reference(request.location));
        }
        let id = LossId::new(self.ledger.ids().next_id());
        let date = self.ledger.today();
        self.ledger.execute_and_record(
            "loss.declare",
            |tx| Loss::declare(tx, id, request, date),
            |loss| Ok(insert(self.losses.as_ref(), loss.clone())?),
        )
    }
}

/// Store losses produced by another document's commit.
pub(crate) fn record_all(store: &dyn DocumentStore<LossId, Loss>, losses: &[Loss]) -> StockResult<()> {
    for loss in losses {
        insert(store, loss.clone())?;
    }
    Ok(())
}
