use std::sync::Arc;

use fishledger_catalog::Catalog;
use fishledger_core::{DomainResult, InventoryCountId, LocationId, LossId, ProductId};
use fishledger_inventory::{InventoryCount, Loss, StockError, StockResult};

use crate::ledger::LedgerService;
use crate::losses::record_all;
use crate::store::{DocumentStore, insert, load, save};

/// Physical stock counts.
pub struct InventoryCountService {
    ledger: Arc<LedgerService>,
    catalog: Arc<dyn Catalog>,
    counts: Arc<dyn DocumentStore<InventoryCountId, InventoryCount>>,
    losses: Arc<dyn DocumentStore<LossId, Loss>>,
}

impl InventoryCountService {
    pub fn new(
        ledger: Arc<LedgerService>,
        catalog: Arc<dyn Catalog>,
        counts: Arc<dyn DocumentStore<InventoryCountId, InventoryCount>>,
        losses: Arc<dyn DocumentStore<LossId, Loss>>,
    ) -> Self {
        Self {
            ledger,
            catalog,
            counts,
            losses,
        }
    }

    pub fn get(&self, id: InventoryCountId) -> DomainResult<Option<InventoryCount>> {
        self.counts.get(&id)
    }

    /// Open a count with the ledger's current quantities as theoretical.
    pub fn open(&self, location: LocationId, products: &[ProductId]) -> StockResult<InventoryCount> {
        if self.catalog.location(location).is_none() {
            return Err(StockError::reference(location));
        }
        if let Some(product) = products.iter().find(|p| self.catalog.product(**p).is_none()) {
            return Err(StockError::reference(product));
        }

        let id = InventoryCountId::new(self.ledger.ids().next_id());
        let date = self.ledger.today();
        let count = self
            .ledger
            .read(|ledger| InventoryCount::open(ledger, id, location, products, date))??;
        insert(self.counts.as_ref(), count.clone())?;
        Ok(count)
    }

    pub fn record(&self, id: InventoryCountId, product: ProductId, physical: f64) -> DomainResult<InventoryCount> {
        self.ledger.exclusive(|| {
            let mut count = load(self.counts.as_ref(), &id, "inventory count")?;
            count.record(product, physical)?;
            save(self.counts.as_ref(), count.clone())?;
            Ok(count)
        })
    }

    /// Adjust the ledger to the counted quantities.
    pub fn validate(&self, id: InventoryCountId) -> StockResult<(InventoryCount, Vec<Loss>)> {
        let date = self.ledger.today();
        let ids = self.ledger.ids();
        self.ledger.execute_and_record(
            "inventory.validate",
            |tx| {
                let mut count = load(self.counts.as_ref(), &id, "inventory count")?;
                let losses = count.validate(tx, self.catalog.as_ref(), ids, date)?;
                Ok((count, losses))
            },
            |(count, losses): &(InventoryCount, Vec<Loss>)| {
                save(self.counts.as_ref(), count.clone())?;
                record_all(self.losses.as_ref(), losses)
            },
        )
    }
}
