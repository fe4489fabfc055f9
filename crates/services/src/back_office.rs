use std::sync::Arc;

use fishledger_catalog::Catalog;
use fishledger_core::{Clock, IdGenerator, LossId};
use fishledger_inventory::{LedgerConfig, Loss};

use crate::arrivals::ArrivalService;
use crate::counts::InventoryCountService;
use crate::ledger::LedgerService;
use crate::losses::LossService;
use crate::production::ProductionService;
use crate::sales::SalesService;
use crate::store::{DocumentStore, InMemoryDocumentStore};
use crate::transfers::TransferService;

fn store<K, V>() -> Arc<dyn DocumentStore<K, V>>
where
    InMemoryDocumentStore<K, V>: DocumentStore<K, V> + 'static,
{
    Arc::new(InMemoryDocumentStore::<K, V>::new())
}

/// Every service wired to one ledger and one catalog.
pub struct BackOffice {
    pub ledger: Arc<LedgerService>,
    pub catalog: Arc<dyn Catalog>,
    pub arrivals: ArrivalService,
    pub sales: SalesService,
    pub transfers: TransferService,
    pub losses: LossService,
    pub counts: InventoryCountService,
    pub production: ProductionService,
}

impl BackOffice {
    /// In-memory wiring with the given collaborators.
    pub fn in_memory(
        catalog: Arc<dyn Catalog>,
        config: LedgerConfig,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        let ledger = Arc::new(LedgerService::new(config, clock, ids));
        // Losses are shared: counts and transfers record into the same store.
        let losses: Arc<dyn DocumentStore<LossId, Loss>> = store();

        Self {
            arrivals: ArrivalService::new(
                ledger.clone(),
                catalog.clone(),
                store(),
            ),
            sales: SalesService::new(
                ledger.clone(),
                catalog.clone(),
                store(),
                store(),
                store(),
            ),
            transfers: TransferService::new(
                ledger.clone(),
                catalog.clone(),
                store(),
                losses.clone(),
            ),
            losses: LossService::new(ledger.clone(), catalog.clone(), losses.clone()),
            counts: InventoryCountService::new(
                ledger.clone(),
                catalog.clone(),
                store(),
                losses,
            ),
            production: ProductionService::new(
                ledger.clone(),
                catalog.clone(),
                store(),
            ),
            ledger,
            catalog,
        }
    }
}
