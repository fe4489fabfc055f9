use std::sync::Arc;

use chrono::NaiveDate;

use fishledger_catalog::Catalog;
use fishledger_core::{DomainResult, LocationId, ProductId, ProductionOrderId};
use fishledger_inventory::StockResult;
use fishledger_production::ProductionOrder;

use crate::ledger::LedgerService;
use crate::store::{DocumentStore, insert, load, save};

pub struct ProductionService {
    ledger: Arc<LedgerService>,
    catalog: Arc<dyn Catalog>,
    orders: Arc<dyn DocumentStore<ProductionOrderId, ProductionOrder>>,
}

impl ProductionService {
    pub fn new(
        ledger: Arc<LedgerService>,
        catalog: Arc<dyn Catalog>,
        orders: Arc<dyn DocumentStore<ProductionOrderId, ProductionOrder>>,
    ) -> Self {
        Self {
            ledger,
            catalog,
            orders,
        }
    }

    pub fn get(&self, id: ProductionOrderId) -> DomainResult<Option<ProductionOrder>> {
        self.orders.get(&id)
    }

    pub fn plan(
        &self,
        workshop: LocationId,
        product: ProductId,
        planned_quantity: f64,
        components: &[(ProductId, f64)],
    ) -> StockResult<ProductionOrder> {
        let id = ProductionOrderId::new(self.ledger.ids().next_id());
        let order = ProductionOrder::plan(
            id,
            workshop,
            product,
            planned_quantity,
            components,
            self.catalog.as_ref(),
            self.ledger.today(),
        )?;
        insert(self.orders.as_ref(), order.clone())?;
        Ok(order)
    }

    pub fn start(&self, id: ProductionOrderId) -> DomainResult<ProductionOrder> {
        self.ledger.exclusive(|| {
            let mut order = load(self.orders.as_ref(), &id, "production order")?;
            order.start(self.ledger.today())?;
            save(self.orders.as_ref(), order.clone())?;
            Ok(order)
        })
    }

    /// Consume the components and book the output batch.
    pub fn complete(
        &self,
        id: ProductionOrderId,
        actual_quantity: f64,
        expiry: NaiveDate,
    ) -> StockResult<ProductionOrder> {
        let date = self.ledger.today();
        self.ledger.execute_and_record(
            "production.complete",
            |tx| {
                let mut order = load(self.orders.as_ref(), &id, "production order")?;
                order.complete(tx, actual_quantity, expiry, date)?;
                Ok(order)
            },
            |order| Ok(save(self.orders.as_ref(), order.clone())?),
        )
    }

    pub fn cancel(&self, id: ProductionOrderId) -> DomainResult<ProductionOrder> {
        self.ledger.exclusive(|| {
            let mut order = load(self.orders.as_ref(), &id, "production order")?;
            order.cancel()?;
            save(self.orders.as_ref(), order.clone())?;
            Ok(order)
        })
    }
}
