use std::sync::Arc;

use fishledger_catalog::Catalog;
use fishledger_core::{ArrivalId, DomainResult, LocationId};
use fishledger_inventory::{StockError, StockResult};
use fishledger_purchasing::{Arrival, NewArrivalLine};

use crate::ledger::LedgerService;
use crate::store::{DocumentStore, insert, load, save};

/// Supplier deliveries.
pub struct ArrivalService {
    ledger: Arc<LedgerService>,
    catalog: Arc<dyn Catalog>,
    arrivals: Arc<dyn DocumentStore<ArrivalId, Arrival>>,
}

impl ArrivalService {
    pub fn new(
        ledger: Arc<LedgerService>,
        catalog: Arc<dyn Catalog>,
        arrivals: Arc<dyn DocumentStore<ArrivalId, Arrival>>,
    ) -> Self {
        Self {
            ledger,
            catalog,
            arrivals,
        }
    }

    pub fn get(&self, id: ArrivalId) -> DomainResult<Option<Arrival>> {
        self.arrivals.get(&id)
    }

    pub fn list(&self) -> DomainResult<Vec<Arrival>> {
        self.arrivals.list()
    }

    pub fn create(&self, supplier: &str, location: LocationId) -> StockResult<Arrival> {
        if self.catalog.location(location).is_none() {
            return Err(StockError::reference(location));
        }
        let id = ArrivalId::new(self.ledger.ids().next_id());
        let arrival = Arrival::draft(id, supplier, location, self.ledger.today())?;
        insert(self.arrivals.as_ref(), arrival.clone())?;
        Ok(arrival)
    }

    pub fn add_line(&self, id: ArrivalId, line: NewArrivalLine) -> DomainResult<Arrival> {
        self.ledger.exclusive(|| {
            let mut arrival = load(self.arrivals.as_ref(), &id, "arrival")?;
            arrival.add_line(line)?;
            save(self.arrivals.as_ref(), arrival.clone())?;
            Ok(arrival)
        })
    }

    /// Book every line as a batch.
    pub fn receive(&self, id: ArrivalId) -> StockResult<Arrival> {
        let date = self.ledger.today();
        self.ledger.execute_and_record(
            "arrival.receive",
            |tx| {
                let mut arrival = load(self.arrivals.as_ref(), &id, "arrival")?;
                arrival.receive(tx, self.catalog.as_ref(), date)?;
                Ok(arrival)
            },
            |arrival| Ok(save(self.arrivals.as_ref(), arrival.clone())?),
        )
    }
}
