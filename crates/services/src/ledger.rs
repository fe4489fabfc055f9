use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use fishledger_core::{Clock, DomainError, DomainResult, IdGenerator, LocationId, ProductId};
use fishledger_events::{Event, EventBus, EventEnvelope, InMemoryEventBus, Subscription};
use fishledger_inventory::{
    Batch, ExpiringBatch, LedgerConfig, LedgerTransaction, NewBatch, StockError, StockEvent,
    StockLedger, StockResult, StockValuation,
};

/// Envelope type published for every committed stock movement.
pub type StockEnvelope = EventEnvelope<StockEvent>;

const STREAM: &str = "stock";

/// Owner of the stock ledger.
///
/// The write lock is held for the whole of [`execute`](Self::execute),
/// including event publication, so business operations are serialized per
/// ledger and envelopes are numbered in commit order.
pub struct LedgerService {
    ledger: RwLock<StockLedger>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    bus: InMemoryEventBus<StockEnvelope>,
    sequence: AtomicU64,
}

impl LedgerService {
    pub fn new(config: LedgerConfig, clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            ledger: RwLock::new(StockLedger::new(config)),
            clock,
            ids,
            bus: InMemoryEventBus::new(),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn ids(&self) -> &dyn IdGenerator {
        self.ids.as_ref()
    }

    /// Events published after this call.
    pub fn subscribe(&self) -> Subscription<StockEnvelope> {
        self.bus.subscribe()
    }

    fn read_guard(&self) -> StockResult<RwLockReadGuard<'_, StockLedger>> {
        self.ledger
            .read()
            .map_err(|_| DomainError::invariant("stock ledger lock poisoned").into())
    }

    /// Run `f` against the current ledger state.
    pub fn read<T>(&self, f: impl FnOnce(&StockLedger) -> T) -> StockResult<T> {
        let ledger = self.read_guard()?;
        Ok(f(&ledger))
    }

    fn write_guard(&self) -> StockResult<RwLockWriteGuard<'_, StockLedger>> {
        self.ledger
            .write()
            .map_err(|_| DomainError::invariant("stock ledger lock poisoned").into())
    }

    /// Run one all-or-nothing business operation.
    ///
    /// `f` stages its mutations on a fresh transaction. The ledger changes
    /// only if `f` succeeds and the transaction has no shortfall; committed
    /// events are then published under `label`.
    pub fn execute<T>(
        &self,
        label: &str,
        f: impl FnOnce(&mut LedgerTransaction<'_>) -> StockResult<T>,
    ) -> StockResult<T> {
        self.execute_and_record(label, f, |_| Ok(()))
    }

    /// [`execute`](Self::execute) with a bookkeeping step.
    ///
    /// `record` runs once the transaction is known to commit and before the
    /// ledger is touched; if it fails the staged changes are discarded.
    /// Services load their document inside `f` and save it in `record`, so
    /// the status check and the save happen under the ledger lock.
    pub fn execute_and_record<T>(
        &self,
        label: &str,
        f: impl FnOnce(&mut LedgerTransaction<'_>) -> StockResult<T>,
        record: impl FnOnce(&T) -> StockResult<()>,
    ) -> StockResult<T> {
        let mut ledger = self.write_guard()?;

        let mut tx = ledger.begin(self.clock.now());
        let staged = f(&mut tx).and_then(|value| Ok((value, tx.commit()?)));
        let (value, changes) = match staged.and_then(|(value, changes)| {
            record(&value)?;
            Ok((value, changes))
        }) {
            Ok(staged) => staged,
            Err(err) => {
                warn!(operation = label, error = %err, "stock operation aborted");
                return Err(err);
            }
        };

        let touched = changes.touched().count();
        let events = ledger.apply(changes);
        info!(operation = label, slices = touched, events = events.len(), "stock operation committed");
        // Still under the write lock: sequence order is commit order.
        self.publish(label, events);
        Ok(value)
    }

    /// Run a document-only change under the ledger lock.
    ///
    /// Keeps status transitions from interleaving with the stock operations
    /// of the same document.
    pub fn exclusive<T>(&self, f: impl FnOnce() -> DomainResult<T>) -> DomainResult<T> {
        let _ledger = self
            .ledger
            .write()
            .map_err(|_| DomainError::invariant("stock ledger lock poisoned"))?;
        f()
    }

    fn publish(&self, label: &str, events: Vec<StockEvent>) {
        for event in events {
            let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
            debug!(operation = label, event_type = event.event_type(), sequence, "publishing stock event");
            let envelope = EventEnvelope::new(*self.ids.next_id().as_uuid(), STREAM, sequence, label, event);
            // The ledger already moved; a failed publish is only reported.
            if let Err(err) = self.bus.publish(envelope) {
                warn!(operation = label, error = ?err, "failed to publish stock event");
            }
        }
    }

    /// Book opening stock.
    pub fn seed(&self, batch: NewBatch) -> StockResult<()> {
        self.execute("stock.seed", |tx| tx.receive(batch).map_err(StockError::from))
    }

    pub fn on_hand(&self, product: ProductId, location: LocationId) -> StockResult<f64> {
        self.read(|l| l.on_hand(product, location))
    }

    pub fn batches(&self, product: ProductId, location: LocationId) -> StockResult<Vec<Batch>> {
        self.read(|l| l.batches(product, location).to_vec())
    }

    pub fn valuation(&self) -> StockResult<Vec<StockValuation>> {
        self.read(StockLedger::valuation)
    }

    pub fn total_value(&self) -> StockResult<f64> {
        self.read(StockLedger::total_value)
    }

    pub fn expiring_before(&self, date: NaiveDate) -> StockResult<Vec<ExpiringBatch>> {
        self.read(|l| l.expiring_before(date))
    }

    /// Copy of the whole ledger.
    pub fn snapshot(&self) -> StockResult<StockLedger> {
        self.read(StockLedger::clone)
    }
}

impl core::fmt::Debug for LedgerService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LedgerService")
            .field("sequence", &self.sequence.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
