//! The stock ledger: per product, per location, the batches on hand.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use fishledger_core::{DomainError, DomainResult, LocationId, ProductId};

use crate::batch::{Batch, NewBatch};
use crate::config::LedgerConfig;
use crate::consumption::{self, ConsumptionResult};
use crate::events::StockEvent;
use crate::transaction::{LedgerTransaction, StagedChanges};

/// Address of one batch collection.
pub type StockKey = (ProductId, LocationId);

/// Per (product, location) batch collections.
///
/// Invariants:
/// - every stored batch has `quantity > epsilon`
/// - lots are unique within one (product, location)
/// - storage order is insertion order (FEFO order is computed per walk)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockLedger {
    config: LedgerConfig,
    stock: BTreeMap<ProductId, BTreeMap<LocationId, Vec<Batch>>>,
}

impl StockLedger {
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            stock: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn epsilon(&self) -> f64 {
        self.config.epsilon
    }

    /// Batches at (product, location); empty when nothing was ever received.
    pub fn batches(&self, product: ProductId, location: LocationId) -> &[Batch] {
        self.stock
            .get(&product)
            .and_then(|by_location| by_location.get(&location))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn on_hand(&self, product: ProductId, location: LocationId) -> f64 {
        self.batches(product, location).iter().map(|b| b.quantity).sum()
    }

    /// Weighted average unit cost at (product, location); `None` when empty.
    pub fn weighted_average_cost(&self, product: ProductId, location: LocationId) -> Option<f64> {
        consumption::weighted_average_cost(self.batches(product, location), self.config.epsilon)
    }

    /// Every non-empty collection, ordered by product then location.
    pub fn slices(&self) -> impl Iterator<Item = (ProductId, LocationId, &[Batch])> + '_ {
        self.stock.iter().flat_map(|(product, by_location)| {
            by_location
                .iter()
                .map(move |(location, batches)| (*product, *location, batches.as_slice()))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.stock.is_empty()
    }

    /// Append a batch directly, outside any transaction.
    ///
    /// Used to load opening stock. Rejects invalid quantities/costs and lots
    /// already present at the same (product, location).
    pub fn receive(&mut self, batch: NewBatch) -> DomainResult<()> {
        batch.validate()?;
        let (product, location) = (batch.product, batch.location);
        ensure_unique_lot(self.batches(product, location), &batch)?;

        debug!(%product, %location, lot = %batch.lot, quantity = batch.quantity, "batch received");
        self.stock
            .entry(product)
            .or_default()
            .entry(location)
            .or_default()
            .push(batch.into_batch());
        Ok(())
    }

    /// Raw FEFO consumption, applied immediately even when short.
    ///
    /// Business operations go through [`StockLedger::begin`] instead so a
    /// short line aborts the whole document.
    pub fn consume(&mut self, product: ProductId, location: LocationId, quantity: f64) -> ConsumptionResult {
        let epsilon = self.config.epsilon;
        let Some(by_location) = self.stock.get_mut(&product) else {
            return short_of_everything(quantity);
        };
        let Some(batches) = by_location.get_mut(&location) else {
            return short_of_everything(quantity);
        };

        let result = consumption::consume_fefo(batches, quantity, epsilon);
        debug!(%product, %location, requested = quantity, shortfall = result.shortfall, "stock consumed");
        self.prune(product, location);
        result
    }

    /// Start a staged transaction over this ledger.
    pub fn begin(&self, occurred_at: DateTime<Utc>) -> LedgerTransaction<'_> {
        LedgerTransaction::new(self, occurred_at)
    }

    /// Apply the staged slices of a committed transaction.
    ///
    /// Returns the events describing the applied movements.
    pub fn apply(&mut self, changes: StagedChanges) -> Vec<StockEvent> {
        let (slices, events) = changes.into_parts();
        for ((product, location), batches) in slices {
            self.stock.entry(product).or_default().insert(location, batches);
            self.prune(product, location);
        }
        events
    }

    fn prune(&mut self, product: ProductId, location: LocationId) {
        let epsilon = self.config.epsilon;
        if let Some(by_location) = self.stock.get_mut(&product) {
            if let Some(batches) = by_location.get_mut(&location) {
                batches.retain(|b| b.quantity > epsilon);
                if batches.is_empty() {
                    by_location.remove(&location);
                }
            }
            if by_location.is_empty() {
                self.stock.remove(&product);
            }
        }
    }
}

fn short_of_everything(quantity: f64) -> ConsumptionResult {
    if !quantity.is_finite() || quantity <= 0.0 {
        return ConsumptionResult::empty();
    }
    ConsumptionResult {
        requested: quantity,
        lines: Vec::new(),
        total_cost: 0.0,
        shortfall: quantity,
    }
}

pub(crate) fn ensure_unique_lot(existing: &[Batch], batch: &NewBatch) -> DomainResult<()> {
    if existing.iter().any(|b| b.lot == batch.lot) {
        return Err(DomainError::conflict(format!(
            "lot {} already present for {} at {}",
            batch.lot, batch.product, batch.location
        )));
    }
    Ok(())
}
