//! Staged, all-or-nothing ledger mutations.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fishledger_core::{DomainError, DomainResult, InventoryCountId, LocationId, ProductId};

use crate::batch::{Batch, NewBatch, SourceRef};
use crate::config::LedgerConfig;
use crate::consumption::{self, ConsumptionResult};
use crate::error::{Shortfall, StockError, StockResult};
use crate::events::{BatchReceived, StockConsumed, StockEvent};
use crate::ledger::{StockKey, StockLedger, ensure_unique_lot};

/// Mutations staged against a [`StockLedger`].
///
/// Reads fall through to the ledger until a (product, location) slice is
/// first touched; from then on the transaction works on its own copy of that
/// slice only. Nothing reaches the ledger until [`LedgerTransaction::commit`]
/// succeeds and the returned [`StagedChanges`] are applied.
#[derive(Debug)]
pub struct LedgerTransaction<'a> {
    base: &'a StockLedger,
    staged: BTreeMap<StockKey, Vec<Batch>>,
    events: Vec<StockEvent>,
    shortfalls: Vec<Shortfall>,
    occurred_at: DateTime<Utc>,
}

/// Result of an inventory-count adjustment for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CountAdjustment {
    Unchanged,
    /// Physical below theoretical; the missing quantity was consumed FEFO.
    Shrinkage { gap: f64, consumption: ConsumptionResult },
    /// Physical above theoretical; a synthetic batch was received.
    Surplus { gap: f64, lot: String, unit_cost: f64 },
}

impl CountAdjustment {
    pub fn gap(&self) -> f64 {
        match self {
            CountAdjustment::Unchanged => 0.0,
            CountAdjustment::Shrinkage { gap, .. } | CountAdjustment::Surplus { gap, .. } => *gap,
        }
    }
}

impl<'a> LedgerTransaction<'a> {
    pub(crate) fn new(base: &'a StockLedger, occurred_at: DateTime<Utc>) -> Self {
        Self {
            base,
            staged: BTreeMap::new(),
            events: Vec::new(),
            shortfalls: Vec::new(),
            occurred_at,
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        self.base.config()
    }

    pub fn epsilon(&self) -> f64 {
        self.base.epsilon()
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// Batches as this transaction currently sees them.
    pub fn batches(&self, product: ProductId, location: LocationId) -> &[Batch] {
        match self.staged.get(&(product, location)) {
            Some(batches) => batches,
            None => self.base.batches(product, location),
        }
    }

    pub fn on_hand(&self, product: ProductId, location: LocationId) -> f64 {
        self.batches(product, location).iter().map(|b| b.quantity).sum()
    }

    pub fn weighted_average_cost(&self, product: ProductId, location: LocationId) -> Option<f64> {
        consumption::weighted_average_cost(self.batches(product, location), self.epsilon())
    }

    fn slice_mut(&mut self, key: StockKey) -> &mut Vec<Batch> {
        let base = self.base;
        self.staged
            .entry(key)
            .or_insert_with(|| base.batches(key.0, key.1).to_vec())
    }

    /// Stage a new batch.
    pub fn receive(&mut self, batch: NewBatch) -> DomainResult<()> {
        batch.validate()?;
        ensure_unique_lot(self.batches(batch.product, batch.location), &batch)?;

        self.events.push(StockEvent::BatchReceived(BatchReceived {
            product: batch.product,
            location: batch.location,
            lot: batch.lot.clone(),
            quantity: batch.quantity,
            unit_cost: batch.unit_cost,
            expiry: batch.expiry,
            source: batch.source,
            occurred_at: self.occurred_at,
        }));
        self.slice_mut((batch.product, batch.location)).push(batch.into_batch());
        Ok(())
    }

    /// Stage a FEFO consumption.
    ///
    /// A shortfall beyond epsilon is recorded and makes [`commit`] fail; the
    /// result is still returned so callers can keep validating the remaining
    /// lines and report them all at once.
    ///
    /// [`commit`]: LedgerTransaction::commit
    pub fn consume(&mut self, product: ProductId, location: LocationId, quantity: f64) -> ConsumptionResult {
        let epsilon = self.epsilon();
        let result = consumption::consume_fefo(self.slice_mut((product, location)), quantity, epsilon);

        if result.is_short(epsilon) {
            self.shortfalls.push(Shortfall {
                product,
                location,
                requested: result.requested,
                available: result.taken(),
                missing: result.shortfall,
            });
        }
        if !result.lines.is_empty() {
            self.events.push(StockEvent::StockConsumed(StockConsumed {
                product,
                location,
                lines: result.lines.clone(),
                total_cost: result.total_cost,
                occurred_at: self.occurred_at,
            }));
        }
        result
    }

    /// Reconcile a counted quantity with the theoretical one.
    ///
    /// `fallback_cost` prices a surplus when the location holds nothing to
    /// average over.
    pub fn adjust_for_count(
        &mut self,
        count: InventoryCountId,
        product: ProductId,
        location: LocationId,
        theoretical: f64,
        physical: f64,
        fallback_cost: f64,
    ) -> DomainResult<CountAdjustment> {
        if !physical.is_finite() || physical < 0.0 {
            return Err(DomainError::validation("physical quantity must be non-negative"));
        }
        if !theoretical.is_finite() {
            return Err(DomainError::validation("theoretical quantity must be a number"));
        }

        let epsilon = self.epsilon();
        let gap = physical - theoretical;

        if gap < -epsilon {
            let consumption = self.consume(product, location, gap.abs());
            return Ok(CountAdjustment::Shrinkage { gap, consumption });
        }

        if gap > epsilon {
            let unit_cost = self
                .weighted_average_cost(product, location)
                .unwrap_or(fallback_cost);
            let lot = format!("{}-{}", self.config().adjustment_lot_prefix, count.short());
            self.receive(NewBatch {
                product,
                location,
                lot: lot.clone(),
                quantity: gap,
                unit_cost,
                expiry: self.config().surplus_expiry,
                source: SourceRef::Adjustment(count),
            })?;
            return Ok(CountAdjustment::Surplus { gap, lot, unit_cost });
        }

        Ok(CountAdjustment::Unchanged)
    }

    pub fn shortfalls(&self) -> &[Shortfall] {
        &self.shortfalls
    }

    pub fn is_short(&self) -> bool {
        !self.shortfalls.is_empty()
    }

    /// Finish the transaction.
    ///
    /// Fails with every recorded shortfall; the ledger is untouched either
    /// way until the returned changes are applied.
    pub fn commit(self) -> StockResult<StagedChanges> {
        if !self.shortfalls.is_empty() {
            return Err(StockError::Insufficient(self.shortfalls));
        }
        Ok(StagedChanges {
            slices: self.staged,
            events: self.events,
        })
    }
}

/// Slices replaced by a committed transaction, plus the events it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedChanges {
    slices: BTreeMap<StockKey, Vec<Batch>>,
    events: Vec<StockEvent>,
}

impl StagedChanges {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[StockEvent] {
        &self.events
    }

    pub fn touched(&self) -> impl Iterator<Item = &StockKey> {
        self.slices.keys()
    }

    pub(crate) fn into_parts(self) -> (BTreeMap<StockKey, Vec<Batch>>, Vec<StockEvent>) {
        (self.slices, self.events)
    }
}
