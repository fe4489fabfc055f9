//! Physical inventory counts.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use fishledger_catalog::Catalog;
use fishledger_core::{
    DomainError, DomainResult, Entity, IdGenerator, InventoryCountId, LocationId, LossId, ProductId,
};

use crate::error::{StockError, StockResult};
use crate::ledger::StockLedger;
use crate::loss::Loss;
use crate::transaction::{CountAdjustment, LedgerTransaction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountStatus {
    Draft,
    Validated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountLine {
    pub product: ProductId,
    /// Ledger quantity when the count was opened, refreshed from the live
    /// ledger at validation.
    pub theoretical: f64,
    pub physical: Option<f64>,
    pub adjustment: Option<CountAdjustment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryCount {
    pub id: InventoryCountId,
    pub location: LocationId,
    pub status: CountStatus,
    pub opened_on: NaiveDate,
    pub validated_on: Option<NaiveDate>,
    pub lines: Vec<CountLine>,
}

impl InventoryCount {
    /// Snapshot the theoretical quantities of `products` at `location`.
    pub fn open(
        ledger: &StockLedger,
        id: InventoryCountId,
        location: LocationId,
        products: &[ProductId],
        date: NaiveDate,
    ) -> DomainResult<Self> {
        if products.is_empty() {
            return Err(DomainError::validation("count must cover at least one product"));
        }
        let mut lines: Vec<CountLine> = Vec::with_capacity(products.len());
        for product in products {
            if lines.iter().any(|l| l.product == *product) {
                return Err(DomainError::validation(format!("{product} listed twice")));
            }
            lines.push(CountLine {
                product: *product,
                theoretical: ledger.on_hand(*product, location),
                physical: None,
                adjustment: None,
            });
        }
        Ok(Self {
            id,
            location,
            status: CountStatus::Draft,
            opened_on: date,
            validated_on: None,
            lines,
        })
    }

    /// Enter the counted quantity for one product.
    pub fn record(&mut self, product: ProductId, physical: f64) -> DomainResult<()> {
        if self.status != CountStatus::Draft {
            return Err(DomainError::invariant("count is already validated"));
        }
        if !physical.is_finite() || physical < 0.0 {
            return Err(DomainError::validation("physical quantity must be non-negative"));
        }
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product == product)
            .ok_or_else(|| DomainError::validation(format!("{product} is not part of this count")))?;
        line.physical = Some(physical);
        Ok(())
    }

    /// Reconcile every line against the ledger.
    ///
    /// Gaps are measured against the quantity on hand in `tx`, so stock
    /// moved since the count was opened is not counted twice. Shrinkage is consumed FEFO and returned as inventory-gap losses;
    /// surplus is received as one batch per line.
    pub fn validate(
        &mut self,
        tx: &mut LedgerTransaction<'_>,
        catalog: &dyn Catalog,
        ids: &dyn IdGenerator,
        date: NaiveDate,
    ) -> StockResult<Vec<Loss>> {
        if self.status != CountStatus::Draft {
            return Err(DomainError::invariant("count is already validated").into());
        }
        if let Some(missing) = self.lines.iter().find(|l| l.physical.is_none()) {
            return Err(DomainError::validation(format!("{} has not been counted", missing.product)).into());
        }

        let mut losses = Vec::new();
        let mut adjustments = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            let product = catalog
                .product(line.product)
                .ok_or_else(|| StockError::reference(line.product))?;
            let theoretical = tx.on_hand(line.product, self.location);
            let physical = line.physical.unwrap_or(theoretical);

            let adjustment = tx.adjust_for_count(
                self.id,
                line.product,
                self.location,
                theoretical,
                physical,
                product.base_price,
            )?;
            if let CountAdjustment::Shrinkage { consumption, .. } = &adjustment {
                if !consumption.lines.is_empty() {
                    losses.push(Loss::inventory_gap(
                        LossId::new(ids.next_id()),
                        self.id,
                        line.product,
                        self.location,
                        consumption.lines.clone(),
                        date,
                    ));
                }
            }
            adjustments.push((theoretical, adjustment));
        }

        for (line, (theoretical, adjustment)) in self.lines.iter_mut().zip(adjustments) {
            line.theoretical = theoretical;
            line.adjustment = Some(adjustment);
        }
        self.status = CountStatus::Validated;
        self.validated_on = Some(date);
        Ok(losses)
    }
}

impl Entity for InventoryCount {
    type Id = InventoryCountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
