use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use fishledger_catalog::Catalog;
use fishledger_core::{ArrivalId, DomainError, DomainResult, Entity, LocationId, ProductId};
use fishledger_inventory::{LedgerTransaction, NewBatch, SourceRef, StockError, StockResult};

/// Arrival status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrivalStatus {
    Draft,
    Received,
}

/// Supplier lot as delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrivalLine {
    pub line_no: u32,
    pub product: ProductId,
    pub lot: String,
    pub quantity: f64,
    /// Purchase cost per stock unit.
    pub unit_cost: f64,
    pub expiry: NaiveDate,
}

impl ArrivalLine {
    pub fn cost(&self) -> f64 {
        self.quantity * self.unit_cost
    }
}

/// Line input, before numbering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewArrivalLine {
    pub product: ProductId,
    pub lot: String,
    pub quantity: f64,
    pub unit_cost: f64,
    pub expiry: NaiveDate,
}

/// Goods receipt from a supplier into one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arrival {
    pub id: ArrivalId,
    pub supplier: String,
    pub location: LocationId,
    pub status: ArrivalStatus,
    pub created_on: NaiveDate,
    pub received_on: Option<NaiveDate>,
    pub lines: Vec<ArrivalLine>,
}

impl Arrival {
    pub fn draft(
        id: ArrivalId,
        supplier: impl Into<String>,
        location: LocationId,
        date: NaiveDate,
    ) -> DomainResult<Self> {
        let supplier = supplier.into();
        if supplier.trim().is_empty() {
            return Err(DomainError::validation("supplier cannot be empty"));
        }
        Ok(Self {
            id,
            supplier,
            location,
            status: ArrivalStatus::Draft,
            created_on: date,
            received_on: None,
            lines: Vec::new(),
        })
    }

    pub fn is_modifiable(&self) -> bool {
        matches!(self.status, ArrivalStatus::Draft)
    }

    pub fn add_line(&mut self, line: NewArrivalLine) -> DomainResult<u32> {
        if !self.is_modifiable() {
            return Err(DomainError::invariant("cannot modify arrival once it is received"));
        }
        if line.lot.trim().is_empty() {
            return Err(DomainError::validation("lot cannot be empty"));
        }
        if !line.quantity.is_finite() || line.quantity <= 0.0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if !line.unit_cost.is_finite() || line.unit_cost < 0.0 {
            return Err(DomainError::validation("unit_cost must be non-negative"));
        }
        if self
            .lines
            .iter()
            .any(|l| l.product == line.product && l.lot == line.lot)
        {
            return Err(DomainError::conflict(format!(
                "lot {} of {} already on this arrival",
                line.lot, line.product
            )));
        }

        let line_no = self.lines.len() as u32 + 1;
        self.lines.push(ArrivalLine {
            line_no,
            product: line.product,
            lot: line.lot,
            quantity: line.quantity,
            unit_cost: line.unit_cost,
            expiry: line.expiry,
        });
        Ok(line_no)
    }

    pub fn total_cost(&self) -> f64 {
        self.lines.iter().map(ArrivalLine::cost).sum()
    }

    /// Put every line on the ledger as its own batch.
    pub fn receive(
        &mut self,
        tx: &mut LedgerTransaction<'_>,
        catalog: &dyn Catalog,
        date: NaiveDate,
    ) -> StockResult<()> {
        if !self.is_modifiable() {
            return Err(DomainError::invariant("arrival was already received").into());
        }
        if self.lines.is_empty() {
            return Err(DomainError::validation("cannot receive an arrival without lines").into());
        }
        if catalog.location(self.location).is_none() {
            return Err(StockError::reference(self.location));
        }

        for line in &self.lines {
            if catalog.product(line.product).is_none() {
                return Err(StockError::reference(line.product));
            }
            tx.receive(NewBatch {
                product: line.product,
                location: self.location,
                lot: line.lot.clone(),
                quantity: line.quantity,
                unit_cost: line.unit_cost,
                expiry: line.expiry,
                source: SourceRef::Arrival(self.id),
            })?;
        }

        self.status = ArrivalStatus::Received;
        self.received_on = Some(date);
        Ok(())
    }
}

impl Entity for Arrival {
    type Id = ArrivalId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
