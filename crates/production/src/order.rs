use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use fishledger_catalog::Catalog;
use fishledger_core::{
    DomainError, DomainResult, Entity, LocationId, ProductId, ProductionOrderId,
};
use fishledger_inventory::{
    ConsumedLine, LedgerTransaction, NewBatch, SourceRef, StockError, StockResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductionStatus {
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

/// Input consumed by the order, in the component's stock unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub product: ProductId,
    pub quantity: f64,
    /// Lots taken, filled on completion.
    #[serde(default)]
    pub consumed: Vec<ConsumedLine>,
}

/// Batch produced by a completed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionOutput {
    pub lot: String,
    pub quantity: f64,
    pub unit_cost: f64,
    pub total_cost: f64,
    pub expiry: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionOrder {
    pub id: ProductionOrderId,
    pub workshop: LocationId,
    pub product: ProductId,
    pub planned_quantity: f64,
    pub status: ProductionStatus,
    pub planned_on: NaiveDate,
    pub started_on: Option<NaiveDate>,
    pub completed_on: Option<NaiveDate>,
    pub components: Vec<Component>,
    pub output: Option<ProductionOutput>,
}

impl ProductionOrder {
    /// Plan an order; every product and the workshop must be known.
    pub fn plan(
        id: ProductionOrderId,
        workshop: LocationId,
        product: ProductId,
        planned_quantity: f64,
        components: &[(ProductId, f64)],
        catalog: &dyn Catalog,
        date: NaiveDate,
    ) -> StockResult<Self> {
        if !planned_quantity.is_finite() || planned_quantity <= 0.0 {
            return Err(DomainError::validation("planned quantity must be positive").into());
        }
        if components.is_empty() {
            return Err(DomainError::validation("an order needs at least one component").into());
        }
        if catalog.location(workshop).is_none() {
            return Err(StockError::reference(workshop));
        }
        if catalog.product(product).is_none() {
            return Err(StockError::reference(product));
        }

        let mut planned: Vec<Component> = Vec::with_capacity(components.len());
        for &(component, quantity) in components {
            if component == product {
                return Err(DomainError::validation(format!(
                    "{component} cannot be an input of its own production"
                ))
                .into());
            }
            if !quantity.is_finite() || quantity <= 0.0 {
                return Err(DomainError::validation(format!(
                    "{component}: component quantity must be positive"
                ))
                .into());
            }
            if catalog.product(component).is_none() {
                return Err(StockError::reference(component));
            }
            match planned.iter_mut().find(|c| c.product == component) {
                Some(existing) => existing.quantity += quantity,
                None => planned.push(Component {
                    product: component,
                    quantity,
                    consumed: Vec::new(),
                }),
            }
        }

        Ok(Self {
            id,
            workshop,
            product,
            planned_quantity,
            status: ProductionStatus::Planned,
            planned_on: date,
            started_on: None,
            completed_on: None,
            components: planned,
            output: None,
        })
    }

    pub fn is_cancellable(&self) -> bool {
        matches!(self.status, ProductionStatus::Planned | ProductionStatus::InProgress)
    }

    pub fn start(&mut self, date: NaiveDate) -> DomainResult<()> {
        if self.status != ProductionStatus::Planned {
            return Err(DomainError::invariant(format!(
                "cannot start a production order in status {:?}",
                self.status
            )));
        }
        self.status = ProductionStatus::InProgress;
        self.started_on = Some(date);
        Ok(())
    }

    /// Consume every component and receive the output batch.
    ///
    /// The output is costed at total component cost over the quantity
    /// actually produced, which may differ from the planned quantity.
    pub fn complete(
        &mut self,
        tx: &mut LedgerTransaction<'_>,
        actual_quantity: f64,
        expiry: NaiveDate,
        date: NaiveDate,
    ) -> StockResult<ProductionOutput> {
        if self.status != ProductionStatus::InProgress {
            return Err(DomainError::invariant(format!(
                "cannot complete a production order in status {:?}",
                self.status
            ))
            .into());
        }
        if !actual_quantity.is_finite() || actual_quantity <= 0.0 {
            return Err(DomainError::validation("produced quantity must be positive").into());
        }

        let mut consumed = Vec::with_capacity(self.components.len());
        let mut total_cost = 0.0;
        for component in &self.components {
            let result = tx.consume(component.product, self.workshop, component.quantity);
            total_cost += result.total_cost;
            consumed.push(result.lines);
        }
        // The output is only costed from a complete consumption.
        if tx.is_short() {
            return Err(StockError::Insufficient(tx.shortfalls().to_vec()));
        }

        let lot = format!("{}-{}", tx.config().production_lot_prefix, self.id.short());
        let unit_cost = total_cost / actual_quantity;
        tx.receive(NewBatch {
            product: self.product,
            location: self.workshop,
            lot: lot.clone(),
            quantity: actual_quantity,
            unit_cost,
            expiry,
            source: SourceRef::Production(self.id),
        })?;

        for (component, lines) in self.components.iter_mut().zip(consumed) {
            component.consumed = lines;
        }
        let output = ProductionOutput {
            lot,
            quantity: actual_quantity,
            unit_cost,
            total_cost,
            expiry,
        };
        self.status = ProductionStatus::Completed;
        self.completed_on = Some(date);
        self.output = Some(output.clone());
        Ok(output)
    }

    pub fn cancel(&mut self) -> DomainResult<()> {
        if !self.is_cancellable() {
            return Err(DomainError::invariant(format!(
                "cannot cancel a production order in status {:?}",
                self.status
            )));
        }
        self.status = ProductionStatus::Cancelled;
        Ok(())
    }
}

impl Entity for ProductionOrder {
    type Id = ProductionOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
