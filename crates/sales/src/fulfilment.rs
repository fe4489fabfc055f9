//! Turning sold retail units into base-product consumption.

use serde::{Deserialize, Serialize};

use fishledger_catalog::{Catalog, SalesUnit};
use fishledger_core::{DomainError, LocationId, ProductId, SalesUnitId};
use fishledger_inventory::{LedgerTransaction, StockError, StockResult};

/// A quantity of one sales unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoldQuantity {
    pub sales_unit: SalesUnitId,
    pub quantity: f64,
}

/// What one sold line cost and earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineValuation {
    pub base_product: ProductId,
    pub base_quantity: f64,
    pub revenue: f64,
    pub cost: f64,
}

/// Resolve every line first, then consume `quantity × factor` of the base
/// product per line. Any unknown reference aborts before stock is touched;
/// shortfalls are left on the transaction so all short lines get reported.
pub fn consume_sold(
    tx: &mut LedgerTransaction<'_>,
    catalog: &dyn Catalog,
    location: LocationId,
    sold: &[SoldQuantity],
    unit_prices: &[f64],
) -> StockResult<Vec<LineValuation>> {
    if catalog.location(location).is_none() {
        return Err(StockError::reference(location));
    }

    let mut units: Vec<SalesUnit> = Vec::with_capacity(sold.len());
    for line in sold {
        if !line.quantity.is_finite() || line.quantity <= 0.0 {
            return Err(DomainError::validation(format!(
                "{}: quantity must be positive",
                line.sales_unit
            ))
            .into());
        }
        let unit = catalog
            .sales_unit(line.sales_unit)
            .ok_or_else(|| StockError::reference(line.sales_unit))?;
        if catalog.product(unit.base_product).is_none() {
            return Err(StockError::reference(unit.base_product));
        }
        units.push(unit);
    }

    let mut valuations = Vec::with_capacity(sold.len());
    for (i, (line, unit)) in sold.iter().zip(&units).enumerate() {
        let base_quantity = unit.required_quantity(line.quantity);
        let consumption = tx.consume(unit.base_product, location, base_quantity);
        let price = unit_prices.get(i).copied().unwrap_or(unit.price);
        valuations.push(LineValuation {
            base_product: unit.base_product,
            base_quantity,
            revenue: line.quantity * price,
            cost: consumption.total_cost,
        });
    }
    Ok(valuations)
}
