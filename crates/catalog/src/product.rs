use serde::{Deserialize, Serialize};

use fishledger_core::{DomainError, DomainResult, Entity, LocationId, ProductId, SalesUnitId};

/// Physical unit stock is counted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockUnit {
    Kg,
    Piece,
    Box,
}

/// A stock-keeping product (e.g. whole sea bream, in kg).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub unit: StockUnit,
    /// Configured base price per stock unit; fallback cost when a location
    /// holds no batch to average over.
    pub base_price: f64,
}

impl Product {
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        unit: StockUnit,
        base_price: f64,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        if !base_price.is_finite() || base_price < 0.0 {
            return Err(DomainError::validation("base_price must be a non-negative number"));
        }
        Ok(Self {
            id,
            name,
            unit,
            base_price,
        })
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// What a till sells: a retail unit mapped onto a base product.
///
/// Selling `n` units consumes `n * factor` of the base product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesUnit {
    pub id: SalesUnitId,
    pub name: String,
    pub base_product: ProductId,
    pub factor: f64,
    /// Retail price per sales unit.
    pub price: f64,
}

impl SalesUnit {
    pub fn new(
        id: SalesUnitId,
        name: impl Into<String>,
        base_product: ProductId,
        factor: f64,
        price: f64,
    ) -> DomainResult<Self> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(DomainError::validation("factor must be positive"));
        }
        if !price.is_finite() || price < 0.0 {
            return Err(DomainError::validation("price must be a non-negative number"));
        }
        Ok(Self {
            id,
            name: name.into(),
            base_product,
            factor,
            price,
        })
    }

    /// Base-product quantity needed to sell `quantity` of this unit.
    pub fn required_quantity(&self, quantity: f64) -> f64 {
        quantity * self.factor
    }
}

impl Entity for SalesUnit {
    type Id = SalesUnitId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    Store,
    Warehouse,
    Workshop,
}

/// A place where stock physically sits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub kind: LocationKind,
}

impl Entity for Location {
    type Id = LocationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sales_unit_converts_to_base_quantity() {
        let fillet = SalesUnit::new(SalesUnitId::new(10), "fillet tray", ProductId::new(1), 0.25, 3500.0)
            .unwrap();
        assert!((fillet.required_quantity(4.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn sales_unit_rejects_non_positive_factor() {
        let err = SalesUnit::new(SalesUnitId::new(1), "x", ProductId::new(1), 0.0, 1.0).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn product_rejects_blank_name_and_negative_price() {
        assert!(Product::new(ProductId::new(1), "  ", StockUnit::Kg, 10.0).is_err());
        assert!(Product::new(ProductId::new(1), "tuna", StockUnit::Kg, -1.0).is_err());
    }

    #[test]
    fn stock_unit_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&StockUnit::Kg).unwrap(), "\"kg\"");
    }
}
