//! Catalog lookup trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use fishledger_core::{DomainError, DomainResult, LocationId, ProductId, SalesUnitId};

use crate::product::{Location, Product, SalesUnit};

/// Resolves catalog references for stock operations.
pub trait Catalog: Send + Sync {
    fn product(&self, id: ProductId) -> Option<Product>;
    fn sales_unit(&self, id: SalesUnitId) -> Option<SalesUnit>;
    fn location(&self, id: LocationId) -> Option<Location>;
}

impl<C> Catalog for Arc<C>
where
    C: Catalog + ?Sized,
{
    fn product(&self, id: ProductId) -> Option<Product> {
        (**self).product(id)
    }

    fn sales_unit(&self, id: SalesUnitId) -> Option<SalesUnit> {
        (**self).sales_unit(id)
    }

    fn location(&self, id: LocationId) -> Option<Location> {
        (**self).location(id)
    }
}

/// Catalog held in memory, built once at start-up.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCatalog {
    products: HashMap<ProductId, Product>,
    sales_units: HashMap<SalesUnitId, SalesUnit>,
    locations: HashMap<LocationId, Location>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_product(&mut self, product: Product) -> DomainResult<()> {
        if self.products.contains_key(&product.id) {
            return Err(DomainError::conflict(format!("{} already exists", product.id)));
        }
        self.products.insert(product.id, product);
        Ok(())
    }

    /// The base product must already be registered.
    pub fn add_sales_unit(&mut self, unit: SalesUnit) -> DomainResult<()> {
        if !self.products.contains_key(&unit.base_product) {
            return Err(DomainError::not_found(unit.base_product.to_string()));
        }
        if self.sales_units.contains_key(&unit.id) {
            return Err(DomainError::conflict(format!("{} already exists", unit.id)));
        }
        self.sales_units.insert(unit.id, unit);
        Ok(())
    }

    pub fn add_location(&mut self, location: Location) -> DomainResult<()> {
        if self.locations.contains_key(&location.id) {
            return Err(DomainError::conflict(format!("{} already exists", location.id)));
        }
        self.locations.insert(location.id, location);
        Ok(())
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }
}

impl Catalog for InMemoryCatalog {
    fn product(&self, id: ProductId) -> Option<Product> {
        self.products.get(&id).cloned()
    }

    fn sales_unit(&self, id: SalesUnitId) -> Option<SalesUnit> {
        self.sales_units.get(&id).cloned()
    }

    fn location(&self, id: LocationId) -> Option<Location> {
        self.locations.get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{LocationKind, StockUnit};

    fn bream() -> Product {
        Product::new(ProductId::new(1), "sea bream", StockUnit::Kg, 5600.0).unwrap()
    }

    #[test]
    fn sales_unit_requires_known_base_product() {
        let mut catalog = InMemoryCatalog::new();
        let unit = SalesUnit::new(SalesUnitId::new(1), "whole", ProductId::new(1), 1.0, 7000.0).unwrap();

        assert!(matches!(
            catalog.add_sales_unit(unit.clone()),
            Err(DomainError::NotFound(_))
        ));

        catalog.add_product(bream()).unwrap();
        catalog.add_sales_unit(unit).unwrap();
        assert!(catalog.sales_unit(SalesUnitId::new(1)).is_some());
    }

    #[test]
    fn duplicate_entries_conflict() {
        let mut catalog = InMemoryCatalog::new();
        catalog.add_product(bream()).unwrap();
        assert!(matches!(catalog.add_product(bream()), Err(DomainError::Conflict(_))));

        let store = Location {
            id: LocationId::new(1),
            name: "Port stall".to_string(),
            kind: LocationKind::Store,
        };
        catalog.add_location(store.clone()).unwrap();
        assert!(catalog.add_location(store).is_err());
    }

    #[test]
    fn lookups_resolve_through_arc() {
        let mut catalog = InMemoryCatalog::new();
        catalog.add_product(bream()).unwrap();
        let shared: Arc<dyn Catalog> = Arc::new(catalog);
        assert_eq!(shared.product(ProductId::new(1)).unwrap().base_price, 5600.0);
        assert!(shared.product(ProductId::new(2)).is_none());
    }
}
