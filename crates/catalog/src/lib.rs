//! Catalog reference data: products, sales units and locations.
//!
//! Read-only lookups used by the stock operations to resolve base prices and
//! to convert a retail sales unit into a physical base-product quantity.

pub mod catalog;
pub mod product;

pub use catalog::{Catalog, InMemoryCatalog};
pub use product::{Location, LocationKind, Product, SalesUnit, StockUnit};
