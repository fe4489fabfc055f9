//! Stock operation errors.

use serde::Serialize;
use thiserror::Error;

use fishledger_core::{DomainError, LocationId, ProductId};

pub type StockResult<T> = Result<T, StockError>;

/// One line of a transaction that could not be served.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shortfall {
    pub product: ProductId,
    pub location: LocationId,
    pub requested: f64,
    pub available: f64,
    pub missing: f64,
}

impl core::fmt::Display for Shortfall {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} at {}: requested {:.3}, available {:.3}, missing {:.3}",
            self.product, self.location, self.requested, self.available, self.missing
        )
    }
}

fn describe(shortfalls: &[Shortfall]) -> String {
    shortfalls
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failure of a stock-mutating operation. The ledger is left untouched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StockError {
    /// One or more lines lacked stock.
    #[error("insufficient stock: {}", describe(.0))]
    Insufficient(Vec<Shortfall>),

    /// A product, sales unit or location could not be resolved.
    #[error("reference not found: {0}")]
    ReferenceNotFound(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl StockError {
    pub fn reference(what: impl core::fmt::Display) -> Self {
        Self::ReferenceNotFound(what.to_string())
    }

    pub fn shortfalls(&self) -> &[Shortfall] {
        match self {
            StockError::Insufficient(lines) => lines,
            _ => &[],
        }
    }
}
