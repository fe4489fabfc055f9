//! Strongly-typed identifiers used across the domain.
//!
//! Catalog references (products, locations, sales units) are small numeric
//! codes assigned by the back office. Documents get UUIDs from an injectable
//! [`IdGenerator`].

use core::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! impl_code_newtype {
    ($t:ident, $name:literal) => {
        #[doc = concat!("Catalog code of a ", $name, ".")]
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(pub u32);

        impl $t {
            pub fn new(code: u32) -> Self {
                Self(code)
            }

            pub fn get(self) -> u32 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}#{}", $name, self.0)
            }
        }

        impl From<u32> for $t {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }
    };
}

impl_code_newtype!(ProductId, "product");
impl_code_newtype!(LocationId, "location");
impl_code_newtype!(SalesUnitId, "sales-unit");

/// Identifier of a business document (arrival, transfer, order, ...).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Create a new identifier.
    ///
    /// Uses UUIDv7 (time-ordered). Prefer an [`IdGenerator`] in services and
    /// [`SequenceIdGenerator`] in tests for determinism.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Deterministic identifier `n`, encoded in the low bits of a UUID.
    pub fn from_sequence(n: u64) -> Self {
        Self(Uuid::from_u128(u128::from(n)))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Last eight hex digits; used to derive lot numbers.
    pub fn short(&self) -> String {
        let simple = self.0.simple().to_string();
        simple[simple.len() - 8..].to_uppercase()
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for DocumentId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl FromStr for DocumentId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid =
            Uuid::from_str(s).map_err(|e| DomainError::invalid_id(format!("DocumentId: {e}")))?;
        Ok(Self(uuid))
    }
}

macro_rules! document_id {
    ($(#[$meta:meta])* $t:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(pub DocumentId);

        impl $t {
            pub fn new(id: DocumentId) -> Self {
                Self(id)
            }

            pub fn short(&self) -> String {
                self.0.short()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

document_id!(
    /// Goods receipt from a supplier.
    ArrivalId
);
document_id!(
    /// Stock movement between two locations.
    TransferId
);
document_id!(LossId);
document_id!(
    /// Physical stock count at one location.
    InventoryCountId
);
document_id!(
    /// End-of-day till closure at a store.
    SaleClosureId
);
document_id!(SalesOrderId);
document_id!(InvoiceId);
document_id!(ProductionOrderId);

/// Source of fresh document identifiers.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> DocumentId;
}

/// Production generator: UUIDv7.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidV7Generator;

impl IdGenerator for UuidV7Generator {
    fn next_id(&self) -> DocumentId {
        DocumentId::new()
    }
}

/// Deterministic generator: 1, 2, 3, ... encoded as UUIDs.
#[derive(Debug, Default)]
pub struct SequenceIdGenerator {
    next: AtomicU64,
}

impl SequenceIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequenceIdGenerator {
    fn next_id(&self) -> DocumentId {
        DocumentId::from_sequence(self.next.fetch_add(1, Ordering::Relaxed) + 1)
    }
}
