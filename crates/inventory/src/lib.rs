//! Batch inventory ledger.
//!
//! Keeps the lots on hand per (product, location), consumes them
//! first-expiry-first-out and costs every movement from lot costs. Business
//! documents touch stock only through a [`LedgerTransaction`], which commits
//! all of its lines or none.

pub mod batch;
pub mod config;
pub mod consumption;
pub mod count;
pub mod error;
pub mod events;
pub mod ledger;
pub mod loss;
pub mod transaction;
pub mod transfer;
pub mod valuation;

pub use batch::{Batch, NewBatch, SourceRef};
pub use config::LedgerConfig;
pub use consumption::{ConsumedLine, ConsumptionResult};
pub use count::{CountLine, CountStatus, InventoryCount};
pub use error::{Shortfall, StockError, StockResult};
pub use events::{BatchReceived, StockConsumed, StockEvent};
pub use ledger::{StockKey, StockLedger};
pub use loss::{DeclareLoss, Loss, LossKind, LossOrigin};
pub use transaction::{CountAdjustment, LedgerTransaction, StagedChanges};
pub use transfer::{ReceivedQuantity, Transfer, TransferLine, TransferRequestLine, TransferStatus};
pub use valuation::{ExpiringBatch, StockValuation};
