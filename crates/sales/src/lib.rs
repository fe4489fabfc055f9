//! Sales domain module: till closures, customer orders, invoices.
//!
//! Business rules implemented as deterministic domain logic over a ledger
//! transaction (no IO, no storage).

pub mod closure;
pub mod fulfilment;
pub mod invoice;
pub mod order;

pub use closure::{ClosureStatus, ClosureSummary, SaleClosure, SaleLine};
pub use fulfilment::{LineValuation, SoldQuantity};
pub use invoice::{Invoice, InvoiceStatus};
pub use order::{OrderLine, SalesOrder, SalesOrderStatus};
