//! Service objects: one per aggregate, sharing a single ledger.
//!
//! Every stock-touching operation loads its document, mutates a clone inside
//! [`LedgerService::execute`] and stores the clone only when the ledger
//! commit succeeded.

pub mod arrivals;
pub mod back_office;
pub mod counts;
pub mod ledger;
pub mod losses;
pub mod production;
pub mod sales;
pub mod store;
pub mod transfers;

pub use arrivals::ArrivalService;
pub use back_office::BackOffice;
pub use counts::InventoryCountService;
pub use ledger::{LedgerService, StockEnvelope};
pub use losses::LossService;
pub use production::ProductionService;
pub use sales::SalesService;
pub use store::{DocumentStore, InMemoryDocumentStore};
pub use transfers::TransferService;
