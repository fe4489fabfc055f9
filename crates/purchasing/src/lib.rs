//! Purchasing domain module (supplier arrivals).
//!
//! Business rules for goods receipts, implemented as deterministic domain
//! logic over a ledger transaction (no IO, no storage).

pub mod arrival;

pub use arrival::{Arrival, ArrivalLine, ArrivalStatus, NewArrivalLine};
