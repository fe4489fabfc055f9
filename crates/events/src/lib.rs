//! Stock events and their distribution.
//!
//! The ledger stages events inside a transaction and publishes them here only
//! after the transaction has been applied.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
