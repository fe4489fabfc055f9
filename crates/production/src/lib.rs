//! Production domain module: workshop orders turning raw stock into
//! finished products (fillets, smoked fish, prepared dishes).

pub mod order;

pub use order::{Component, ProductionOrder, ProductionOutput, ProductionStatus};
