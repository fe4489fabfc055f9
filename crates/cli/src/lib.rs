//! Scenario replay: a JSON description of a trading day run against an
//! in-memory back office.

pub mod scenario;

pub use scenario::{CatalogSeed, RunReport, Scenario, Step, StepReport, run};
