pub mod engine;

pub use engine::{ReconciliationEngine, ReconciliationSettings};
