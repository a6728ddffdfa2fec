pub mod services;

pub use services::{ReconciliationEngine, ReconciliationSettings};
