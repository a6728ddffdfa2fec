//! CourtPay Payment Core
//!
//! Redsys signing and webhook reconciliation for the sports-facility
//! platform: signed redirect payloads out, verified notifications in,
//! idempotent settlement of orders, reservations and wallet credits.

pub mod config;
pub mod core;
pub mod modules;

// Re-export commonly used types
pub use modules::orders;
pub use modules::promotions;
pub use modules::reconciliation;
pub use modules::redsys;
pub use modules::wallet;
