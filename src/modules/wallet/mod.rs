pub mod models;
pub mod services;

pub use models::{LedgerEntry, LedgerReason};
pub use services::{CreditOutcome, WalletLedger, WalletService};
