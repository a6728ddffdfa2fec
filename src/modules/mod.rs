pub mod notifications;
pub mod orders;
pub mod outbox;
pub mod promotions;
pub mod reconciliation;
pub mod redsys;
pub mod wallet;
