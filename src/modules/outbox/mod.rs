pub mod models;
pub mod repositories;

pub use models::{OutboxEvent, OutboxEventType};
pub use repositories::{OutboxRepository, OutboxStore};
