pub mod outbox_repository;

pub use outbox_repository::{OutboxRepository, OutboxStore};
