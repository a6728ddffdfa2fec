pub mod outbox_event;

pub use outbox_event::{OutboxEvent, OutboxEventType};
