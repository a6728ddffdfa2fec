use crate::core::Result;
use crate::modules::outbox::models::{OutboxEvent, OutboxEventType};
use async_trait::async_trait;
use sqlx::MySqlPool;

/// Append-only store of domain events. `exists` is the idempotency
/// check used before one-time side effects such as the confirmation
/// email.
#[async_trait]
pub trait OutboxStore: Send + Sync {
    async fn append(&self, event: OutboxEvent) -> Result<()>;

    async fn exists(
        &self,
        event_type: OutboxEventType,
        correlation_id: &str,
    ) -> Result<bool>;
}

/// MySQL-backed outbox
pub struct OutboxRepository {
    pool: MySqlPool,
}

impl OutboxRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OutboxStore for OutboxRepository {
    async fn append(&self, event: OutboxEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO outbox_events (id, event_type, correlation_id, payload)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&event.id)
        .bind(&event.event_type)
        .bind(&event.correlation_id)
        .bind(&event.payload)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn exists(
        &self,
        event_type: OutboxEventType,
        correlation_id: &str,
    ) -> Result<bool> {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) as count
            FROM outbox_events
            WHERE event_type = ? AND correlation_id = ?
            "#,
        )
        .bind(event_type.to_string())
        .bind(correlation_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0 > 0)
    }
}
