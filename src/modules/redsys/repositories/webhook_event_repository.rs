use crate::core::Result;
use crate::modules::redsys::models::NotificationRecord;
use async_trait::async_trait;
use sqlx::MySqlPool;
use tracing::debug;

/// Store of inbound webhook events, unique per (provider, event_id)
/// so at-least-once gateway delivery never records twice
#[async_trait]
pub trait WebhookEventStore: Send + Sync {
    /// Record a verified notification; returns the already-stored row
    /// when this (provider, event_id) was seen before
    async fn record(&self, record: NotificationRecord) -> Result<NotificationRecord>;

    async fn find(&self, provider: &str, event_id: &str) -> Result<Option<NotificationRecord>>;

    async fn mark_processed(&self, id: &str) -> Result<()>;
}

/// MySQL-backed webhook-event store
pub struct WebhookEventRepository {
    pool: MySqlPool,
}

impl WebhookEventRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_record(row: WebhookEventRow) -> NotificationRecord {
        NotificationRecord {
            id: row.id,
            provider: row.provider,
            event_type: row.event_type,
            event_id: row.event_id,
            event_data: row.event_data,
            processed: row.processed != 0,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct WebhookEventRow {
    id: String,
    provider: String,
    event_type: String,
    event_id: String,
    event_data: serde_json::Value,
    processed: i8,
    created_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[async_trait]
impl WebhookEventStore for WebhookEventRepository {
    async fn record(&self, record: NotificationRecord) -> Result<NotificationRecord> {
        // Find-before-insert: redelivered notifications map onto the
        // existing row instead of failing the unique constraint
        if let Some(existing) = self.find(&record.provider, &record.event_id).await? {
            debug!(
                provider = %record.provider,
                event_id = %record.event_id,
                "Webhook event already recorded, skipping insert"
            );
            return Ok(existing);
        }

        sqlx::query(
            r#"
            INSERT INTO webhook_events (id, provider, event_type, event_id, event_data, processed)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.provider)
        .bind(&record.event_type)
        .bind(&record.event_id)
        .bind(&record.event_data)
        .bind(record.processed)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find(&self, provider: &str, event_id: &str) -> Result<Option<NotificationRecord>> {
        let row = sqlx::query_as::<_, WebhookEventRow>(
            r#"
            SELECT id, provider, event_type, event_id, event_data, processed, created_at
            FROM webhook_events
            WHERE provider = ? AND event_id = ?
            "#,
        )
        .bind(provider)
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Self::row_to_record))
    }

    async fn mark_processed(&self, id: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE webhook_events
            SET processed = 1
            WHERE id = ?
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
