use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted webhook-event row: one per verified inbound notification.
/// (provider, event_id) is unique so gateway redeliveries are detected
/// instead of recorded twice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: String,
    pub provider: String,
    /// "payment_succeeded" or "payment_failed"
    pub event_type: String,
    /// Gateway order reference
    pub event_id: String,
    /// Decoded response parameter map
    pub event_data: serde_json::Value,
    pub processed: bool,
    pub created_at: Option<DateTime<Utc>>,
}

pub const PROVIDER_REDSYS: &str = "redsys";
pub const EVENT_PAYMENT_SUCCEEDED: &str = "payment_succeeded";
pub const EVENT_PAYMENT_FAILED: &str = "payment_failed";

impl NotificationRecord {
    pub fn new(event_type: &str, event_id: impl Into<String>, event_data: serde_json::Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            provider: PROVIDER_REDSYS.to_string(),
            event_type: event_type.to_string(),
            event_id: event_id.into(),
            event_data,
            processed: false,
            created_at: Some(Utc::now()),
        }
    }
}
