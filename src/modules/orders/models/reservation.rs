use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A court reservation awaiting gateway settlement
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reservation {
    pub id: String,
    pub user_id: String,
    /// Email the confirmation is sent to
    pub contact_email: String,
    pub court_name: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    /// Price in major units
    pub price: Decimal,
    pub payment_status: String,
    /// Operational status, flipped to PAID together with payment_status
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
}
