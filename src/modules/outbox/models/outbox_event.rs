use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain event types recorded in the outbox. The table doubles as an
/// audit trail and as an idempotency guard for one-time side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboxEventType {
    PaymentInitiated,
    OrderPaid,
    OrderPaymentFailed,
    WalletTopupCompleted,
    WalletTopupFailed,
    ReservationPaid,
    ReservationPaymentFailed,
    ReservationEmailSent,
}

impl fmt::Display for OutboxEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutboxEventType::PaymentInitiated => "PAYMENT_INITIATED",
            OutboxEventType::OrderPaid => "ORDER_PAID",
            OutboxEventType::OrderPaymentFailed => "ORDER_PAYMENT_FAILED",
            OutboxEventType::WalletTopupCompleted => "WALLET_TOPUP_COMPLETED",
            OutboxEventType::WalletTopupFailed => "WALLET_TOPUP_FAILED",
            OutboxEventType::ReservationPaid => "RESERVATION_PAID",
            OutboxEventType::ReservationPaymentFailed => "RESERVATION_PAYMENT_FAILED",
            OutboxEventType::ReservationEmailSent => "RESERVATION_EMAIL_SENT",
        };
        write!(f, "{}", name)
    }
}

/// Append-only domain event record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEvent {
    pub id: String,
    pub event_type: String,
    /// Order or reservation id the event refers to
    pub correlation_id: String,
    pub payload: serde_json::Value,
    pub created_at: Option<DateTime<Utc>>,
}

impl OutboxEvent {
    pub fn new(
        event_type: OutboxEventType,
        correlation_id: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_type: event_type.to_string(),
            correlation_id: correlation_id.into(),
            payload,
            created_at: Some(Utc::now()),
        }
    }
}
