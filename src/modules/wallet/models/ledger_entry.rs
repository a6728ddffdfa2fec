use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a ledger entry exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerReason {
    Topup,
    PaymentReceived,
    PromotionBonus,
}

impl fmt::Display for LedgerReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerReason::Topup => write!(f, "TOPUP"),
            LedgerReason::PaymentReceived => write!(f, "PAYMENT_RECEIVED"),
            LedgerReason::PromotionBonus => write!(f, "PROMOTION_BONUS"),
        }
    }
}

/// Append-only wallet ledger entry, keyed by an idempotency token so
/// gateway redeliveries can never double-credit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: String,
    pub user_id: String,
    pub credits: Decimal,
    pub balance_after: Decimal,
    pub reason: String,
    pub idempotency_key: String,
    pub metadata: serde_json::Value,
    pub created_at: Option<DateTime<Utc>>,
}

impl LedgerEntry {
    pub fn new(
        user_id: impl Into<String>,
        credits: Decimal,
        balance_after: Decimal,
        reason: LedgerReason,
        idempotency_key: impl Into<String>,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            credits,
            balance_after,
            reason: reason.to_string(),
            idempotency_key: idempotency_key.into(),
            metadata,
            created_at: Some(Utc::now()),
        }
    }
}
