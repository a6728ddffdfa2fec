use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Category marker for promotions that reward wallet top-ups
pub const CATEGORY_RECHARGE_BONUS: &str = "RECHARGE_BONUS";

pub const BONUS_TYPE_FIXED: &str = "FIXED";
pub const BONUS_TYPE_PERCENTAGE: &str = "PERCENTAGE";

/// An active promotional campaign
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Promotion {
    pub id: String,
    pub category: String,
    pub name: String,
    pub active: bool,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub usage_limit: Option<i64>,
    pub usage_count: i64,
    /// Minimum qualifying amount, if any
    pub min_amount: Option<Decimal>,
    /// Maximum qualifying amount, if any
    pub max_amount: Option<Decimal>,
    /// FIXED or PERCENTAGE
    pub bonus_type: String,
    /// Fixed credit amount, or percentage when bonus_type is PERCENTAGE
    pub bonus_value: Decimal,
    /// Cap on a percentage reward
    pub max_bonus: Option<Decimal>,
}

impl Promotion {
    /// Whether the qualifying amount satisfies the monetary conditions
    pub fn qualifies(&self, amount: Decimal) -> bool {
        if let Some(min) = self.min_amount {
            if amount < min {
                return false;
            }
        }
        if let Some(max) = self.max_amount {
            if amount > max {
                return false;
            }
        }
        true
    }

    /// Reward for a qualifying amount: a fixed credit, or a percentage
    /// of the amount capped at max_bonus; rounded to 2 decimal places
    pub fn bonus_for(&self, amount: Decimal) -> Decimal {
        let raw = if self.bonus_type == BONUS_TYPE_PERCENTAGE {
            let pct = amount * self.bonus_value / Decimal::from(100);
            match self.max_bonus {
                Some(cap) if pct > cap => cap,
                _ => pct,
            }
        } else {
            self.bonus_value
        };
        raw.round_dp(2)
    }
}

/// One application of a promotion to a user, unique per
/// (user, promotion, timestamp)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionApplication {
    pub id: String,
    pub promotion_id: String,
    pub user_id: String,
    pub amount: Decimal,
    pub uniqueness_key: String,
    pub applied_at: DateTime<Utc>,
}

impl PromotionApplication {
    pub fn new(promotion_id: &str, user_id: &str, amount: Decimal) -> Self {
        let applied_at = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            promotion_id: promotion_id.to_string(),
            user_id: user_id.to_string(),
            amount,
            uniqueness_key: format!(
                "{}:{}:{}",
                user_id,
                promotion_id,
                applied_at.timestamp_millis()
            ),
            applied_at,
        }
    }
}
