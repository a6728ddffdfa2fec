use crate::core::Result;
use crate::modules::promotions::models::{Promotion, CATEGORY_RECHARGE_BONUS};
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

/// Read side of promotion lookups; the write side lives inside the
/// bonus service's transaction
pub struct PromotionRepository {
    pool: MySqlPool,
}

impl PromotionRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Active recharge-bonus promotions whose validity window contains
    /// `now` and whose usage limit is not exhausted, oldest first
    pub async fn find_active_recharge_bonuses(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Promotion>> {
        let promotions = sqlx::query_as::<_, Promotion>(
            r#"
            SELECT id, category, name, active, valid_from, valid_until,
                   usage_limit, usage_count, min_amount, max_amount,
                   bonus_type, bonus_value, max_bonus
            FROM promotions
            WHERE category = ?
              AND active = 1
              AND valid_from <= ?
              AND valid_until >= ?
              AND (usage_limit IS NULL OR usage_count < usage_limit)
            ORDER BY valid_from ASC
            "#,
        )
        .bind(CATEGORY_RECHARGE_BONUS)
        .bind(now)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(promotions)
    }
}
