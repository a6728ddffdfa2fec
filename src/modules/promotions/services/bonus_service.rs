use crate::core::Result;
use crate::modules::promotions::models::{Promotion, PromotionApplication};
use crate::modules::promotions::repositories::PromotionRepository;
use crate::modules::wallet::models::{LedgerEntry, LedgerReason};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::info;

/// A bonus that was applied to a user's wallet
#[derive(Debug, Clone)]
pub struct AppliedBonus {
    pub promotion_id: String,
    pub promotion_name: String,
    pub credits: Decimal,
}

/// Applies the automatic recharge bonus after a successful top-up.
/// Callers treat failures as best-effort: an error here never rolls
/// back the top-up that triggered it.
#[async_trait]
pub trait RechargeBonusApplier: Send + Sync {
    async fn apply_recharge_bonus(
        &self,
        user_id: &str,
        qualifying_amount: Decimal,
    ) -> Result<Option<AppliedBonus>>;
}

/// MySQL-backed bonus service
pub struct BonusService {
    promotions: PromotionRepository,
}

impl BonusService {
    pub fn new(promotions: PromotionRepository) -> Self {
        Self { promotions }
    }
}

#[async_trait]
impl RechargeBonusApplier for BonusService {
    /// Take the first in-window promotion whose monetary conditions
    /// the amount satisfies and apply it; later qualifying promotions
    /// are ignored. The four writes (application row, usage counter,
    /// user balance, ledger entry) happen in one transaction so a
    /// crash can never leave a half-applied bonus.
    async fn apply_recharge_bonus(
        &self,
        user_id: &str,
        qualifying_amount: Decimal,
    ) -> Result<Option<AppliedBonus>> {
        let candidates = self
            .promotions
            .find_active_recharge_bonuses(Utc::now())
            .await?;

        let Some(promotion) = first_qualifying(&candidates, qualifying_amount).cloned() else {
            return Ok(None);
        };

        let credits = promotion.bonus_for(qualifying_amount);
        if credits <= Decimal::ZERO {
            return Ok(None);
        }

        let application = PromotionApplication::new(&promotion.id, user_id, credits);

        let mut tx = self.promotions.pool().begin().await?;

        sqlx::query(
            r#"
            INSERT INTO promotion_applications
                (id, promotion_id, user_id, amount, uniqueness_key, applied_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&application.id)
        .bind(&application.promotion_id)
        .bind(&application.user_id)
        .bind(application.amount)
        .bind(&application.uniqueness_key)
        .bind(application.applied_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE promotions
            SET usage_count = usage_count + 1
            WHERE id = ?
            "#,
        )
        .bind(&promotion.id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE users
            SET credit_balance = credit_balance + ?
            WHERE id = ?
            "#,
        )
        .bind(credits)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let (balance_after,): (Decimal,) =
            sqlx::query_as("SELECT credit_balance FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?;

        let entry = LedgerEntry::new(
            user_id,
            credits,
            balance_after,
            LedgerReason::PromotionBonus,
            &application.uniqueness_key,
            json!({
                "promotion_id": promotion.id,
                "promotion_name": promotion.name,
                "qualifying_amount": qualifying_amount,
            }),
        );

        sqlx::query(
            r#"
            INSERT INTO wallet_ledger
                (id, user_id, credits, balance_after, reason, idempotency_key, metadata)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.user_id)
        .bind(entry.credits)
        .bind(entry.balance_after)
        .bind(&entry.reason)
        .bind(&entry.idempotency_key)
        .bind(&entry.metadata)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            user = %user_id,
            promotion = %promotion.name,
            credits = %credits,
            "Recharge bonus applied"
        );

        Ok(Some(AppliedBonus {
            promotion_id: promotion.id,
            promotion_name: promotion.name,
            credits,
        }))
    }
}

fn first_qualifying(promotions: &[Promotion], amount: Decimal) -> Option<&Promotion> {
    promotions.iter().find(|promo| promo.qualifies(amount))
}
