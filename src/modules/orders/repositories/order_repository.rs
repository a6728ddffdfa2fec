use crate::core::Result;
use crate::modules::orders::models::{Order, PaymentStatus};
use async_trait::async_trait;
use sqlx::MySqlPool;

/// Order lookup and payment-status transitions. `mark_paid` is
/// naturally idempotent: setting PAID again is a no-op in effect.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Order>>;

    async fn mark_paid(&self, id: &str) -> Result<()>;
}

/// MySQL-backed order store
pub struct OrderRepository {
    pool: MySqlPool,
}

impl OrderRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for OrderRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, total, credits, payment_status, created_at
            FROM orders
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    async fn mark_paid(&self, id: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE orders
            SET payment_status = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(PaymentStatus::Paid.to_string())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
