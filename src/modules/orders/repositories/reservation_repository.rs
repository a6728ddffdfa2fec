use crate::core::Result;
use crate::modules::orders::models::{PaymentStatus, Reservation};
use async_trait::async_trait;
use sqlx::MySqlPool;

/// Reservation lookup and the paid transition. Payment status and
/// operational status flip together in one statement so a reservation
/// is never half-settled.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Reservation>>;

    async fn mark_paid(&self, id: &str) -> Result<()>;
}

/// MySQL-backed reservation store
pub struct ReservationRepository {
    pool: MySqlPool,
}

impl ReservationRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReservationStore for ReservationRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Reservation>> {
        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT id, user_id, contact_email, court_name, starts_at, ends_at,
                   price, payment_status, status, created_at
            FROM reservations
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reservation)
    }

    async fn mark_paid(&self, id: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE reservations
            SET payment_status = ?, status = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(PaymentStatus::Paid.to_string())
        .bind(PaymentStatus::Paid.to_string())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
