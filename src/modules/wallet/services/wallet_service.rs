use crate::core::Result;
use crate::modules::wallet::models::{LedgerEntry, LedgerReason};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::MySqlPool;
use tracing::{debug, info};

/// Result of an idempotency-keyed ledger operation
#[derive(Debug, Clone, PartialEq)]
pub enum CreditOutcome {
    Applied { balance_after: Decimal },
    /// The idempotency key was seen before; nothing was changed
    Duplicate,
}

/// Wallet balance and ledger operations. Every mutation is keyed:
/// a repeated key is detected and skipped, never double-applied.
#[async_trait]
pub trait WalletLedger: Send + Sync {
    /// Credit the user's balance and append a ledger entry, both
    /// inside one transaction
    async fn credit(
        &self,
        user_id: &str,
        credits: Decimal,
        idempotency_key: &str,
        reason: LedgerReason,
        metadata: serde_json::Value,
    ) -> Result<CreditOutcome>;

    /// Append a payment-received entry without changing the balance
    async fn record_payment_received(
        &self,
        user_id: &str,
        amount: Decimal,
        idempotency_key: &str,
        metadata: serde_json::Value,
    ) -> Result<CreditOutcome>;
}

/// MySQL-backed wallet service
pub struct WalletService {
    pool: MySqlPool,
}

impl WalletService {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn key_exists(&self, idempotency_key: &str) -> Result<bool> {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) as count
            FROM wallet_ledger
            WHERE idempotency_key = ?
            "#,
        )
        .bind(idempotency_key)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0 > 0)
    }

    async fn insert_entry<'a, E>(entry: &LedgerEntry, executor: E) -> Result<()>
    where
        E: sqlx::Executor<'a, Database = sqlx::MySql>,
    {
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
        .execute(executor)
        .await?;

        Ok(())
    }

    fn is_duplicate_key(error: &sqlx::Error) -> bool {
        error
            .as_database_error()
            .map(|db| db.is_unique_violation())
            .unwrap_or(false)
    }
}

#[async_trait]
impl WalletLedger for WalletService {
    async fn credit(
        &self,
        user_id: &str,
        credits: Decimal,
        idempotency_key: &str,
        reason: LedgerReason,
        metadata: serde_json::Value,
    ) -> Result<CreditOutcome> {
        if self.key_exists(idempotency_key).await? {
            debug!(key = %idempotency_key, "Ledger key already applied, skipping credit");
            return Ok(CreditOutcome::Duplicate);
        }

        let mut tx = self.pool.begin().await?;

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

        let (balance_after,): (Decimal,) = sqlx::query_as(
            r#"
            SELECT credit_balance FROM users WHERE id = ?
            "#,
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let entry = LedgerEntry::new(
            user_id,
            credits,
            balance_after,
            reason,
            idempotency_key,
            metadata,
        );

        // A concurrent redelivery can slip past the pre-check; the
        // unique key on the ledger row catches it and the rollback
        // undoes the balance increment
        if let Err(e) = Self::insert_entry(&entry, &mut *tx).await {
            if let crate::core::AppError::Database(db_err) = &e {
                if Self::is_duplicate_key(db_err) {
                    tx.rollback().await?;
                    debug!(key = %idempotency_key, "Concurrent duplicate credit detected");
                    return Ok(CreditOutcome::Duplicate);
                }
            }
            return Err(e);
        }

        tx.commit().await?;

        info!(
            user = %user_id,
            credits = %credits,
            balance = %balance_after,
            key = %idempotency_key,
            "Wallet credited"
        );

        Ok(CreditOutcome::Applied { balance_after })
    }

    async fn record_payment_received(
        &self,
        user_id: &str,
        amount: Decimal,
        idempotency_key: &str,
        metadata: serde_json::Value,
    ) -> Result<CreditOutcome> {
        if self.key_exists(idempotency_key).await? {
            debug!(key = %idempotency_key, "Payment already recorded, skipping");
            return Ok(CreditOutcome::Duplicate);
        }

        let (balance,): (Decimal,) = sqlx::query_as(
            r#"
            SELECT credit_balance FROM users WHERE id = ?
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let entry = LedgerEntry::new(
            user_id,
            amount,
            balance,
            LedgerReason::PaymentReceived,
            idempotency_key,
            metadata,
        );

        match Self::insert_entry(&entry, &self.pool).await {
            Ok(()) => Ok(CreditOutcome::Applied {
                balance_after: balance,
            }),
            Err(crate::core::AppError::Database(db_err)) if Self::is_duplicate_key(&db_err) => {
                debug!(key = %idempotency_key, "Concurrent duplicate payment record detected");
                Ok(CreditOutcome::Duplicate)
            }
            Err(e) => Err(e),
        }
    }
}
