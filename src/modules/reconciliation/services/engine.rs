use crate::core::timezone::FacilityTimezone;
use crate::core::Result;
use crate::modules::notifications::services::{calendar, qr};
use crate::modules::notifications::{
    AccessTokenService, ConfirmationMailer, ReservationConfirmation, TokenPurpose,
};
use crate::modules::orders::{Order, OrderStore, Reservation, ReservationStore};
use crate::modules::outbox::{OutboxEvent, OutboxEventType, OutboxStore};
use crate::modules::promotions::RechargeBonusApplier;
use crate::modules::redsys::models::MerchantData;
use crate::modules::redsys::services::{NotificationOutcome, ParameterCodec};
use crate::modules::wallet::{CreditOutcome, LedgerReason, WalletLedger};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Static knobs the engine needs for building user-facing links
#[derive(Debug, Clone)]
pub struct ReconciliationSettings {
    pub portal_base_url: String,
    pub facility_timezone_name: String,
    pub facility_timezone: FacilityTimezone,
}

/// Applies a verified notification to business state exactly once.
///
/// Every downstream effect is individually isolated: a failed ledger
/// write, email send, QR render, or bonus application is logged with
/// enough context to replay manually and never reaches the HTTP
/// layer, because the gateway must always see success. The
/// authoritative failure signal for operators is the persisted state
/// (outbox *_FAILED events, missing ledger entries), not the HTTP
/// status.
pub struct ReconciliationEngine {
    orders: Arc<dyn OrderStore>,
    reservations: Arc<dyn ReservationStore>,
    wallet: Arc<dyn WalletLedger>,
    outbox: Arc<dyn OutboxStore>,
    bonuses: Arc<dyn RechargeBonusApplier>,
    mailer: Arc<dyn ConfirmationMailer>,
    tokens: AccessTokenService,
    settings: ReconciliationSettings,
}

impl ReconciliationEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        orders: Arc<dyn OrderStore>,
        reservations: Arc<dyn ReservationStore>,
        wallet: Arc<dyn WalletLedger>,
        outbox: Arc<dyn OutboxStore>,
        bonuses: Arc<dyn RechargeBonusApplier>,
        mailer: Arc<dyn ConfirmationMailer>,
        tokens: AccessTokenService,
        settings: ReconciliationSettings,
    ) -> Self {
        Self {
            orders,
            reservations,
            wallet,
            outbox,
            bonuses,
            mailer,
            tokens,
            settings,
        }
    }

    /// Entry point, called after signature verification. Safe to call
    /// again for the same notification: every mutation is guarded by
    /// an idempotency key or an existing-record check.
    pub async fn reconcile(&self, outcome: &NotificationOutcome) {
        let Some(raw) = outcome.merchant_data.as_deref() else {
            warn!(order = ?outcome.order, "Notification carries no merchant data, nothing to reconcile");
            return;
        };

        let Some(data) = ParameterCodec::decode_merchant_data(raw) else {
            warn!(
                order = ?outcome.order,
                "Merchant data did not decode to a known correlation, skipping reconciliation"
            );
            return;
        };

        match data {
            MerchantData::ShopOrder { order_id } => {
                self.settle_order(&order_id, outcome, false).await
            }
            MerchantData::WalletTopup { order_id } => {
                self.settle_order(&order_id, outcome, true).await
            }
            MerchantData::Reservation { reservation_id } => {
                self.settle_reservation(&reservation_id, outcome).await
            }
        }
    }

    async fn settle_order(&self, order_id: &str, outcome: &NotificationOutcome, topup: bool) {
        let order = match self.orders.find_by_id(order_id).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                warn!(order = %order_id, "Notification references an unknown order");
                return;
            }
            Err(e) => {
                error!(order = %order_id, error = %e, "Order lookup failed");
                return;
            }
        };

        if !outcome.success {
            let event_type = if topup {
                OutboxEventType::WalletTopupFailed
            } else {
                OutboxEventType::OrderPaymentFailed
            };
            self.append_event(event_type, order_id, failure_payload(outcome))
                .await;
            return;
        }

        if let Err(e) = self.orders.mark_paid(order_id).await {
            error!(order = %order_id, error = %e, "Failed to mark order paid");
        }

        self.record_payment(&order.user_id, order_id, "ORDER", outcome)
            .await;

        if topup {
            self.complete_topup(&order, outcome).await;
        } else {
            self.append_event(
                OutboxEventType::OrderPaid,
                order_id,
                settlement_payload(outcome),
            )
            .await;
        }
    }

    async fn complete_topup(&self, order: &Order, outcome: &NotificationOutcome) {
        let idempotency_key = format!("REDSYS:{}", order.id);
        match self
            .wallet
            .credit(
                &order.user_id,
                order.credits,
                &idempotency_key,
                LedgerReason::Topup,
                settlement_payload(outcome),
            )
            .await
        {
            Ok(CreditOutcome::Applied { .. }) => {
                self.append_event(
                    OutboxEventType::WalletTopupCompleted,
                    &order.id,
                    json!({
                        "credits": order.credits,
                        "user_id": order.user_id,
                        "gateway_order": outcome.order,
                    }),
                )
                .await;
            }
            // A redelivered notification: the top-up was already
            // settled, and the bonus with it. The bonus application
            // key changes per call, so running it again would credit
            // the reward twice.
            Ok(CreditOutcome::Duplicate) => {
                info!(order = %order.id, "Top-up already credited, skipping completion effects");
                return;
            }
            Err(e) => {
                error!(order = %order.id, error = %e, "Wallet credit failed, top-up left pending");
                return;
            }
        }

        // Best effort: a bonus failure must never roll back the top-up.
        // The qualifying amount is the originating order's total.
        match self
            .bonuses
            .apply_recharge_bonus(&order.user_id, order.total)
            .await
        {
            Ok(Some(bonus)) => {
                info!(
                    order = %order.id,
                    promotion = %bonus.promotion_name,
                    credits = %bonus.credits,
                    "Recharge bonus granted"
                );
            }
            Ok(None) => {}
            Err(e) => {
                error!(order = %order.id, error = %e, "Recharge bonus application failed");
            }
        }
    }

    async fn settle_reservation(&self, reservation_id: &str, outcome: &NotificationOutcome) {
        let reservation = match self.reservations.find_by_id(reservation_id).await {
            Ok(Some(reservation)) => reservation,
            Ok(None) => {
                warn!(reservation = %reservation_id, "Notification references an unknown reservation");
                return;
            }
            Err(e) => {
                error!(reservation = %reservation_id, error = %e, "Reservation lookup failed");
                return;
            }
        };

        if !outcome.success {
            self.append_event(
                OutboxEventType::ReservationPaymentFailed,
                reservation_id,
                failure_payload(outcome),
            )
            .await;
            return;
        }

        if let Err(e) = self.reservations.mark_paid(reservation_id).await {
            error!(reservation = %reservation_id, error = %e, "Failed to mark reservation paid");
        }

        self.record_payment(&reservation.user_id, reservation_id, "RESERVATION", outcome)
            .await;

        self.append_event(
            OutboxEventType::ReservationPaid,
            reservation_id,
            settlement_payload(outcome),
        )
        .await;

        self.send_confirmation_once(&reservation).await;
    }

    /// Sends the confirmation email at most once per reservation: a
    /// prior RESERVATION_EMAIL_SENT event suppresses the send, and the
    /// event is recorded only after the mailer succeeded, so a later
    /// duplicate notification retries a failed send safely.
    async fn send_confirmation_once(&self, reservation: &Reservation) {
        match self
            .outbox
            .exists(OutboxEventType::ReservationEmailSent, &reservation.id)
            .await
        {
            Ok(true) => {
                info!(reservation = %reservation.id, "Confirmation already sent, skipping");
                return;
            }
            Ok(false) => {}
            Err(e) => {
                error!(reservation = %reservation.id, error = %e, "Email guard check failed, skipping send");
                return;
            }
        }

        let confirmation = match self.build_confirmation(reservation) {
            Ok(confirmation) => confirmation,
            Err(e) => {
                error!(reservation = %reservation.id, error = %e, "Failed to assemble confirmation email");
                return;
            }
        };

        if let Err(e) = self
            .mailer
            .send_reservation_confirmation(&confirmation)
            .await
        {
            error!(reservation = %reservation.id, error = %e, "Confirmation email send failed");
            return;
        }

        self.append_event(
            OutboxEventType::ReservationEmailSent,
            &reservation.id,
            json!({ "to": reservation.contact_email }),
        )
        .await;
    }

    fn build_confirmation(&self, reservation: &Reservation) -> Result<ReservationConfirmation> {
        let now = Utc::now();
        let receipt_token = self
            .tokens
            .issue(&reservation.id, TokenPurpose::Receipt, now)?;
        let pass_token = self
            .tokens
            .issue(&reservation.id, TokenPurpose::EntryPass, now)?;

        let base = self.settings.portal_base_url.trim_end_matches('/');
        let receipt_url = format!("{}/receipts/{}", base, receipt_token);
        let pass_url = format!("{}/passes/{}", base, pass_token);

        let calendar_url = calendar::calendar_link(
            &format!("Reservation: {}", reservation.court_name),
            &reservation.court_name,
            reservation.starts_at,
            reservation.ends_at,
            &self.settings.facility_timezone_name,
        );

        Ok(ReservationConfirmation {
            to: reservation.contact_email.clone(),
            reservation_id: reservation.id.clone(),
            court_name: reservation.court_name.clone(),
            starts_at_local: self
                .settings
                .facility_timezone
                .format_local(reservation.starts_at),
            receipt_url,
            pass_url: pass_url.clone(),
            pass_qr_svg: qr::render_pass_qr(&pass_url),
            calendar_url,
        })
    }

    /// Ledger payment-received entry keyed so a redelivered
    /// notification is a detected no-op
    async fn record_payment(
        &self,
        user_id: &str,
        entity_id: &str,
        entity_kind: &str,
        outcome: &NotificationOutcome,
    ) {
        let Some(amount) = outcome.amount else {
            warn!(entity = %entity_id, "No amount on notification, skipping ledger entry");
            return;
        };

        let key = format!(
            "REDSYS:{}:{}:{}:{}",
            entity_kind,
            entity_id,
            outcome.order.as_deref().unwrap_or(""),
            outcome.authorisation_code.as_deref().unwrap_or(""),
        );

        if let Err(e) = self
            .wallet
            .record_payment_received(user_id, amount, &key, settlement_payload(outcome))
            .await
        {
            error!(entity = %entity_id, key = %key, error = %e, "Ledger entry failed");
        }
    }

    async fn append_event(
        &self,
        event_type: OutboxEventType,
        correlation_id: &str,
        payload: serde_json::Value,
    ) {
        if let Err(e) = self
            .outbox
            .append(OutboxEvent::new(event_type, correlation_id, payload))
            .await
        {
            error!(
                event = %event_type,
                correlation = %correlation_id,
                error = %e,
                "Outbox append failed"
            );
        }
    }
}

fn settlement_payload(outcome: &NotificationOutcome) -> serde_json::Value {
    json!({
        "gateway_order": outcome.order,
        "amount": outcome.amount,
        "authorisation_code": outcome.authorisation_code,
        "response_code": outcome.response_code,
    })
}

fn failure_payload(outcome: &NotificationOutcome) -> serde_json::Value {
    json!({
        "gateway_order": outcome.order,
        "response_code": outcome.response_code,
        "reason": outcome.error,
    })
}
