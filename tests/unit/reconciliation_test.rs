// Reconciliation scenarios against in-memory fakes: top-up settlement
// with bonus, reservation settlement with one-shot email, failure
// events, and idempotency under gateway redelivery.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{TimeZone, Utc};
use courtpay::config::AccessTokenConfig;
use courtpay::core::timezone::FacilityTimezone;
use courtpay::core::{AppError, Result};
use courtpay::modules::notifications::{
    AccessTokenService, ConfirmationMailer, ReservationConfirmation,
};
use courtpay::modules::orders::{Order, OrderStore, Reservation, ReservationStore};
use courtpay::modules::outbox::{OutboxEvent, OutboxEventType, OutboxStore};
use courtpay::modules::promotions::{AppliedBonus, RechargeBonusApplier};
use courtpay::modules::reconciliation::{ReconciliationEngine, ReconciliationSettings};
use courtpay::modules::redsys::services::NotificationOutcome;
use courtpay::modules::wallet::{CreditOutcome, LedgerReason, WalletLedger};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

struct FakeOrders {
    orders: Mutex<HashMap<String, Order>>,
    paid: Mutex<Vec<String>>,
}

impl FakeOrders {
    fn with(order: Order) -> Arc<Self> {
        let mut orders = HashMap::new();
        orders.insert(order.id.clone(), order);
        Arc::new(Self {
            orders: Mutex::new(orders),
            paid: Mutex::new(Vec::new()),
        })
    }

    fn empty() -> Arc<Self> {
        Arc::new(Self {
            orders: Mutex::new(HashMap::new()),
            paid: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl OrderStore for FakeOrders {
    async fn find_by_id(&self, id: &str) -> Result<Option<Order>> {
        Ok(self.orders.lock().unwrap().get(id).cloned())
    }

    async fn mark_paid(&self, id: &str) -> Result<()> {
        self.paid.lock().unwrap().push(id.to_string());
        Ok(())
    }
}

struct FakeReservations {
    reservations: Mutex<HashMap<String, Reservation>>,
    paid: Mutex<Vec<String>>,
}

impl FakeReservations {
    fn with(reservation: Reservation) -> Arc<Self> {
        let mut reservations = HashMap::new();
        reservations.insert(reservation.id.clone(), reservation);
        Arc::new(Self {
            reservations: Mutex::new(reservations),
            paid: Mutex::new(Vec::new()),
        })
    }

    fn empty() -> Arc<Self> {
        Arc::new(Self {
            reservations: Mutex::new(HashMap::new()),
            paid: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ReservationStore for FakeReservations {
    async fn find_by_id(&self, id: &str) -> Result<Option<Reservation>> {
        Ok(self.reservations.lock().unwrap().get(id).cloned())
    }

    async fn mark_paid(&self, id: &str) -> Result<()> {
        self.paid.lock().unwrap().push(id.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct LedgerCall {
    user_id: String,
    amount: Decimal,
    key: String,
}

#[derive(Default)]
struct FakeWallet {
    credits: Mutex<Vec<LedgerCall>>,
    payments: Mutex<Vec<LedgerCall>>,
    seen_keys: Mutex<HashSet<String>>,
}

#[async_trait]
impl WalletLedger for FakeWallet {
    async fn credit(
        &self,
        user_id: &str,
        credits: Decimal,
        idempotency_key: &str,
        _reason: LedgerReason,
        _metadata: serde_json::Value,
    ) -> Result<CreditOutcome> {
        if !self.seen_keys.lock().unwrap().insert(idempotency_key.to_string()) {
            return Ok(CreditOutcome::Duplicate);
        }
        self.credits.lock().unwrap().push(LedgerCall {
            user_id: user_id.to_string(),
            amount: credits,
            key: idempotency_key.to_string(),
        });
        Ok(CreditOutcome::Applied {
            balance_after: credits,
        })
    }

    async fn record_payment_received(
        &self,
        user_id: &str,
        amount: Decimal,
        idempotency_key: &str,
        _metadata: serde_json::Value,
    ) -> Result<CreditOutcome> {
        if !self.seen_keys.lock().unwrap().insert(idempotency_key.to_string()) {
            return Ok(CreditOutcome::Duplicate);
        }
        self.payments.lock().unwrap().push(LedgerCall {
            user_id: user_id.to_string(),
            amount,
            key: idempotency_key.to_string(),
        });
        Ok(CreditOutcome::Applied {
            balance_after: Decimal::ZERO,
        })
    }
}

#[derive(Default)]
struct RecordingOutbox {
    events: Mutex<Vec<OutboxEvent>>,
}

impl RecordingOutbox {
    fn names(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.event_type.clone())
            .collect()
    }
}

#[async_trait]
impl OutboxStore for RecordingOutbox {
    async fn append(&self, event: OutboxEvent) -> Result<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }

    async fn exists(&self, event_type: OutboxEventType, correlation_id: &str) -> Result<bool> {
        let events = self.events.lock().unwrap();
        Ok(events.iter().any(|e| {
            e.event_type == event_type.to_string() && e.correlation_id == correlation_id
        }))
    }
}

#[derive(Default)]
struct FakeBonuses {
    calls: Mutex<Vec<(String, Decimal)>>,
}

#[async_trait]
impl RechargeBonusApplier for FakeBonuses {
    async fn apply_recharge_bonus(
        &self,
        user_id: &str,
        qualifying_amount: Decimal,
    ) -> Result<Option<AppliedBonus>> {
        self.calls
            .lock()
            .unwrap()
            .push((user_id.to_string(), qualifying_amount));
        Ok(None)
    }
}

#[derive(Default)]
struct FakeMailer {
    sent: Mutex<Vec<ReservationConfirmation>>,
    fail_next: Mutex<bool>,
}

#[async_trait]
impl ConfirmationMailer for FakeMailer {
    async fn send_reservation_confirmation(
        &self,
        confirmation: &ReservationConfirmation,
    ) -> Result<()> {
        if std::mem::take(&mut *self.fail_next.lock().unwrap()) {
            return Err(AppError::gateway("mail API unavailable"));
        }
        self.sent.lock().unwrap().push(confirmation.clone());
        Ok(())
    }
}

struct Fixture {
    engine: ReconciliationEngine,
    orders: Arc<FakeOrders>,
    reservations: Arc<FakeReservations>,
    wallet: Arc<FakeWallet>,
    outbox: Arc<RecordingOutbox>,
    bonuses: Arc<FakeBonuses>,
    mailer: Arc<FakeMailer>,
}

fn fixture(orders: Arc<FakeOrders>, reservations: Arc<FakeReservations>) -> Fixture {
    let wallet = Arc::new(FakeWallet::default());
    let outbox = Arc::new(RecordingOutbox::default());
    let bonuses = Arc::new(FakeBonuses::default());
    let mailer = Arc::new(FakeMailer::default());

    let tokens = AccessTokenService::new(&AccessTokenConfig {
        secret: "an-adequately-long-test-secret".to_string(),
        receipt_ttl_hours: 720,
        pass_ttl_hours: 48,
    });

    let engine = ReconciliationEngine::new(
        orders.clone(),
        reservations.clone(),
        wallet.clone(),
        outbox.clone(),
        bonuses.clone(),
        mailer.clone(),
        tokens,
        ReconciliationSettings {
            portal_base_url: "https://club.example".to_string(),
            facility_timezone_name: "Europe/Madrid".to_string(),
            facility_timezone: FacilityTimezone::from_utc_offset_hours(1).unwrap(),
        },
    );

    Fixture {
        engine,
        orders,
        reservations,
        wallet,
        outbox,
        bonuses,
        mailer,
    }
}

fn order(id: &str) -> Order {
    Order {
        id: id.to_string(),
        user_id: "user-1".to_string(),
        total: dec!(50.00),
        credits: dec!(50.00),
        payment_status: "PENDING".to_string(),
        created_at: Some(Utc::now()),
    }
}

fn reservation(id: &str) -> Reservation {
    Reservation {
        id: id.to_string(),
        user_id: "user-1".to_string(),
        contact_email: "player@example.com".to_string(),
        court_name: "Court 2".to_string(),
        starts_at: Utc.with_ymd_and_hms(2026, 3, 14, 17, 0, 0).unwrap(),
        ends_at: Utc.with_ymd_and_hms(2026, 3, 14, 18, 30, 0).unwrap(),
        price: dec!(22.50),
        payment_status: "PENDING".to_string(),
        status: "PENDING_PAYMENT".to_string(),
        created_at: Some(Utc::now()),
    }
}

fn merchant_data(kind: &str, field: &str, id: &str) -> String {
    STANDARD.encode(format!(r#"{{"type":"{}","{}":"{}"}}"#, kind, field, id))
}

fn success_outcome(gateway_order: &str, amount: Decimal, data: Option<String>) -> NotificationOutcome {
    NotificationOutcome {
        success: true,
        order: Some(gateway_order.to_string()),
        amount: Some(amount),
        authorisation_code: Some("123456".to_string()),
        response_code: Some("0000".to_string()),
        merchant_data: data,
        error: None,
        record_id: None,
    }
}

fn failure_outcome(gateway_order: &str, data: Option<String>) -> NotificationOutcome {
    NotificationOutcome {
        success: false,
        order: Some(gateway_order.to_string()),
        amount: Some(dec!(50.00)),
        authorisation_code: None,
        response_code: Some("180".to_string()),
        merchant_data: data,
        error: Some("card not supported by this service".to_string()),
        record_id: None,
    }
}

#[tokio::test]
async fn test_successful_topup_credits_wallet_once() {
    let f = fixture(FakeOrders::with(order("ord-1")), FakeReservations::empty());
    let data = merchant_data("wallet_topup", "orderId", "ord-1");
    let outcome = success_outcome("00012345", dec!(50.00), Some(data));

    f.engine.reconcile(&outcome).await;

    assert_eq!(*f.orders.paid.lock().unwrap(), vec!["ord-1"]);

    let credits = f.wallet.credits.lock().unwrap().clone();
    assert_eq!(credits.len(), 1);
    assert_eq!(credits[0].user_id, "user-1");
    assert_eq!(credits[0].amount, dec!(50.00));
    assert_eq!(credits[0].key, "REDSYS:ord-1");

    assert!(f
        .outbox
        .names()
        .contains(&"WALLET_TOPUP_COMPLETED".to_string()));

    // Bonus evaluated against the originating order's total
    assert_eq!(
        *f.bonuses.calls.lock().unwrap(),
        vec![("user-1".to_string(), dec!(50.00))]
    );
}

#[tokio::test]
async fn test_redelivered_topup_is_not_credited_twice() {
    let f = fixture(FakeOrders::with(order("ord-1")), FakeReservations::empty());
    let data = merchant_data("wallet_topup", "orderId", "ord-1");
    let outcome = success_outcome("00012345", dec!(50.00), Some(data));

    f.engine.reconcile(&outcome).await;
    f.engine.reconcile(&outcome).await;

    assert_eq!(f.wallet.credits.lock().unwrap().len(), 1);
    assert_eq!(f.wallet.payments.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_redelivered_topup_does_not_reapply_bonus() {
    let f = fixture(FakeOrders::with(order("ord-1")), FakeReservations::empty());
    let data = merchant_data("wallet_topup", "orderId", "ord-1");
    let outcome = success_outcome("00012345", dec!(50.00), Some(data));

    f.engine.reconcile(&outcome).await;
    f.engine.reconcile(&outcome).await;

    // The duplicate credit suppresses the whole completion branch:
    // one bonus evaluation, one completed event
    assert_eq!(f.bonuses.calls.lock().unwrap().len(), 1);
    assert_eq!(
        f.outbox
            .names()
            .iter()
            .filter(|n| *n == "WALLET_TOPUP_COMPLETED")
            .count(),
        1
    );
}

#[tokio::test]
async fn test_shop_order_settles_without_wallet_credit() {
    let f = fixture(FakeOrders::with(order("ord-2")), FakeReservations::empty());
    let data = merchant_data("shop_order", "orderId", "ord-2");

    f.engine
        .reconcile(&success_outcome("00012346", dec!(50.00), Some(data)))
        .await;

    assert_eq!(*f.orders.paid.lock().unwrap(), vec!["ord-2"]);
    assert!(f.wallet.credits.lock().unwrap().is_empty());
    assert!(f.outbox.names().contains(&"ORDER_PAID".to_string()));
    assert!(f.bonuses.calls.lock().unwrap().is_empty());

    // Payment still lands in the ledger, keyed by entity and gateway refs
    let payments = f.wallet.payments.lock().unwrap().clone();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].key, "REDSYS:ORDER:ord-2:00012346:123456");
}

#[tokio::test]
async fn test_declined_payment_records_failure_event_only() {
    let f = fixture(FakeOrders::with(order("ord-1")), FakeReservations::empty());
    let data = merchant_data("wallet_topup", "orderId", "ord-1");

    f.engine.reconcile(&failure_outcome("00012345", Some(data))).await;

    assert!(f.orders.paid.lock().unwrap().is_empty());
    assert!(f.wallet.credits.lock().unwrap().is_empty());
    assert_eq!(f.outbox.names(), vec!["WALLET_TOPUP_FAILED".to_string()]);
}

#[tokio::test]
async fn test_reservation_settlement_sends_confirmation_once() {
    let f = fixture(
        FakeOrders::empty(),
        FakeReservations::with(reservation("res-9")),
    );
    let data = merchant_data("reservation", "reservationId", "res-9");
    let outcome = success_outcome("00012347", dec!(22.50), Some(data));

    f.engine.reconcile(&outcome).await;
    f.engine.reconcile(&outcome).await;

    assert_eq!(*f.reservations.paid.lock().unwrap(), vec!["res-9", "res-9"]);

    let sent = f.mailer.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1, "redelivery must not resend the email");
    assert_eq!(sent[0].to, "player@example.com");
    assert_eq!(sent[0].court_name, "Court 2");
    assert!(sent[0].receipt_url.starts_with("https://club.example/receipts/"));
    assert!(sent[0].pass_url.starts_with("https://club.example/passes/"));
    // Facility is UTC+1: 17:00 UTC renders as 18:00 local
    assert_eq!(sent[0].starts_at_local, "14/03/2026 18:00");
    assert!(sent[0].calendar_url.contains("calendar.google.com"));

    let names = f.outbox.names();
    assert!(names.contains(&"RESERVATION_PAID".to_string()));
    assert_eq!(
        names
            .iter()
            .filter(|n| *n == "RESERVATION_EMAIL_SENT")
            .count(),
        1
    );
}

#[tokio::test]
async fn test_failed_email_send_leaves_retry_open() {
    let f = fixture(
        FakeOrders::empty(),
        FakeReservations::with(reservation("res-9")),
    );
    let data = merchant_data("reservation", "reservationId", "res-9");
    let outcome = success_outcome("00012347", dec!(22.50), Some(data));

    *f.mailer.fail_next.lock().unwrap() = true;
    f.engine.reconcile(&outcome).await;

    // Send failed: the sent-guard event must not exist yet
    assert!(f.mailer.sent.lock().unwrap().is_empty());
    assert!(!f.outbox.names().contains(&"RESERVATION_EMAIL_SENT".to_string()));

    // Redelivery retries the send and records the guard
    f.engine.reconcile(&outcome).await;
    assert_eq!(f.mailer.sent.lock().unwrap().len(), 1);
    assert!(f.outbox.names().contains(&"RESERVATION_EMAIL_SENT".to_string()));
}

#[tokio::test]
async fn test_missing_merchant_data_is_a_no_op() {
    let f = fixture(FakeOrders::with(order("ord-1")), FakeReservations::empty());

    f.engine
        .reconcile(&success_outcome("00012345", dec!(50.00), None))
        .await;

    assert!(f.orders.paid.lock().unwrap().is_empty());
    assert!(f.wallet.credits.lock().unwrap().is_empty());
    assert!(f.outbox.names().is_empty());
}

#[tokio::test]
async fn test_undecodable_merchant_data_is_a_no_op() {
    let f = fixture(FakeOrders::with(order("ord-1")), FakeReservations::empty());

    f.engine
        .reconcile(&success_outcome(
            "00012345",
            dec!(50.00),
            Some("complete garbage".to_string()),
        ))
        .await;

    assert!(f.orders.paid.lock().unwrap().is_empty());
    assert!(f.outbox.names().is_empty());
}

#[tokio::test]
async fn test_unknown_order_reference_is_a_no_op() {
    let f = fixture(FakeOrders::empty(), FakeReservations::empty());
    let data = merchant_data("wallet_topup", "orderId", "ord-missing");

    f.engine
        .reconcile(&success_outcome("00012345", dec!(50.00), Some(data)))
        .await;

    assert!(f.orders.paid.lock().unwrap().is_empty());
    assert!(f.wallet.credits.lock().unwrap().is_empty());
    assert!(f.outbox.names().is_empty());
}
