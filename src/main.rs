use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use courtpay::config::Config;
use courtpay::core::timezone::FacilityTimezone;
use courtpay::modules::notifications::{AccessTokenService, HttpMailer};
use courtpay::modules::orders::{OrderRepository, ReservationRepository};
use courtpay::modules::outbox::OutboxRepository;
use courtpay::modules::promotions::{BonusService, PromotionRepository};
use courtpay::modules::reconciliation::{ReconciliationEngine, ReconciliationSettings};
use courtpay::modules::redsys::controllers::{CheckoutController, RedsysWebhookController};
use courtpay::modules::redsys::repositories::WebhookEventRepository;
use courtpay::modules::redsys::services::{NotificationVerifier, PaymentFormBuilder};
use courtpay::modules::wallet::WalletService;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "courtpay=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration; a merchant key that does not decode to 24
    // bytes aborts right here
    let config = Config::from_env().expect("Failed to load configuration");
    config.validate().expect("Configuration validation failed");

    tracing::info!("Starting CourtPay payment core");
    tracing::info!("Environment: {}", config.app.env);
    tracing::info!("Server binding to: {}", config.server.bind_address());

    // Create database connection pool
    let db_pool = config
        .database
        .create_pool()
        .await
        .expect("Failed to create database pool");

    tracing::info!(
        "Database pool initialized ({} connections)",
        config.database.pool_size
    );

    let facility_timezone =
        FacilityTimezone::from_utc_offset_hours(config.app.facility_utc_offset_hours)
            .expect("Invalid FACILITY_UTC_OFFSET_HOURS");

    // Wire up collaborators
    let outbox = Arc::new(OutboxRepository::new(db_pool.clone()));
    let webhook_events = Arc::new(WebhookEventRepository::new(db_pool.clone()));
    let orders = Arc::new(OrderRepository::new(db_pool.clone()));
    let reservations = Arc::new(ReservationRepository::new(db_pool.clone()));
    let wallet = Arc::new(WalletService::new(db_pool.clone()));
    let bonuses = Arc::new(BonusService::new(PromotionRepository::new(db_pool.clone())));
    let mailer = Arc::new(HttpMailer::new(config.mailer.clone()));
    let tokens = AccessTokenService::new(&config.tokens);

    let verifier = NotificationVerifier::new(
        config.redsys.merchant_key.clone(),
        config.redsys.currency,
        webhook_events,
    );

    let engine = ReconciliationEngine::new(
        orders,
        reservations,
        wallet,
        outbox.clone(),
        bonuses,
        mailer,
        tokens,
        ReconciliationSettings {
            portal_base_url: config.app.portal_base_url.clone(),
            facility_timezone_name: config.app.facility_timezone.clone(),
            facility_timezone,
        },
    );

    let form_builder = PaymentFormBuilder::new(config.redsys.clone(), outbox);

    let webhook_controller = web::Data::new(RedsysWebhookController::new(verifier, engine));
    let checkout_controller = web::Data::new(CheckoutController::new(form_builder));

    // Start HTTP server
    let bind_address = config.server.bind_address();
    let workers = config.server.workers;
    let server = HttpServer::new(move || {
        let webhook_controller = webhook_controller.clone();
        let checkout_controller = checkout_controller.clone();

        App::new()
            .wrap(TracingLogger::default())
            .wrap(Cors::default().allow_any_origin().allow_any_method())
            .app_data(web::Data::new(db_pool.clone()))
            .configure(|cfg| RedsysWebhookController::configure(cfg, webhook_controller))
            .configure(|cfg| CheckoutController::configure(cfg, checkout_controller))
            .route("/health", web::get().to(health_check))
            .route("/", web::get().to(index))
    })
    .workers(workers)
    .bind(&bind_address)?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "courtpay"
    }))
}

async fn index() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "service": "CourtPay Payment Core",
        "version": "0.1.0",
        "status": "running"
    }))
}
