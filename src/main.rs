use axum::routing::{get, post};
use axum::Router;
use marketplace_bookings::config::AppConfig;
use marketplace_bookings::gateway::mock::MockGateway;
use marketplace_bookings::gateway::stripe::StripeGateway;
use marketplace_bookings::gateway::PaymentGatewayClient;
use marketplace_bookings::repo::bookings_repo::BookingsRepo;
use marketplace_bookings::repo::escrows_repo::EscrowsRepo;
use marketplace_bookings::repo::notifications_outbox_repo::NotificationsOutboxRepo;
use marketplace_bookings::service::booking_service::BookingService;
use marketplace_bookings::service::notification_relay::NotificationRelay;
use marketplace_bookings::service::settlement_service::SettlementService;
use marketplace_bookings::service::webhook_processor::WebhookProcessor;
use marketplace_bookings::AppState;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&cfg.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let redis_client = redis::Client::open(cfg.redis_url.clone())?;

    let bookings_repo = BookingsRepo { pool: pool.clone() };
    let escrows_repo = EscrowsRepo { pool: pool.clone() };
    let notifications_outbox_repo = NotificationsOutboxRepo { pool: pool.clone() };

    let gateway: Arc<dyn PaymentGatewayClient> = if cfg.gateway_adapter == "STRIPE" {
        Arc::new(StripeGateway {
            base_url: cfg.gateway_base_url.clone(),
            api_key: cfg.gateway_api_key.clone(),
            timeout_ms: cfg.gateway_timeout_ms,
            client: reqwest::Client::new(),
        })
    } else {
        Arc::new(MockGateway {
            behavior: std::env::var("MOCK_GATEWAY_BEHAVIOR")
                .unwrap_or_else(|_| "ALWAYS_ACCEPT".to_string()),
        })
    };

    let booking_service = BookingService {
        pool: pool.clone(),
        bookings_repo: bookings_repo.clone(),
        escrows_repo: escrows_repo.clone(),
        gateway: gateway.clone(),
    };
    let settlement_service = SettlementService {
        pool: pool.clone(),
        escrows_repo: escrows_repo.clone(),
        gateway: gateway.clone(),
    };
    let webhook_processor = WebhookProcessor {
        pool: pool.clone(),
        escrows_repo: escrows_repo.clone(),
        webhook_secret: cfg.webhook_secret.clone(),
    };

    let relay = NotificationRelay {
        outbox_repo: notifications_outbox_repo,
        redis_client: redis::Client::open(cfg.redis_url.clone())?,
        stream_key: cfg.notifications_stream_key.clone(),
    };
    tokio::spawn(relay.run());

    let state = AppState {
        booking_service,
        settlement_service,
        webhook_processor,
        redis_client,
        pool,
    };

    let app = Router::new()
        .route("/health", get(marketplace_bookings::http::handlers::bookings::health))
        .route("/bookings", post(marketplace_bookings::http::handlers::bookings::create_booking))
        .route(
            "/bookings/:booking_id",
            get(marketplace_bookings::http::handlers::bookings::get_booking),
        )
        .route(
            "/bookings/:booking_id/payment",
            post(marketplace_bookings::http::handlers::bookings::initiate_payment),
        )
        .route(
            "/bookings/:booking_id/start",
            post(marketplace_bookings::http::handlers::bookings::start_booking),
        )
        .route(
            "/escrows/:escrow_id",
            get(marketplace_bookings::http::handlers::escrows::get_escrow),
        )
        .route(
            "/escrows/:escrow_id/settlement",
            post(marketplace_bookings::http::handlers::escrows::settle_escrow),
        )
        .route(
            "/webhooks/payment-gateway",
            post(marketplace_bookings::http::handlers::webhooks::receive_gateway_event),
        )
        .route("/ops/readiness", get(marketplace_bookings::http::handlers::ops::readiness))
        .route("/ops/liveness", get(marketplace_bookings::http::handlers::ops::liveness))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
