pub mod config;
pub mod domain {
    pub mod booking;
    pub mod error;
    pub mod escrow;
    pub mod webhook;
}
pub mod gateway;
pub mod http {
    pub mod handlers {
        pub mod bookings;
        pub mod escrows;
        pub mod ops;
        pub mod webhooks;
    }
    pub mod responses;
}
pub mod overlap;
pub mod repo {
    pub mod bookings_repo;
    pub mod escrows_repo;
    pub mod notifications_outbox_repo;
    pub mod services_repo;
    pub mod webhook_events_repo;
}
pub mod service {
    pub mod booking_service;
    pub mod notification_relay;
    pub mod settlement_service;
    pub mod webhook_processor;
}

#[derive(Clone)]
pub struct AppState {
    pub booking_service: service::booking_service::BookingService,
    pub settlement_service: service::settlement_service::SettlementService,
    pub webhook_processor: service::webhook_processor::WebhookProcessor,
    pub redis_client: redis::Client,
    pub pool: sqlx::PgPool,
}
