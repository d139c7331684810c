use anyhow::Result;
use uuid::Uuid;

pub mod mock;
pub mod stripe;

#[derive(Debug, Clone)]
pub struct CreateHoldRequest {
    pub amount_minor: i64,
    pub currency: String,
    pub booking_id: Uuid,
    pub customer_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct CreatedHold {
    pub external_ref: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("gateway timeout")]
    Timeout,

    #[error("gateway returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("gateway network error: {0}")]
    Network(String),
}

impl From<GatewayError> for crate::domain::error::CoreError {
    fn from(err: GatewayError) -> Self {
        Self::ExternalGateway(err.to_string())
    }
}

/// The only component allowed to call out to the payment provider. The
/// hold's eventual outcome arrives via webhook; a successful `create_hold`
/// only means the hold was requested and a reference exists.
#[async_trait::async_trait]
pub trait PaymentGatewayClient: Send + Sync {
    fn name(&self) -> &'static str;

    async fn create_hold(&self, request: CreateHoldRequest) -> Result<CreatedHold, GatewayError>;

    /// Finalize the hold, transferring funds (release).
    async fn capture(&self, external_ref: &str) -> Result<(), GatewayError>;

    /// Cancel the hold without transfer (refund).
    async fn void(&self, external_ref: &str) -> Result<(), GatewayError>;
}
