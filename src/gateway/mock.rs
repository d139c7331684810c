use crate::gateway::{CreateHoldRequest, CreatedHold, GatewayError, PaymentGatewayClient};

/// Behavior-driven stand-in for development and tests.
pub struct MockGateway {
    pub behavior: String,
}

impl MockGateway {
    fn outcome(&self) -> Result<(), GatewayError> {
        match self.behavior.as_str() {
            "ALWAYS_FAIL" => Err(GatewayError::Http {
                status: 402,
                body: "mock decline".to_string(),
            }),
            "ALWAYS_TIMEOUT" => Err(GatewayError::Timeout),
            _ => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl PaymentGatewayClient for MockGateway {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn create_hold(&self, request: CreateHoldRequest) -> Result<CreatedHold, GatewayError> {
        self.outcome()?;
        Ok(CreatedHold {
            external_ref: format!("mock_hold_{}", request.booking_id),
        })
    }

    async fn capture(&self, _external_ref: &str) -> Result<(), GatewayError> {
        self.outcome()
    }

    async fn void(&self, _external_ref: &str) -> Result<(), GatewayError> {
        self.outcome()
    }
}
