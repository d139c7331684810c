use crate::gateway::{CreateHoldRequest, CreatedHold, GatewayError, PaymentGatewayClient};

pub struct StripeGateway {
    pub base_url: String,
    pub api_key: String,
    pub timeout_ms: u64,
    pub client: reqwest::Client,
}

impl StripeGateway {
    fn classify(err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::Timeout
        } else {
            GatewayError::Network(err.to_string())
        }
    }

    async fn post_form(
        &self,
        url: String,
        form: &[(&str, String)],
        idempotency_key: Option<String>,
    ) -> Result<serde_json::Value, GatewayError> {
        let mut req = self
            .client
            .post(url)
            .basic_auth(&self.api_key, Some(""))
            .form(form)
            .timeout(std::time::Duration::from_millis(self.timeout_ms));
        if let Some(key) = idempotency_key {
            req = req.header("Idempotency-Key", key);
        }

        let resp = req.send().await.map_err(Self::classify)?;
        let status = resp.status();
        if status.is_success() {
            resp.json().await.map_err(Self::classify)
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(GatewayError::Http {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            })
        }
    }
}

#[async_trait::async_trait]
impl PaymentGatewayClient for StripeGateway {
    fn name(&self) -> &'static str {
        "stripe"
    }

    async fn create_hold(&self, request: CreateHoldRequest) -> Result<CreatedHold, GatewayError> {
        let url = format!("{}/v1/payment_intents", self.base_url);
        let form = [
            ("amount", request.amount_minor.to_string()),
            ("currency", request.currency.to_lowercase()),
            ("capture_method", "manual".to_string()),
            ("metadata[booking_id]", request.booking_id.to_string()),
            ("metadata[customer_id]", request.customer_id.to_string()),
        ];

        // idempotency key scoped to the booking so a client retry cannot
        // create a second hold at the gateway
        let v = self
            .post_form(url, &form, Some(format!("hold_{}", request.booking_id)))
            .await?;

        let external_ref = v
            .get("id")
            .and_then(|id| id.as_str())
            .ok_or_else(|| GatewayError::Network("missing intent id in response".to_string()))?
            .to_string();

        Ok(CreatedHold { external_ref })
    }

    async fn capture(&self, external_ref: &str) -> Result<(), GatewayError> {
        let url = format!("{}/v1/payment_intents/{}/capture", self.base_url, external_ref);
        self.post_form(url, &[], None).await.map(|_| ())
    }

    async fn void(&self, external_ref: &str) -> Result<(), GatewayError> {
        let url = format!("{}/v1/payment_intents/{}/cancel", self.base_url, external_ref);
        self.post_form(url, &[], None).await.map(|_| ())
    }
}
