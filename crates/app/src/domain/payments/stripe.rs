//! Stripe `payment_intents` client.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::{
    auth::UserUuid,
    domain::{
        orders::models::OrderUuid,
        payments::{
            PaymentGateway,
            errors::PaymentGatewayError,
            models::{IntentRequest, IntentStatus, PaymentIntent, PaymentsConfig},
        },
    },
};

/// Processor connection settings.
#[derive(Clone)]
pub struct StripeConfig {
    /// API base URL, e.g. `"https://api.stripe.com"`.
    pub api_base: String,

    /// Secret API key; never logged.
    pub secret_key: Zeroizing<String>,

    /// Publishable key handed to browsers.
    pub publishable_key: String,

    /// Upper bound for each processor call.
    pub timeout: Duration,
}

impl fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StripeConfig")
            .field("api_base", &self.api_base)
            .field("secret_key", &"**redacted**")
            .field("publishable_key", &self.publishable_key)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct StripeGateway {
    config: StripeConfig,
    http: Client,
}

impl StripeGateway {
    /// Create a gateway from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StripeConfig) -> Result<Self, PaymentGatewayError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(PaymentGatewayError::Http)?;

        Ok(Self { config, http })
    }

    fn intents_url(&self) -> String {
        format!(
            "{}/v1/payment_intents",
            self.config.api_base.trim_end_matches('/')
        )
    }

    async fn read_intent(response: Response) -> Result<PaymentIntent, PaymentGatewayError> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();

            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.error.message)
                .unwrap_or(text);

            warn!(status = status.as_u16(), %message, "payment processor rejected request");

            return Err(PaymentGatewayError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<IntentBody>().await?.into())
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(
        &self,
        request: IntentRequest,
    ) -> Result<PaymentIntent, PaymentGatewayError> {
        if request.amount <= 0 {
            return Err(PaymentGatewayError::AmountInvalid(request.amount));
        }

        let form = [
            ("amount", request.amount.to_string()),
            (
                "currency",
                request.currency.iso_alpha_code.to_ascii_lowercase(),
            ),
            ("metadata[order_id]", request.order.to_string()),
            ("metadata[user_id]", request.user.to_string()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
        ];

        let response = self
            .http
            .post(self.intents_url())
            .bearer_auth(self.config.secret_key.as_str())
            .header("Idempotency-Key", format!("order-{}", request.order))
            .form(&form)
            .send()
            .await?;

        let intent = Self::read_intent(response).await?;

        debug!(intent = %intent.id, order_uuid = %request.order, "payment intent created");

        Ok(intent)
    }

    async fn retrieve_intent(&self, intent: &str) -> Result<PaymentIntent, PaymentGatewayError> {
        if !is_valid_intent_id(intent) {
            return Err(PaymentGatewayError::InvalidIntentId);
        }

        let response = self
            .http
            .get(format!("{}/{intent}", self.intents_url()))
            .bearer_auth(self.config.secret_key.as_str())
            .send()
            .await?;

        Self::read_intent(response).await
    }

    fn public_config(&self) -> PaymentsConfig {
        PaymentsConfig {
            publishable_key: self.config.publishable_key.clone(),
        }
    }
}

fn is_valid_intent_id(intent: &str) -> bool {
    intent.starts_with("pi_")
        && intent.len() <= 255
        && intent
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || byte == b'_')
}

#[derive(Debug, Deserialize)]
struct IntentBody {
    id: String,
    client_secret: Option<String>,
    amount: i64,
    currency: String,
    status: IntentStatus,
    #[serde(default)]
    metadata: IntentMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct IntentMetadata {
    order_id: Option<String>,
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl From<IntentBody> for PaymentIntent {
    fn from(body: IntentBody) -> Self {
        let parse = |value: Option<String>| value.and_then(|value| Uuid::try_parse(&value).ok());

        Self {
            id: body.id,
            client_secret: body.client_secret,
            amount: body.amount,
            currency: body.currency,
            status: body.status,
            order: parse(body.metadata.order_id).map(OrderUuid::from_uuid),
            user: parse(body.metadata.user_id).map(UserUuid::from_uuid),
        }
    }
}
