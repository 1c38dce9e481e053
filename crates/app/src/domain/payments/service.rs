//! Payment gateway.

use async_trait::async_trait;
use mockall::automock;

use crate::domain::payments::{
    errors::PaymentGatewayError,
    models::{IntentRequest, PaymentIntent, PaymentsConfig},
};

#[automock]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a payment intent for an order total.
    ///
    /// Creating an intent twice for the same order yields the same intent.
    async fn create_intent(
        &self,
        request: IntentRequest,
    ) -> Result<PaymentIntent, PaymentGatewayError>;

    /// Fetches the current state of a payment intent.
    async fn retrieve_intent(&self, intent: &str) -> Result<PaymentIntent, PaymentGatewayError>;

    /// Public, non-secret client configuration.
    fn public_config(&self) -> PaymentsConfig;
}
