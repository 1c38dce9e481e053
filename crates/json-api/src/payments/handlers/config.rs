//! Payment Config Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{extensions::*, state::State};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct PaymentsConfigResponse {
    /// Key for initialising the processor's browser library
    pub publishable_key: String,
}

/// Payment Config Handler
///
/// Public, non-secret processor settings.
#[endpoint(tags("payments"), summary = "Payment Config")]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<PaymentsConfigResponse>, StatusError> {
    let config = depot
        .obtain_or_500::<Arc<State>>()?
        .app
        .payments
        .public_config();

    Ok(Json(PaymentsConfigResponse {
        publishable_key: config.publishable_key,
    }))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use storefront_app::domain::payments::models::PaymentsConfig;
    use testresult::TestResult;

    use crate::test_helpers::{Mocks, anonymous_service};

    use super::*;

    #[tokio::test]
    async fn test_config_needs_no_session() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .payments
            .expect_public_config()
            .once()
            .return_const(PaymentsConfig {
                publishable_key: "pk_test_123".to_string(),
            });

        let service = anonymous_service(mocks, Router::with_path("payments/config").get(handler));

        let response: PaymentsConfigResponse = TestClient::get("http://example.com/payments/config")
            .send(&service)
            .await
            .take_json()
            .await?;

        assert_eq!(response.publishable_key, "pk_test_123");

        Ok(())
    }
}
