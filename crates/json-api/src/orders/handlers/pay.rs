//! Pay Order Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use storefront_app::domain::{orders::models::PaymentConfirmation, payments::models::IntentStatus};
use uuid::Uuid;

use crate::{
    extensions::*,
    observability::metrics,
    orders::{errors::into_status_error, models::OrderResponse},
    payments,
    state::State,
};

/// Pay Order Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct PayOrderRequest {
    /// Intent the browser reported as paid
    pub payment_intent_id: String,
}

/// Pay Order Handler
///
/// Confirms payment after checking with the processor that the reported
/// intent succeeded for this order. The processor's amount is recorded, not
/// the client's.
#[endpoint(
    tags("orders"),
    summary = "Pay Order",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Order paid"),
        (status_code = StatusCode::PAYMENT_REQUIRED, description = "Payment has not succeeded"),
        (status_code = StatusCode::CONFLICT, description = "Intent or amount does not match the order"),
        (status_code = StatusCode::SERVICE_UNAVAILABLE, description = "Payment processor unavailable"),
    ),
)]
#[tracing::instrument(
    name = "orders.pay",
    skip(order, json, depot, res),
    fields(
        order_uuid = tracing::field::Empty,
        payment_intent_id = tracing::field::Empty
    ),
    err
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    json: JsonBody<PayOrderRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;
    let request = json.into_inner();
    let order = order.into_inner();

    let span = tracing::Span::current();

    span.record("order_uuid", tracing::field::display(order));
    span.record("payment_intent_id", request.payment_intent_id.as_str());

    let order = state
        .app
        .orders
        .get_order(actor, order.into())
        .await
        .map_err(into_status_error)?;

    let intent = state
        .app
        .payments
        .retrieve_intent(&request.payment_intent_id)
        .await
        .map_err(|error| payments::errors::into_status_error(error, res))?;

    if intent.status != IntentStatus::Succeeded {
        tracing::warn!(order_uuid = %order.uuid, status = ?intent.status, "payment not succeeded");

        return Err(StatusError::payment_required().brief("Payment has not succeeded"));
    }

    if !intent.matches(&order) {
        tracing::warn!(order_uuid = %order.uuid, intent_order = ?intent.order, "intent mismatch");

        return Err(StatusError::conflict().brief("Payment intent does not belong to this order"));
    }

    let was_paid = order.is_paid;

    let order = state
        .app
        .orders
        .confirm_payment(
            order.uuid,
            PaymentConfirmation {
                amount: intent.amount,
                reference: Some(intent.id),
            },
        )
        .await
        .map_err(into_status_error)?;

    if !was_paid && order.is_paid {
        metrics::record_payment_confirmed();
    }

    Ok(Json(order.into()))
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use storefront_app::domain::{
        orders::{
            OrdersServiceError,
            models::{Order, OrderUuid},
        },
        payments::{PaymentGatewayError, models::PaymentIntent},
    };
    use testresult::TestResult;

    use crate::test_helpers::{Mocks, TEST_CUSTOMER_UUID, customer_service, make_order};

    use super::*;

    fn make_service(mocks: Mocks) -> Service {
        customer_service(mocks, Router::with_path("orders/{order}/pay").put(handler))
    }

    fn intent_for(order: &Order, status: IntentStatus) -> PaymentIntent {
        PaymentIntent {
            id: "pi_123".to_string(),
            client_secret: None,
            amount: order.total_minor(),
            currency: "usd".to_string(),
            status,
            order: Some(order.uuid),
            user: Some(order.user),
        }
    }

    fn expect_order(mocks: &mut Mocks, order: &Order) {
        let owned = order.clone();
        let uuid = order.uuid;

        mocks
            .orders
            .expect_get_order()
            .once()
            .withf(move |_, o| *o == uuid)
            .return_once(move |_, _| Ok(owned));
    }

    async fn pay(mocks: Mocks, order: OrderUuid) -> Response {
        TestClient::put(format!("http://example.com/orders/{order}/pay"))
            .json(&json!({ "payment_intent_id": "pi_123" }))
            .send(&make_service(mocks))
            .await
    }

    #[tokio::test]
    async fn test_succeeded_intent_confirms_processor_amount() -> TestResult {
        let order = make_order(OrderUuid::new(), TEST_CUSTOMER_UUID)?;
        let intent = intent_for(&order, IntentStatus::Succeeded);

        let mut paid = order.clone();

        paid.is_paid = true;
        paid.paid_at = Some(Timestamp::UNIX_EPOCH);
        paid.payment_reference = Some("pi_123".to_string());

        let mut mocks = Mocks::default();

        expect_order(&mut mocks, &order);

        mocks
            .payments
            .expect_retrieve_intent()
            .once()
            .withf(|id| id == "pi_123")
            .return_once(move |_| Ok(intent));

        let uuid = order.uuid;

        mocks
            .orders
            .expect_confirm_payment()
            .once()
            .withf(move |o, confirmation| {
                *o == uuid
                    && *confirmation
                        == PaymentConfirmation {
                            amount: 9_250,
                            reference: Some("pi_123".to_string()),
                        }
            })
            .return_once(move |_, _| Ok(paid));

        let mut res = pay(mocks, uuid).await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: OrderResponse = res.take_json().await?;

        assert!(body.is_paid, "order should be paid");
        assert_eq!(body.payment_reference.as_deref(), Some("pi_123"));

        Ok(())
    }

    #[tokio::test]
    async fn test_unfinished_intent_returns_402() -> TestResult {
        let order = make_order(OrderUuid::new(), TEST_CUSTOMER_UUID)?;
        let intent = intent_for(&order, IntentStatus::RequiresPaymentMethod);

        let mut mocks = Mocks::default();

        expect_order(&mut mocks, &order);

        mocks
            .payments
            .expect_retrieve_intent()
            .once()
            .return_once(move |_| Ok(intent));

        mocks.orders.expect_confirm_payment().never();

        let res = pay(mocks, order.uuid).await;

        assert_eq!(res.status_code, Some(StatusCode::PAYMENT_REQUIRED));

        Ok(())
    }

    #[tokio::test]
    async fn test_intent_for_another_order_returns_409() -> TestResult {
        let order = make_order(OrderUuid::new(), TEST_CUSTOMER_UUID)?;

        let mut intent = intent_for(&order, IntentStatus::Succeeded);

        intent.order = Some(OrderUuid::new());

        let mut mocks = Mocks::default();

        expect_order(&mut mocks, &order);

        mocks
            .payments
            .expect_retrieve_intent()
            .once()
            .return_once(move |_| Ok(intent));

        mocks.orders.expect_confirm_payment().never();

        let res = pay(mocks, order.uuid).await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }

    #[tokio::test]
    async fn test_amount_mismatch_returns_409() -> TestResult {
        let order = make_order(OrderUuid::new(), TEST_CUSTOMER_UUID)?;

        let mut intent = intent_for(&order, IntentStatus::Succeeded);

        intent.amount = 100;

        let mut mocks = Mocks::default();

        expect_order(&mut mocks, &order);

        mocks
            .payments
            .expect_retrieve_intent()
            .once()
            .return_once(move |_| Ok(intent));

        mocks
            .orders
            .expect_confirm_payment()
            .once()
            .return_once(|_, _| {
                Err(OrdersServiceError::AmountMismatch {
                    expected: 9_250,
                    received: 100,
                })
            });

        let res = pay(mocks, order.uuid).await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }

    #[tokio::test]
    async fn test_processor_timeout_returns_503_with_retry_after() -> TestResult {
        let order = make_order(OrderUuid::new(), TEST_CUSTOMER_UUID)?;

        let mut mocks = Mocks::default();

        expect_order(&mut mocks, &order);

        mocks
            .payments
            .expect_retrieve_intent()
            .once()
            .return_once(|_| Err(PaymentGatewayError::UpstreamTimeout));

        mocks.orders.expect_confirm_payment().never();

        let res = pay(mocks, order.uuid).await;

        assert_eq!(res.status_code, Some(StatusCode::SERVICE_UNAVAILABLE));
        assert!(
            res.headers().contains_key("retry-after"),
            "expected Retry-After header"
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_someone_elses_order_is_never_sent_to_processor() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .orders
            .expect_get_order()
            .once()
            .return_once(|_, _| Err(OrdersServiceError::Forbidden));

        mocks.payments.expect_retrieve_intent().never();

        let res = pay(mocks, OrderUuid::new()).await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));

        Ok(())
    }
}
