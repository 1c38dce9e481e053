//! Update Order Status Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use storefront::orders::OrderStatus;
use storefront_app::domain::orders::models::StatusUpdate;
use uuid::Uuid;

use crate::{
    extensions::*,
    observability::metrics,
    orders::{errors::into_status_error, models::OrderResponse},
    state::State,
};

/// Update Order Status Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UpdateStatusRequest {
    /// `processing`, `shipped`, `delivered` or `cancelled`
    pub status: String,

    /// Carrier reference; only accepted when shipping
    pub tracking_number: Option<String>,
}

/// Update Order Status Handler
#[endpoint(
    tags("orders"),
    summary = "Update Order Status",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Status updated"),
        (status_code = StatusCode::BAD_REQUEST, description = "Unknown status or misplaced tracking number"),
        (status_code = StatusCode::FORBIDDEN, description = "Admin only"),
        (status_code = StatusCode::CONFLICT, description = "Transition not allowed"),
    ),
)]
#[tracing::instrument(
    name = "orders.status",
    skip(order, json, depot),
    fields(
        order_uuid = tracing::field::Empty,
        status = tracing::field::Empty
    ),
    err
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    json: JsonBody<UpdateStatusRequest>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;
    let request = json.into_inner();
    let order = order.into_inner();

    let span = tracing::Span::current();

    span.record("order_uuid", tracing::field::display(order));
    span.record("status", request.status.as_str());

    let update = StatusUpdate {
        status: request
            .status
            .parse::<OrderStatus>()
            .or_400("unknown order status")?,
        tracking_number: request.tracking_number,
    };

    let order = state
        .app
        .orders
        .update_status(order.into(), update, actor.role)
        .await
        .map_err(into_status_error)?;

    metrics::record_status_transition(order.status);

    tracing::info!(order_uuid = %order.uuid, status = %order.status, "updated order status");

    Ok(Json(order.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use storefront::orders::{InvalidTransition, Role};
    use storefront_app::domain::orders::{OrdersServiceError, models::OrderUuid};
    use testresult::TestResult;

    use crate::test_helpers::{
        Mocks, TEST_CUSTOMER_UUID, admin_service, customer_service, make_order,
    };

    use super::*;

    fn route() -> Router {
        Router::with_path("orders/{order}/status").put(handler)
    }

    #[tokio::test]
    async fn test_admin_ships_with_tracking_number() -> TestResult {
        let uuid = OrderUuid::new();
        let mut shipped = make_order(uuid, TEST_CUSTOMER_UUID)?;

        shipped.status = OrderStatus::Shipped;
        shipped.tracking_number = Some("1Z999".to_string());

        let mut mocks = Mocks::default();

        mocks
            .orders
            .expect_update_status()
            .once()
            .withf(move |o, update, role| {
                *o == uuid
                    && *update
                        == StatusUpdate {
                            status: OrderStatus::Shipped,
                            tracking_number: Some("1Z999".to_string()),
                        }
                    && *role == Role::Admin
            })
            .return_once(move |_, _, _| Ok(shipped));

        let response: OrderResponse =
            TestClient::put(format!("http://example.com/orders/{uuid}/status"))
                .json(&json!({ "status": "shipped", "tracking_number": "1Z999" }))
                .send(&admin_service(mocks, route()))
                .await
                .take_json()
                .await?;

        assert_eq!(response.status, "shipped");
        assert_eq!(response.tracking_number.as_deref(), Some("1Z999"));

        Ok(())
    }

    #[tokio::test]
    async fn test_customer_role_is_forwarded_and_refused() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .orders
            .expect_update_status()
            .once()
            .withf(|_, _, role| *role == Role::Customer)
            .return_once(|_, _, _| Err(OrdersServiceError::Forbidden));

        let res = TestClient::put(format!("http://example.com/orders/{}/status", OrderUuid::new()))
            .json(&json!({ "status": "processing" }))
            .send(&customer_service(mocks, route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));

        Ok(())
    }

    #[tokio::test]
    async fn test_backwards_transition_returns_409() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .orders
            .expect_update_status()
            .once()
            .return_once(|_, _, _| {
                Err(OrdersServiceError::InvalidTransition(InvalidTransition {
                    from: OrderStatus::Delivered,
                    to: OrderStatus::Pending,
                }))
            });

        let mut res = TestClient::put(format!("http://example.com/orders/{}/status", OrderUuid::new()))
            .json(&json!({ "status": "pending" }))
            .send(&admin_service(mocks, route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));
        assert!(
            res.take_string().await?.contains("invalid status change"),
            "expected transition message in body"
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_status_returns_400() -> TestResult {
        let mut mocks = Mocks::default();

        mocks.orders.expect_update_status().never();

        let res = TestClient::put(format!("http://example.com/orders/{}/status", OrderUuid::new()))
            .json(&json!({ "status": "lost" }))
            .send(&admin_service(mocks, route()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
