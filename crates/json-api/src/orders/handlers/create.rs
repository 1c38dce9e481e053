//! Create Order Handler

use std::{str::FromStr, sync::Arc};

use rust_decimal::Decimal;
use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use storefront::{checkout::PaymentMethod, money::to_minor};
use storefront_app::domain::{
    orders::models::{NewOrder, NewOrderItem},
    products::models::ProductUuid,
};
use uuid::Uuid;

use crate::{
    extensions::*,
    observability::metrics,
    orders::{
        errors::into_status_error,
        models::{OrderResponse, ShippingAddressBody},
    },
    state::State,
};

/// A cart line as the buyer saw it.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateOrderItemRequest {
    pub product: Uuid,
    pub quantity: u32,

    /// Unit price shown to the buyer, e.g. `"25.00"`
    pub unit_price: String,
}

/// Create Order Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateOrderRequest {
    /// Client-generated checkout submission id; resubmitting it returns the
    /// order it already created
    pub submission: Uuid,

    #[serde(default)]
    pub items: Vec<CreateOrderItemRequest>,

    pub shipping_address: Option<ShippingAddressBody>,

    /// `card` or `paypal`
    pub payment_method: Option<String>,
}

impl TryFrom<CreateOrderItemRequest> for NewOrderItem {
    type Error = StatusError;

    fn try_from(item: CreateOrderItemRequest) -> Result<Self, Self::Error> {
        let unit_price = Decimal::from_str(&item.unit_price)
            .or_400("unit_price must be a decimal amount")?;

        Ok(NewOrderItem {
            product: ProductUuid::from_uuid(item.product),
            quantity: item.quantity,
            unit_price: to_minor(unit_price).or_400("unit_price is not a valid amount")?,
        })
    }
}

impl TryFrom<CreateOrderRequest> for NewOrder {
    type Error = StatusError;

    fn try_from(request: CreateOrderRequest) -> Result<Self, Self::Error> {
        let payment_method = request
            .payment_method
            .map(|method| method.parse::<PaymentMethod>())
            .transpose()
            .or_400("unknown payment method")?;

        Ok(NewOrder {
            submission: request.submission,
            items: request
                .items
                .into_iter()
                .map(NewOrderItem::try_from)
                .collect::<Result<_, _>>()?,
            shipping_address: request.shipping_address.map(Into::into),
            payment_method,
        })
    }
}

/// Create Order Handler
///
/// Turns a checkout into an order. Prices are re-derived from the catalog;
/// a line whose price moved since the buyer saw it is refused.
#[endpoint(
    tags("orders"),
    summary = "Create Order",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Order created"),
        (status_code = StatusCode::BAD_REQUEST, description = "Incomplete checkout or unknown product"),
        (status_code = StatusCode::CONFLICT, description = "Stock or price changed"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "orders.create",
    skip(json, depot, res),
    fields(
        user_uuid = tracing::field::Empty,
        submission_uuid = tracing::field::Empty,
        items_count = tracing::field::Empty,
        order_uuid = tracing::field::Empty
    ),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<CreateOrderRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;
    let request = json.into_inner();

    let span = tracing::Span::current();

    span.record("user_uuid", tracing::field::display(actor.user));
    span.record("submission_uuid", tracing::field::display(request.submission));
    span.record("items_count", request.items.len());

    let order = state
        .app
        .orders
        .create_order(actor, NewOrder::try_from(request)?)
        .await
        .map_err(into_status_error)?;

    span.record("order_uuid", tracing::field::display(order.uuid));

    res.add_header(LOCATION, format!("/orders/{}", order.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    metrics::record_order_created();

    tracing::info!(order_uuid = %order.uuid, total = order.total_minor(), "accepted order");

    Ok(Json(order.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::{Value, json};
    use storefront_app::domain::orders::{OrdersServiceError, models::OrderUuid};
    use testresult::TestResult;

    use crate::test_helpers::{Mocks, TEST_CUSTOMER_UUID, customer_service, make_order};

    use super::*;

    fn make_service(mocks: Mocks) -> Service {
        customer_service(mocks, Router::with_path("orders").post(handler))
    }

    fn checkout_body(submission: Uuid, product: Uuid) -> Value {
        json!({
            "submission": submission,
            "items": [{ "product": product, "quantity": 3, "unit_price": "25.00" }],
            "shipping_address": {
                "address": "1 High Street",
                "city": "London",
                "postal_code": "N1 1AA",
                "country": "GB"
            },
            "payment_method": "card"
        })
    }

    #[tokio::test]
    async fn test_create_order_returns_201_with_location() -> TestResult {
        let uuid = OrderUuid::new();
        let order = make_order(uuid, TEST_CUSTOMER_UUID)?;
        let submission = Uuid::now_v7();
        let product = Uuid::now_v7();

        let mut mocks = Mocks::default();

        mocks
            .orders
            .expect_create_order()
            .once()
            .withf(move |actor, new_order| {
                actor.user == TEST_CUSTOMER_UUID
                    && new_order.submission == submission
                    && new_order.items
                        == vec![NewOrderItem {
                            product: ProductUuid::from_uuid(product),
                            quantity: 3,
                            unit_price: 2_500,
                        }]
                    && new_order.payment_method == Some(PaymentMethod::Card)
                    && new_order
                        .shipping_address
                        .as_ref()
                        .is_some_and(|address| address.city == "London")
            })
            .return_once(move |_, _| Ok(order));

        let mut res = TestClient::post("http://example.com/orders")
            .json(&checkout_body(submission, product))
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CREATED));

        let location = res
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);

        assert_eq!(location, Some(format!("/orders/{uuid}")));

        let body: OrderResponse = res.take_json().await?;

        assert_eq!(body.uuid, Uuid::from(uuid));
        assert_eq!(body.total_price, "92.50");
        assert!(!body.is_paid, "new orders are unpaid");

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_address_is_passed_through_as_incomplete() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .orders
            .expect_create_order()
            .once()
            .withf(|_, new_order| new_order.shipping_address.is_none())
            .return_once(|_, _| Err(OrdersServiceError::IncompleteCheckout));

        let mut body = checkout_body(Uuid::now_v7(), Uuid::now_v7());

        if let Some(object) = body.as_object_mut() {
            object.remove("shipping_address");
        }

        let mut res = TestClient::post("http://example.com/orders")
            .json(&body)
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));
        assert!(
            res.take_string()
                .await?
                .contains("complete your checkout details"),
            "expected checkout message in body"
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_sub_cent_unit_price_returns_400_without_calling_service() -> TestResult {
        let mut mocks = Mocks::default();

        mocks.orders.expect_create_order().never();

        let body = json!({
            "submission": Uuid::now_v7(),
            "items": [{ "product": Uuid::now_v7(), "quantity": 1, "unit_price": "25.001" }],
            "payment_method": "card"
        });

        let res = TestClient::post("http://example.com/orders")
            .json(&body)
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_payment_method_returns_400() -> TestResult {
        let mut mocks = Mocks::default();

        mocks.orders.expect_create_order().never();

        let mut body = checkout_body(Uuid::now_v7(), Uuid::now_v7());

        if let Some(object) = body.as_object_mut() {
            object.insert("payment_method".to_string(), json!("cheque"));
        }

        let res = TestClient::post("http://example.com/orders")
            .json(&body)
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_changed_price_returns_409() -> TestResult {
        let product = Uuid::now_v7();
        let mut mocks = Mocks::default();

        mocks
            .orders
            .expect_create_order()
            .once()
            .return_once(move |_, _| {
                Err(OrdersServiceError::PriceChanged {
                    product: ProductUuid::from_uuid(product),
                    shown: 2_500,
                    current: 2_700,
                })
            });

        let res = TestClient::post("http://example.com/orders")
            .json(&checkout_body(Uuid::now_v7(), product))
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }
}
