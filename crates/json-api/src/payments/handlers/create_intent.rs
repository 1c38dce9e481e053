//! Create Payment Intent Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use storefront_app::domain::payments::models::IntentRequest;
use uuid::Uuid;

use crate::{
    extensions::*,
    orders::{self, models::amount},
    payments::errors::into_status_error,
    state::State,
};

/// Create Payment Intent Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateIntentRequest {
    /// Order to collect payment for; the amount is always its stored total
    pub order: Uuid,
}

/// Create Payment Intent Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct PaymentIntentResponse {
    pub payment_intent_id: String,

    /// Secret the browser confirms the payment with
    pub client_secret: Option<String>,

    pub amount: String,

    /// ISO 4217 code
    pub currency: String,
}

/// Create Payment Intent Handler
#[endpoint(
    tags("payments"),
    summary = "Create Payment Intent",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Intent created"),
        (status_code = StatusCode::CONFLICT, description = "Order already paid"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Order total is not positive"),
        (status_code = StatusCode::SERVICE_UNAVAILABLE, description = "Payment processor unavailable"),
    ),
)]
#[tracing::instrument(
    name = "payments.create_intent",
    skip(json, depot, res),
    fields(order_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<CreateIntentRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<PaymentIntentResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;
    let order = json.into_inner().order;

    tracing::Span::current().record("order_uuid", tracing::field::display(order));

    let order = state
        .app
        .orders
        .get_order(actor, order.into())
        .await
        .map_err(orders::errors::into_status_error)?;

    if order.is_paid {
        return Err(StatusError::conflict().brief("Order is already paid"));
    }

    let intent = state
        .app
        .payments
        .create_intent(IntentRequest::for_order(&order))
        .await
        .map_err(|error| into_status_error(error, res))?;

    tracing::info!(order_uuid = %order.uuid, payment_intent_id = %intent.id, "created payment intent");

    Ok(Json(PaymentIntentResponse {
        payment_intent_id: intent.id,
        client_secret: intent.client_secret,
        amount: amount(intent.amount),
        currency: intent.currency.to_ascii_uppercase(),
    }))
}
