//! Order Index Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::QueryParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use storefront::orders::OrderStatus;
use storefront_app::domain::orders::models::OrderFilter;

use crate::{
    extensions::*,
    orders::{errors::into_status_error, models::OrderResponse},
    state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrdersPageResponse {
    /// Orders on this page, newest first
    pub orders: Vec<OrderResponse>,

    /// 1-based page number
    pub page: u32,

    pub per_page: u32,

    /// Orders matching the filter across all pages
    pub total: u64,
}

/// Order Index Handler
///
/// Lists every order for staff, optionally filtered by status.
#[endpoint(
    tags("orders"),
    summary = "List Orders",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Orders"),
        (status_code = StatusCode::BAD_REQUEST, description = "Unknown status"),
        (status_code = StatusCode::FORBIDDEN, description = "Admin only"),
    ),
)]
pub(crate) async fn handler(
    status: QueryParam<String, false>,
    page: QueryParam<u32, false>,
    per_page: QueryParam<u32, false>,
    depot: &mut Depot,
) -> Result<Json<OrdersPageResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    let status = status
        .into_inner()
        .map(|status| status.parse::<OrderStatus>())
        .transpose()
        .or_400("unknown order status")?;

    let filter = OrderFilter {
        status,
        page: page.into_inner().unwrap_or(1),
        per_page: per_page
            .into_inner()
            .unwrap_or(OrderFilter::DEFAULT_PER_PAGE),
    };

    let page = state
        .app
        .orders
        .list_orders(actor, filter)
        .await
        .map_err(into_status_error)?;

    Ok(Json(OrdersPageResponse {
        orders: page.items.into_iter().map(Into::into).collect(),
        page: page.page,
        per_page: page.per_page,
        total: page.total,
    }))
}
