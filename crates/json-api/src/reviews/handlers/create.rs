//! Create Review Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use storefront_app::domain::products::models::NewReview;
use uuid::Uuid;

use crate::{extensions::*, reviews::errors::into_status_error, state::State};

/// Create Review Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateReviewRequest {
    /// Whole stars, 1 to 5
    pub rating: i64,

    pub comment: String,
}

impl From<CreateReviewRequest> for NewReview {
    fn from(request: CreateReviewRequest) -> Self {
        NewReview {
            rating: request.rating,
            comment: request.comment,
        }
    }
}

/// Product rating after the review was counted.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ReviewSummaryResponse {
    /// Mean rating, e.g. `"4.5"`
    pub rating: String,

    pub num_reviews: u32,
}

/// Create Review Handler
#[endpoint(
    tags("reviews"),
    summary = "Review Product",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Review recorded"),
        (status_code = StatusCode::BAD_REQUEST, description = "Rating out of range or empty comment"),
        (status_code = StatusCode::NOT_FOUND, description = "Product not found"),
        (status_code = StatusCode::CONFLICT, description = "Product already reviewed"),
    ),
)]
#[tracing::instrument(
    name = "reviews.create",
    skip(product, json, depot, res),
    fields(
        user_uuid = tracing::field::Empty,
        product_uuid = tracing::field::Empty,
        rating = tracing::field::Empty
    ),
    err
)]
pub(crate) async fn handler(
    product: PathParam<Uuid>,
    json: JsonBody<CreateReviewRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<ReviewSummaryResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;
    let request = json.into_inner();
    let product = product.into_inner();

    let span = tracing::Span::current();

    span.record("user_uuid", tracing::field::display(actor.user));
    span.record("product_uuid", tracing::field::display(product));
    span.record("rating", request.rating);

    let summary = state
        .app
        .products
        .add_review(actor, product.into(), request.into())
        .await
        .map_err(into_status_error)?;

    res.add_header(LOCATION, format!("/products/{product}/reviews"), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(ReviewSummaryResponse {
        rating: summary.rating.to_string(),
        num_reviews: summary.num_reviews,
    }))
}
