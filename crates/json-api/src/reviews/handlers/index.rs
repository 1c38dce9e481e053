//! Review Index Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::PathParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use storefront_app::domain::products::models::Review;
use uuid::Uuid;

use crate::{extensions::*, reviews::errors::into_status_error, state::State};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ReviewResponse {
    pub uuid: Uuid,

    /// Reviewer
    pub user: Uuid,

    /// Reviewer display name when the review was written
    pub name: String,

    pub rating: u8,
    pub comment: String,
    pub created_at: String,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        ReviewResponse {
            uuid: review.uuid.into(),
            user: review.user.into(),
            name: review.name,
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ReviewsResponse {
    /// Reviews, newest first
    pub reviews: Vec<ReviewResponse>,
}

/// Review Index Handler
#[endpoint(tags("reviews"), summary = "List Product Reviews")]
pub(crate) async fn handler(
    product: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<ReviewsResponse>, StatusError> {
    let reviews = depot
        .obtain_or_500::<Arc<State>>()?
        .app
        .products
        .list_reviews(product.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(ReviewsResponse {
        reviews: reviews.into_iter().map(Into::into).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use salvo::test::{ResponseExt, TestClient};
    use storefront_app::domain::products::{
        ProductsServiceError,
        models::{ProductUuid, ReviewUuid},
    };
    use testresult::TestResult;

    use crate::test_helpers::{Mocks, TEST_CUSTOMER_UUID, anonymous_service};

    use super::*;

    fn make_service(mocks: Mocks) -> Service {
        anonymous_service(mocks, Router::with_path("products/{product}/reviews").get(handler))
    }

    #[tokio::test]
    async fn test_reviews_are_public() -> TestResult {
        let product = ProductUuid::new();

        let review = Review {
            uuid: ReviewUuid::new(),
            product,
            user: TEST_CUSTOMER_UUID,
            name: "Test Customer".to_string(),
            rating: 4,
            comment: "Solid".to_string(),
            created_at: Timestamp::UNIX_EPOCH,
        };

        let mut mocks = Mocks::default();

        mocks
            .products
            .expect_list_reviews()
            .once()
            .withf(move |p| *p == product)
            .return_once(move |_| Ok(vec![review]));

        let response: ReviewsResponse =
            TestClient::get(format!("http://example.com/products/{product}/reviews"))
                .send(&make_service(mocks))
                .await
                .take_json()
                .await?;

        assert_eq!(response.reviews.len(), 1);
        assert_eq!(
            response.reviews.first().map(|review| review.rating),
            Some(4)
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_product_returns_404() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .products
            .expect_list_reviews()
            .once()
            .return_once(|_| Err(ProductsServiceError::NotFound));

        let res = TestClient::get(format!(
            "http://example.com/products/{}/reviews",
            ProductUuid::new()
        ))
        .send(&make_service(mocks))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }
}
