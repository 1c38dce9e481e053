//! Review Errors

use salvo::http::StatusError;
use tracing::error;

use storefront_app::domain::products::ProductsServiceError;

pub(crate) fn into_status_error(error: ProductsServiceError) -> StatusError {
    match error {
        ProductsServiceError::AlreadyExists => {
            StatusError::conflict().brief("Product already exists")
        }
        ProductsServiceError::NotFound => StatusError::not_found().brief("Product not found"),
        ProductsServiceError::DuplicateReview => {
            StatusError::conflict().brief("Product already reviewed")
        }
        ProductsServiceError::InvalidRating(rating) => StatusError::bad_request()
            .brief("Rating must be between 1 and 5")
            .detail(rating.to_string()),
        ProductsServiceError::InvalidReference
        | ProductsServiceError::MissingRequiredData
        | ProductsServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid review payload")
        }
        ProductsServiceError::Sql(source) => {
            error!("review storage error: {source}");

            StatusError::internal_server_error()
        }
        ProductsServiceError::InvalidPrice(source) => {
            error!("stored product price out of range: {source}");

            StatusError::internal_server_error()
        }
    }
}
