//! Order Errors

use salvo::http::StatusError;
use tracing::error;

use storefront_app::domain::orders::OrdersServiceError;

pub(crate) fn into_status_error(error: OrdersServiceError) -> StatusError {
    match error {
        OrdersServiceError::AlreadyExists => StatusError::conflict().brief("Order already exists"),
        OrdersServiceError::NotFound => StatusError::not_found().brief("Order not found"),
        OrdersServiceError::InvalidReference
        | OrdersServiceError::MissingRequiredData
        | OrdersServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid order payload")
        }
        OrdersServiceError::IncompleteCheckout => {
            StatusError::bad_request().brief("complete your checkout details")
        }
        OrdersServiceError::ProductNotFound(_) => StatusError::bad_request()
            .brief("Product not found")
            .detail(error.to_string()),
        OrdersServiceError::InsufficientStock { .. } => StatusError::conflict()
            .brief("Insufficient stock")
            .detail(error.to_string()),
        OrdersServiceError::PriceChanged { .. } => StatusError::conflict()
            .brief("Price changed")
            .detail(error.to_string()),
        OrdersServiceError::AmountMismatch { .. } => StatusError::conflict()
            .brief("Payment amount does not match order total")
            .detail(error.to_string()),
        OrdersServiceError::Forbidden => StatusError::forbidden(),
        OrdersServiceError::InvalidTransition(transition) => StatusError::conflict()
            .brief("invalid status change")
            .detail(transition.to_string()),
        OrdersServiceError::Pricing(source) => {
            error!("failed to price order: {source}");

            StatusError::internal_server_error()
        }
        OrdersServiceError::Sql(source) => {
            error!("order storage error: {source}");

            StatusError::internal_server_error()
        }
        OrdersServiceError::InvalidPrice(source) => {
            error!("stored order amount out of range: {source}");

            StatusError::internal_server_error()
        }
    }
}
