//! Orders service errors.

use std::num::TryFromIntError;

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use storefront::{orders::InvalidTransition, pricing::PricingError};
use thiserror::Error;

use crate::domain::products::models::ProductUuid;

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("order already exists")]
    AlreadyExists,

    #[error("order not found")]
    NotFound,

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("complete your checkout details")]
    IncompleteCheckout,

    #[error("product {0} not found")]
    ProductNotFound(ProductUuid),

    #[error("only {available} of product {product} in stock, {requested} requested")]
    InsufficientStock {
        product: ProductUuid,
        requested: u32,
        available: u32,
    },

    #[error("price of product {product} changed from {shown} to {current}")]
    PriceChanged {
        product: ProductUuid,
        shown: i64,
        current: i64,
    },

    #[error("payment of {received} does not match order total {expected}")]
    AmountMismatch { expected: i64, received: i64 },

    #[error("not permitted")]
    Forbidden,

    #[error("invalid status change")]
    InvalidTransition(#[from] InvalidTransition),

    #[error("pricing error")]
    Pricing(#[from] PricingError),

    #[error("storage error")]
    Sql(#[source] Error),

    #[error("invalid price value")]
    InvalidPrice(#[from] TryFromIntError),
}

impl From<Error> for OrdersServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use storefront::orders::OrderStatus;

    use super::*;

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert!(matches!(
            OrdersServiceError::from(Error::RowNotFound),
            OrdersServiceError::NotFound
        ));
    }

    #[test]
    fn invalid_transition_converts_with_context() {
        let error = OrdersServiceError::from(InvalidTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Pending,
        });

        assert!(matches!(
            error,
            OrdersServiceError::InvalidTransition(InvalidTransition {
                from: OrderStatus::Delivered,
                to: OrderStatus::Pending,
            })
        ));
    }
}
