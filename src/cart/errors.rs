//! Cart errors

use std::fmt::{Display, Formatter, Result as FmtResult};

use thiserror::Error;
use uuid::Uuid;

use crate::{cart::StorageError, pricing::PricingError};

/// Checkout detail that must be present before an order can be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStep {
    /// At least one item.
    Items,

    /// A complete shipping address.
    ShippingAddress,

    /// A payment method.
    PaymentMethod,
}

impl Display for CheckoutStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::Items => "cart items",
            Self::ShippingAddress => "shipping address",
            Self::PaymentMethod => "payment method",
        })
    }
}

/// Errors raised by cart operations. A failed operation leaves the cart unchanged.
#[derive(Debug, Error)]
pub enum CartError {
    /// Quantities must be at least one; use `remove_item` to drop a line.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// The product is not in the cart.
    #[error("product {0} is not in the cart")]
    ItemNotFound(Uuid),

    /// Something required for checkout is missing.
    #[error("complete your checkout details: {0} missing")]
    IncompleteCheckout(CheckoutStep),

    /// The new state could not be persisted.
    #[error("failed to persist cart state")]
    Storage(#[from] StorageError),

    /// The new state could not be priced.
    #[error("failed to price cart")]
    Pricing(#[from] PricingError),
}

/// Errors raised while placing an order from the cart.
#[derive(Debug, Error)]
pub enum PlaceOrderError<O, E> {
    /// The cart is not ready for checkout; nothing was submitted.
    #[error(transparent)]
    Cart(CartError),

    /// The order could not be created; the cart is unchanged.
    #[error("order submission failed")]
    Submit(#[source] E),

    /// The order exists but the cart still holds its items. Resubmitting the
    /// same cart returns this same order.
    #[error("order was created but the cart could not be cleared")]
    ClearFailed {
        /// The created order.
        order: O,

        /// Why clearing failed.
        #[source]
        source: CartError,
    },
}
