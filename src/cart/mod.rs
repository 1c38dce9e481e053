//! Cart
//!
//! Client-side cart state. A [`CartStore`] owns the items, shipping address
//! and payment method, persists every change through a [`CartStorage`] and
//! keeps a derived [`PriceBreakdown`](crate::pricing::PriceBreakdown) in step
//! with the items.

mod errors;
mod items;
mod persistence;
mod storage;
mod store;

pub use errors::{CartError, CheckoutStep, PlaceOrderError};
pub use items::{CartItem, ProductSnapshot};
pub use storage::{CartStorage, FileStorage, MemoryStorage, StorageError};
pub use store::{CartSnapshot, CartStore, CheckoutSubmission};
