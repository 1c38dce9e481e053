//! Storefront
//!
//! Checkout core for a storefront: the client-side cart, price derivation,
//! order status rules and review aggregation. Nothing in this crate performs
//! network or database I/O.

pub mod cart;
pub mod checkout;
pub mod money;
pub mod orders;
pub mod pricing;
pub mod reviews;
