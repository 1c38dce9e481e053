//! Payments
//!
//! Payment-intent handshake with the card processor. The processor speaks the
//! Stripe `payment_intents` API; amounts always travel in minor units.

pub mod errors;
pub mod models;
pub mod service;
mod stripe;

pub use errors::PaymentGatewayError;
pub use service::*;
pub use stripe::{StripeConfig, StripeGateway};
