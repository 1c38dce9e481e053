//! Authentication
//!
//! Bearer tokens are issued by the identity service; the storefront only
//! resolves them to an [`Actor`] through the shared `user_sessions` table.

mod errors;
mod models;
mod repository;
mod service;
mod token;

pub use errors::*;
pub use models::*;
pub use service::*;
pub use token::*;
