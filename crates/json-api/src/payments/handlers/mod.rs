//! Payment Handlers

pub(crate) mod config;
pub(crate) mod create_intent;
