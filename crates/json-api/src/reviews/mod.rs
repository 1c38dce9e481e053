//! Product Reviews

mod errors;
mod handlers;

pub(crate) use handlers::*;
