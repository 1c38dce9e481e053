//! Service test support

mod db;
pub(crate) mod helpers;

pub use context::TestContext;
