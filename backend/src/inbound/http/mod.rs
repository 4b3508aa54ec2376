//! HTTP inbound adapter exposing REST endpoints.

pub mod error;
pub mod health;
pub mod posts;
pub mod session;
pub mod state;
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
pub mod users;
pub mod votes;

pub use error::ApiResult;
