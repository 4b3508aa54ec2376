//! Link and voting service backend.
//!
//! The crate follows a hexagonal layout: `domain` holds entities, ports, and
//! services; `inbound::http` adapts them to actix-web; `outbound` provides
//! the Diesel, Argon2, and mail adapters behind the ports.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
