//! Heritage site ticket booking backend.
//!
//! Visitors book tickets for a heritage site or a scheduled event and pay
//! now or later. The [`domain`] owns the booking rules, [`inbound`] exposes
//! them over HTTP and [`outbound`] persists them in PostgreSQL.

pub mod config;
pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::{TRACE_ID_HEADER, TraceId};
pub use middleware::Trace;
