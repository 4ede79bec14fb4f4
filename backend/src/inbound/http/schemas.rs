//! OpenAPI schema definitions for domain types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. This
//! module provides the schema definitions required for OpenAPI documentation
//! using utoipa's external schema registration.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
///
/// Stable machine-readable error codes returned in API error responses.
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// No visitor identity is available.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// The booking belongs to another visitor.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The referenced site, event, visitor or booking does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// The event cannot seat the requested tickets.
    #[schema(rename = "capacity_exceeded")]
    CapacityExceeded,
    /// The booking is already paid or refunded.
    #[schema(rename = "conflict")]
    Conflict,
    /// The booking store is unreachable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
///
/// API error response payload with machine-readable code and human-readable
/// message.
#[derive(ToSchema)]
#[schema(as = crate::domain::Error, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Same text as `message`.
    #[schema(example = "only 2 seats remain for this event")]
    error: String,
    /// Stable machine-readable error code.
    #[schema(example = "capacity_exceeded")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "only 2 seats remain for this event")]
    message: String,
    /// Correlation identifier for tracing this error across systems.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Supplementary details; `code` narrows the failure and capacity errors
    /// carry `remaining`.
    details: Option<serde_json::Value>,
}
