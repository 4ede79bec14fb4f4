//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers the JSON API, the health probes and the schema
//! wrappers from [`crate::inbound::http::schemas`]. Browser form endpoints
//! answer with redirects and plaintext, so they are left out.
//!
//! The document backs Swagger UI in debug builds and is printed by
//! `cargo run --bin openapi-dump`.

use crate::inbound::http::bookings_dto::{
    BookingCreatedResponse, BookingRequest, BookingResponse, EventAvailabilityResponse,
    PaymentReceiptResponse, PaymentRequest, PaymentResponse,
};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the visitor session cookie.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Private cookie holding the visitor id, issued by POST /api/v1/bookings.",
            ))),
        );
    }
}

/// OpenAPI document for the booking API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Heritage booking API",
        description = "Ticket bookings for heritage sites and events, with payment tracking."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::bookings::create_booking,
        crate::inbound::http::bookings::get_booking,
        crate::inbound::http::bookings::pay_booking,
        crate::inbound::http::bookings::list_my_bookings,
        crate::inbound::http::events::event_availability,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        BookingRequest,
        BookingCreatedResponse,
        BookingResponse,
        PaymentRequest,
        PaymentReceiptResponse,
        PaymentResponse,
        EventAvailabilityResponse,
        ErrorSchema,
        ErrorCodeSchema
    )),
    tags(
        (name = "bookings", description = "Create, pay for and read bookings"),
        (name = "events", description = "Event seat availability"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying the generated OpenAPI document.

    use super::*;
    use utoipa::OpenApi;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    // utoipa replaces :: with . in schema names
    const ERROR_SCHEMA_NAME: &str = "crate.domain.Error";

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[test]
    fn error_schema_has_envelope_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get(ERROR_SCHEMA_NAME).expect("Error schema");

        for field in ["error", "code", "message", "traceId", "details"] {
            assert_object_schema_has_field(error_schema, field);
        }
    }

    #[test]
    fn booking_request_schema_lists_inputs() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let request = schemas.get("BookingRequest").expect("BookingRequest schema");

        for field in ["site_id", "event_id", "no_of_tickets", "payment_method"] {
            assert_object_schema_has_field(request, field);
        }
    }

    #[test]
    fn json_routes_are_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/bookings",
            "/api/v1/bookings/{booking_id}",
            "/api/v1/bookings/{booking_id}/payments",
            "/api/v1/visitors/me/bookings",
            "/api/v1/events/{event_id}/availability",
            "/health/ready",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
