//! Event seat availability.
//!
//! ```text
//! GET /api/v1/events/{event_id}/availability
//! ```

use actix_web::{get, web};

use crate::domain::EventId;
use crate::inbound::http::ApiResult;
use crate::inbound::http::bookings_dto::EventAvailabilityResponse;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{EVENT_ID, parse_id};

/// Remaining seats for an event, so clients can suggest a smaller quantity.
#[utoipa::path(
    get,
    path = "/api/v1/events/{event_id}/availability",
    params(("event_id" = i64, Path, description = "Event identifier")),
    responses(
        (status = 200, description = "Seat accounting", body = EventAvailabilityResponse),
        (status = 400, description = "Invalid event id", body = ErrorSchema),
        (status = 404, description = "Event not found", body = ErrorSchema)
    ),
    tags = ["events"],
    operation_id = "eventAvailability",
    security([])
)]
#[get("/events/{event_id}/availability")]
pub async fn event_availability(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<web::Json<EventAvailabilityResponse>> {
    let event_id: EventId = parse_id(path.into_inner(), EVENT_ID)?;
    let availability = state.bookings_query.event_availability(event_id).await?;
    Ok(web::Json(availability.into()))
}
