//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::ServiceResponse;

use crate::domain::{BookingCommandService, BookingQueryService, PaymentMethodSet, Settlement};
use crate::inbound::http::state::HttpState;
use crate::test_support::InMemoryBookingRepository;

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// HTTP state backed by real services over an in-memory store.
pub fn booking_state(api_settlement: Settlement) -> (HttpState, Arc<InMemoryBookingRepository>) {
    let repo = Arc::new(InMemoryBookingRepository::default());
    let command = BookingCommandService::new(
        repo.clone(),
        Arc::new(PaymentMethodSet::fallback()),
        Arc::new(mockable::DefaultClock),
    );
    let state = HttpState::new(
        Arc::new(command),
        Arc::new(BookingQueryService::new(repo.clone())),
        api_settlement,
    );
    (state, repo)
}

/// The session cookie set by a response, if any.
pub fn session_cookie<B>(response: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
}
