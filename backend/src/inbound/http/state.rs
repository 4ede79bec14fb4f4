//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::Settlement;
use crate::domain::ports::{BookingCommand, BookingQuery};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub bookings: Arc<dyn BookingCommand>,
    pub bookings_query: Arc<dyn BookingQuery>,
    /// Settlement used by the JSON booking endpoint. `Immediate` is the demo
    /// convenience path; the web form always defers.
    pub api_settlement: Settlement,
}

impl HttpState {
    /// Construct state from the booking ports.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use heritage_backend::domain::{
    ///     BookingCommandService, BookingQueryService, PaymentMethodSet, Settlement,
    /// };
    /// use heritage_backend::inbound::http::state::HttpState;
    /// use heritage_backend::test_support::InMemoryBookingRepository;
    ///
    /// let repo = Arc::new(InMemoryBookingRepository::default());
    /// let command = BookingCommandService::new(
    ///     repo.clone(),
    ///     Arc::new(PaymentMethodSet::fallback()),
    ///     Arc::new(mockable::DefaultClock),
    /// );
    /// let state = HttpState::new(
    ///     Arc::new(command),
    ///     Arc::new(BookingQueryService::new(repo)),
    ///     Settlement::Deferred,
    /// );
    /// assert_eq!(state.api_settlement, Settlement::Deferred);
    /// ```
    pub fn new(
        bookings: Arc<dyn BookingCommand>,
        bookings_query: Arc<dyn BookingQuery>,
        api_settlement: Settlement,
    ) -> Self {
        Self {
            bookings,
            bookings_query,
            api_settlement,
        }
    }
}
