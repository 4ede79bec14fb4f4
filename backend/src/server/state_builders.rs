//! Builders wiring persistence adapters into the HTTP state.

use std::sync::Arc;

use mockable::DefaultClock;

use heritage_backend::domain::ports::BookingRepository;
use heritage_backend::domain::{
    BookingCommandService, BookingQueryService, PaymentMethodSet, Settlement,
    load_payment_methods,
};
use heritage_backend::inbound::http::state::HttpState;
use heritage_backend::outbound::persistence::{
    DbPool, DieselBookingRepository, DieselPaymentMethodSource,
};

/// Build command and query services sharing one repository.
pub(crate) fn http_state_for<R>(
    repo: Arc<R>,
    methods: PaymentMethodSet,
    api_settlement: Settlement,
) -> HttpState
where
    R: BookingRepository + 'static,
{
    let command = BookingCommandService::new(
        repo.clone(),
        Arc::new(methods),
        Arc::new(DefaultClock),
    );
    let query = BookingQueryService::new(repo);
    HttpState::new(Arc::new(command), Arc::new(query), api_settlement)
}

/// Resolve the payment catalogue and build PostgreSQL-backed services.
pub(crate) async fn build_http_state(
    pool: &DbPool,
    configured_methods: Option<&str>,
    api_settlement: Settlement,
) -> HttpState {
    let source = DieselPaymentMethodSource::new(pool.clone());
    let methods = load_payment_methods(&source, configured_methods).await;
    let repo = Arc::new(DieselBookingRepository::new(pool.clone()));
    http_state_for(repo, methods, api_settlement)
}
