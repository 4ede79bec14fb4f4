//! Booking and payment domain services.
//!
//! [`BookingCommandService`] validates raw submissions against the active
//! payment method catalogue and hands the resulting command to the
//! repository, which runs the whole workflow in one transaction.
//! [`BookingQueryService`] reads bookings back for confirmation pages.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{error, info, warn};

use crate::domain::ports::{
    BookingCommand, BookingQuery, BookingRepository, BookingRepositoryError, CreateBookingCommand,
    NewBooking, PaymentAttempt, PaymentAttemptCommand,
};
use crate::domain::{
    BookingConfirmation, BookingId, BookingReceipt, BookingValidationError, CreateBookingRequest,
    Error, EventAvailability, EventId, GuestPasswordPlaceholder, PaymentMethodSet, PaymentReceipt,
    RecordPaymentRequest, VisitorId,
};

pub(crate) fn map_repository_error(error: BookingRepositoryError) -> Error {
    match error {
        BookingRepositoryError::TargetNotFound { target } => {
            Error::not_found(format!("{target} does not exist"))
                .with_details(json!({ "code": "target_not_found" }))
        }
        BookingRepositoryError::VisitorNotFound { visitor_id } => {
            Error::not_found(format!("visitor {visitor_id} does not exist"))
                .with_details(json!({ "code": "visitor_not_found" }))
        }
        BookingRepositoryError::BookingNotFound { booking_id } => {
            Error::not_found(format!("booking {booking_id} does not exist"))
                .with_details(json!({ "code": "booking_not_found" }))
        }
        BookingRepositoryError::CapacityExceeded {
            remaining,
            requested,
        } => Error::capacity_exceeded(format!(
            "only {remaining} seats remain for this event"
        ))
        .with_details(json!({
            "code": "capacity_exceeded",
            "remaining": remaining,
            "requested": requested,
        })),
        BookingRepositoryError::AlreadyPaid => Error::conflict("booking is already paid")
            .with_details(json!({ "code": "already_paid" })),
        BookingRepositoryError::InvalidState { status } => {
            Error::conflict(format!("booking is {status}"))
                .with_details(json!({ "code": "invalid_state", "status": status }))
        }
        BookingRepositoryError::InvalidAmount { message } => {
            Error::invalid_request(format!("invalid payment amount: {message}"))
                .with_details(json!({ "code": "invalid_amount" }))
        }
        BookingRepositoryError::PayerMismatch => {
            Error::forbidden("booking belongs to another visitor")
        }
        BookingRepositoryError::Connection { message } => {
            error!(%message, "booking store connection failed");
            Error::service_unavailable("booking store unavailable")
        }
        BookingRepositoryError::Query { message } => {
            error!(%message, "booking store query failed");
            Error::internal(format!("booking store error: {message}"))
        }
    }
}

/// Service implementing [`BookingCommand`].
#[derive(Clone)]
pub struct BookingCommandService<R> {
    repo: Arc<R>,
    methods: Arc<PaymentMethodSet>,
    clock: Arc<dyn Clock>,
}

impl<R> BookingCommandService<R> {
    /// Create a command service over a repository and payment catalogue.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use heritage_backend::domain::{BookingCommandService, PaymentMethodSet};
    /// use heritage_backend::test_support::InMemoryBookingRepository;
    /// use mockable::DefaultClock;
    ///
    /// let service = BookingCommandService::new(
    ///     Arc::new(InMemoryBookingRepository::default()),
    ///     Arc::new(PaymentMethodSet::fallback()),
    ///     Arc::new(DefaultClock),
    /// );
    /// assert_eq!(service.payment_methods().default_method().as_str(), "bkash");
    /// ```
    pub fn new(repo: Arc<R>, methods: Arc<PaymentMethodSet>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            methods,
            clock,
        }
    }

    pub fn payment_methods(&self) -> &PaymentMethodSet {
        &self.methods
    }
}

fn reject(err: BookingValidationError) -> Error {
    info!(code = err.code(), reason = %err, "booking rejected by validation");
    Error::from(err)
}

impl<R> BookingCommandService<R>
where
    R: BookingRepository,
{
    /// Validate a submission. An unknown payment method is only reported once
    /// the target is known to exist, so a missing site or event wins.
    async fn validate(&self, command: &CreateBookingCommand) -> Result<CreateBookingRequest, Error> {
        let parts = command.fields.as_parts();
        match CreateBookingRequest::try_from_parts(parts, &self.methods, command.settlement) {
            Ok(request) => Ok(request),
            Err(err @ BookingValidationError::PaymentMethod(_)) => {
                let target = parts.target().map_err(reject)?;
                let exists = self
                    .repo
                    .target_exists(target)
                    .await
                    .map_err(map_repository_error)?;
                if exists {
                    Err(reject(err))
                } else {
                    info!(%target, "booking rejected: target does not exist");
                    Err(map_repository_error(BookingRepositoryError::target_not_found(
                        target.to_string(),
                    )))
                }
            }
            Err(err) => Err(reject(err)),
        }
    }
}

#[async_trait]
impl<R> BookingCommand for BookingCommandService<R>
where
    R: BookingRepository,
{
    async fn create_booking(
        &self,
        command: CreateBookingCommand,
    ) -> Result<BookingConfirmation, Error> {
        let request = self.validate(&command).await?;
        let target = request.target;
        let tickets = request.tickets.get();
        let booking = NewBooking {
            request,
            guest_password: GuestPasswordPlaceholder::generate(),
            booked_at: self.clock.utc(),
        };

        let confirmation = self.repo.create_booking(&booking).await.map_err(|err| {
            if matches!(err, BookingRepositoryError::CapacityExceeded { .. }) {
                warn!(%target, tickets, reason = %err, "booking rejected");
            }
            map_repository_error(err)
        })?;

        info!(
            booking_id = %confirmation.booking_id,
            visitor_id = %confirmation.visitor_id,
            amount = %confirmation.amount,
            payment_status = %confirmation.payment_status,
            %target,
            "booking created"
        );
        Ok(confirmation)
    }

    async fn record_payment(
        &self,
        command: PaymentAttemptCommand,
    ) -> Result<PaymentReceipt, Error> {
        let method = self
            .methods
            .resolve(command.method.as_deref())
            .map_err(|err| Error::from(BookingValidationError::from(err)))?;

        let attempt = PaymentAttempt {
            request: RecordPaymentRequest {
                booking_id: command.booking_id,
                method,
                outcome: command.outcome,
                payer: command.payer,
            },
            attempted_at: self.clock.utc(),
        };

        let receipt = self.repo.record_payment(&attempt).await.map_err(|err| {
            if matches!(err, BookingRepositoryError::AlreadyPaid) {
                info!(booking_id = %command.booking_id, "payment resubmitted for paid booking");
            }
            map_repository_error(err)
        })?;

        info!(
            booking_id = %receipt.booking_id,
            payment_id = %receipt.payment_id,
            payment_state = %receipt.payment_state,
            amount = %receipt.amount,
            "payment attempt recorded"
        );
        Ok(receipt)
    }

    async fn refund_booking(&self, booking_id: BookingId) -> Result<PaymentReceipt, Error> {
        let receipt = self
            .repo
            .refund_booking(booking_id)
            .await
            .map_err(map_repository_error)?;
        info!(%booking_id, amount = %receipt.amount, "booking refunded");
        Ok(receipt)
    }
}

/// Service implementing [`BookingQuery`].
#[derive(Clone)]
pub struct BookingQueryService<R> {
    repo: Arc<R>,
}

impl<R> BookingQueryService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl<R> BookingQuery for BookingQueryService<R>
where
    R: BookingRepository,
{
    async fn get_booking(
        &self,
        booking_id: BookingId,
        viewer: Option<VisitorId>,
    ) -> Result<BookingReceipt, Error> {
        let receipt = self
            .repo
            .find_booking(booking_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| {
                map_repository_error(BookingRepositoryError::booking_not_found(booking_id.get()))
            })?;

        if viewer.is_some_and(|viewer| viewer != receipt.visitor_id) {
            return Err(Error::forbidden("booking belongs to another visitor"));
        }
        Ok(receipt)
    }

    async fn list_visitor_bookings(
        &self,
        visitor_id: VisitorId,
    ) -> Result<Vec<BookingReceipt>, Error> {
        self.repo
            .list_bookings_for_visitor(visitor_id)
            .await
            .map_err(map_repository_error)
    }

    async fn event_availability(&self, event_id: EventId) -> Result<EventAvailability, Error> {
        self.repo
            .event_availability(event_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| {
                Error::not_found(format!("event {event_id} does not exist"))
                    .with_details(json!({ "code": "target_not_found" }))
            })
    }
}

#[cfg(test)]
#[path = "booking_service_tests.rs"]
mod tests;
