//! Booking requests, results and their validation.
//!
//! [`CreateBookingRequest::try_from_parts`] turns the loosely typed fields that
//! both the web form and the JSON API submit into a fully validated request.
//! Every validation failure surfaces here, before any repository call.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use super::payment::{PaymentMethodError, PaymentRecord, UnknownStatus};
use super::{
    BookingId, Error, EventId, GuestContact, GuestValidationError, IdValidationError, Money,
    PaymentId, PaymentMethod, PaymentMethodSet, PaymentOutcome, PaymentState, Settlement, SiteId,
    VisitorId, VisitorRef,
};

/// What a booking is for: exactly one site or one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum BookingTarget {
    Site(SiteId),
    Event(EventId),
}

impl BookingTarget {
    /// Require exactly one of the two identifiers.
    pub fn from_optional(
        site_id: Option<SiteId>,
        event_id: Option<EventId>,
    ) -> Result<Self, BookingValidationError> {
        match (site_id, event_id) {
            (Some(site), None) => Ok(Self::Site(site)),
            (None, Some(event)) => Ok(Self::Event(event)),
            _ => Err(BookingValidationError::AmbiguousTarget),
        }
    }
}

impl fmt::Display for BookingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Site(id) => write!(f, "site {id}"),
            Self::Event(id) => write!(f, "event {id}"),
        }
    }
}

/// Number of tickets in a booking; always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TicketCount(u32);

impl TicketCount {
    pub const ONE: Self = Self(1);

    pub fn new(raw: i64) -> Result<Self, BookingValidationError> {
        u32::try_from(raw)
            .ok()
            .filter(|count| *count >= 1)
            .map(Self)
            .ok_or(BookingValidationError::InvalidTicketCount(raw))
    }

    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for TicketCount {
    fn default() -> Self {
        Self::ONE
    }
}

/// Payment status recorded on the booking row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingPaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl BookingPaymentStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }

    /// Booking status implied by the state of its payment row.
    ///
    /// Failed attempts keep the booking `pending` so the visitor can retry.
    pub fn for_payment(state: PaymentState) -> Self {
        match state {
            PaymentState::Successful => Self::Paid,
            PaymentState::Refunded => Self::Refunded,
            PaymentState::Initiated | PaymentState::Failed => Self::Pending,
        }
    }
}

impl fmt::Display for BookingPaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingPaymentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

/// Validation failures raised while assembling booking commands.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingValidationError {
    #[error("provide exactly one of site_id or event_id")]
    AmbiguousTarget,
    #[error(transparent)]
    Guest(#[from] GuestValidationError),
    #[error("no_of_tickets must be at least 1 (got {0})")]
    InvalidTicketCount(i64),
    #[error(transparent)]
    PaymentMethod(#[from] PaymentMethodError),
    #[error(transparent)]
    Identifier(#[from] IdValidationError),
}

impl BookingValidationError {
    /// Stable discriminator placed in `details.code`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AmbiguousTarget => "ambiguous_target",
            Self::Guest(GuestValidationError::InvalidEmail) => "invalid_email",
            Self::Guest(_) => "missing_guest_info",
            Self::InvalidTicketCount(_) => "invalid_ticket_count",
            Self::PaymentMethod(_) => "invalid_payment_method",
            Self::Identifier(_) => "invalid_identifier",
        }
    }

    fn field(&self) -> &'static str {
        match self {
            Self::AmbiguousTarget => "site_id",
            Self::Guest(GuestValidationError::MissingName) => "name",
            Self::Guest(_) => "email",
            Self::InvalidTicketCount(_) => "no_of_tickets",
            Self::PaymentMethod(_) => "payment_method",
            Self::Identifier(err) => err.kind(),
        }
    }
}

impl From<BookingValidationError> for Error {
    fn from(value: BookingValidationError) -> Self {
        Error::invalid_request(value.to_string()).with_details(json!({
            "field": value.field(),
            "code": value.code(),
        }))
    }
}

/// Raw booking fields as submitted by an inbound adapter.
///
/// `visitor_id` is the identity the adapter resolved (session first, then an
/// explicit body field); guest fields are only consulted when it is absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct BookingRequestParts<'a> {
    pub visitor_id: Option<i64>,
    pub name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub site_id: Option<i64>,
    pub event_id: Option<i64>,
    pub no_of_tickets: Option<i64>,
    pub payment_method: Option<&'a str>,
}

impl BookingRequestParts<'_> {
    /// The single site or event these fields point at.
    pub fn target(&self) -> Result<BookingTarget, BookingValidationError> {
        let site_id = self.site_id.map(SiteId::new).transpose()?;
        let event_id = self.event_id.map(EventId::new).transpose()?;
        BookingTarget::from_optional(site_id, event_id)
    }
}

/// Fully validated command to create a booking and its initial payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBookingRequest {
    pub visitor: VisitorRef,
    pub target: BookingTarget,
    pub tickets: TicketCount,
    pub method: PaymentMethod,
    pub settlement: Settlement,
}

impl CreateBookingRequest {
    /// Validate raw fields in the order callers see failures: target, visitor,
    /// ticket count, then payment method. Target existence needs the store,
    /// so [`crate::domain::BookingCommandService`] checks it before reporting
    /// an unknown method.
    ///
    /// # Examples
    /// ```
    /// use heritage_backend::domain::{
    ///     BookingRequestParts, BookingTarget, CreateBookingRequest, PaymentMethodSet, Settlement,
    /// };
    ///
    /// let parts = BookingRequestParts {
    ///     visitor_id: Some(7),
    ///     event_id: Some(3),
    ///     no_of_tickets: Some(2),
    ///     ..BookingRequestParts::default()
    /// };
    /// let request = CreateBookingRequest::try_from_parts(
    ///     parts,
    ///     &PaymentMethodSet::fallback(),
    ///     Settlement::Deferred,
    /// )
    /// .expect("valid request");
    /// assert!(matches!(request.target, BookingTarget::Event(_)));
    /// assert_eq!(request.method.as_str(), "bkash");
    /// ```
    pub fn try_from_parts(
        parts: BookingRequestParts<'_>,
        methods: &PaymentMethodSet,
        settlement: Settlement,
    ) -> Result<Self, BookingValidationError> {
        let target = parts.target()?;

        let visitor = match parts.visitor_id {
            Some(raw) => VisitorRef::Known(VisitorId::new(raw)?),
            None => VisitorRef::Guest(GuestContact::try_from_parts(
                parts.name,
                parts.email,
                parts.phone,
            )?),
        };

        let tickets = parts
            .no_of_tickets
            .map(TicketCount::new)
            .transpose()?
            .unwrap_or_default();
        let method = methods.resolve(parts.payment_method)?;

        Ok(Self {
            visitor,
            target,
            tickets,
            method,
            settlement,
        })
    }
}

/// Result of a committed booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingConfirmation {
    pub booking_id: BookingId,
    pub payment_id: PaymentId,
    pub visitor_id: VisitorId,
    pub amount: Money,
    pub payment_status: BookingPaymentStatus,
    pub payment_state: PaymentState,
    /// The guest visitor row was inserted by this booking rather than found
    /// by email.
    pub visitor_created: bool,
}

/// Command recording a payment attempt against an existing booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPaymentRequest {
    pub booking_id: BookingId,
    pub method: PaymentMethod,
    pub outcome: PaymentOutcome,
    /// Session visitor making the attempt; `None` for anonymous form posts.
    pub payer: Option<VisitorId>,
}

/// Result of a payment attempt or refund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentReceipt {
    pub booking_id: BookingId,
    pub payment_id: PaymentId,
    pub amount: Money,
    pub method: String,
    pub payment_state: PaymentState,
    pub booking_status: BookingPaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
}

/// A booking read back for confirmation and status pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingReceipt {
    pub booking_id: BookingId,
    pub visitor_id: VisitorId,
    pub target: BookingTarget,
    pub tickets: TicketCount,
    pub booked_ticket_price: Money,
    pub payment_status: BookingPaymentStatus,
    pub booking_date: DateTime<Utc>,
    pub payment: Option<PaymentRecord>,
}

/// Seat accounting for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventAvailability {
    pub event_id: EventId,
    pub capacity: u32,
    pub booked: u32,
    pub remaining: u32,
}

impl EventAvailability {
    pub fn new(event_id: EventId, capacity: u32, booked: u32) -> Self {
        Self {
            event_id,
            capacity,
            booked,
            remaining: capacity.saturating_sub(booked),
        }
    }

    /// Whether `tickets` more seats fit.
    pub fn admits(&self, tickets: TicketCount) -> bool {
        tickets.get() <= self.remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn methods() -> PaymentMethodSet {
        PaymentMethodSet::fallback()
    }

    fn guest_parts<'a>() -> BookingRequestParts<'a> {
        BookingRequestParts {
            name: Some("Rahim"),
            email: Some("rahim@example.com"),
            site_id: Some(1),
            ..BookingRequestParts::default()
        }
    }

    #[rstest]
    #[case(Some(1), Some(2))]
    #[case(None, None)]
    fn ambiguous_targets_are_rejected(
        methods: PaymentMethodSet,
        #[case] site_id: Option<i64>,
        #[case] event_id: Option<i64>,
    ) {
        let parts = BookingRequestParts {
            site_id,
            event_id,
            ..guest_parts()
        };
        let err = CreateBookingRequest::try_from_parts(parts, &methods, Settlement::Deferred)
            .expect_err("ambiguous target");
        assert_eq!(err, BookingValidationError::AmbiguousTarget);
        assert_eq!(err.code(), "ambiguous_target");
    }

    #[rstest]
    fn guests_need_name_and_email(methods: PaymentMethodSet) {
        let parts = BookingRequestParts {
            name: None,
            ..guest_parts()
        };
        let err = CreateBookingRequest::try_from_parts(parts, &methods, Settlement::Deferred)
            .expect_err("missing guest name");
        assert_eq!(err.code(), "missing_guest_info");
    }

    #[rstest]
    fn known_visitor_skips_guest_fields(methods: PaymentMethodSet) {
        let parts = BookingRequestParts {
            visitor_id: Some(9),
            name: None,
            email: None,
            ..guest_parts()
        };
        let request = CreateBookingRequest::try_from_parts(parts, &methods, Settlement::Immediate)
            .expect("valid request");
        assert_eq!(
            request.visitor,
            VisitorRef::Known(VisitorId::new(9).expect("positive"))
        );
        assert_eq!(request.settlement, Settlement::Immediate);
    }

    #[rstest]
    #[case(0)]
    #[case(-4)]
    #[case(i64::from(u32::MAX) + 1)]
    fn ticket_counts_must_be_positive(methods: PaymentMethodSet, #[case] tickets: i64) {
        let parts = BookingRequestParts {
            no_of_tickets: Some(tickets),
            ..guest_parts()
        };
        let err = CreateBookingRequest::try_from_parts(parts, &methods, Settlement::Deferred)
            .expect_err("invalid count");
        assert_eq!(err, BookingValidationError::InvalidTicketCount(tickets));
    }

    #[rstest]
    fn missing_ticket_count_defaults_to_one(methods: PaymentMethodSet) {
        let request =
            CreateBookingRequest::try_from_parts(guest_parts(), &methods, Settlement::Deferred)
                .expect("valid request");
        assert_eq!(request.tickets, TicketCount::ONE);
    }

    #[rstest]
    fn unknown_payment_method_is_rejected(methods: PaymentMethodSet) {
        let parts = BookingRequestParts {
            payment_method: Some("cheque"),
            ..guest_parts()
        };
        let err = CreateBookingRequest::try_from_parts(parts, &methods, Settlement::Deferred)
            .expect_err("unknown method");
        assert_eq!(err.code(), "invalid_payment_method");
    }

    #[rstest]
    fn negative_identifiers_are_rejected(methods: PaymentMethodSet) {
        let parts = BookingRequestParts {
            site_id: Some(-1),
            ..guest_parts()
        };
        let err = CreateBookingRequest::try_from_parts(parts, &methods, Settlement::Deferred)
            .expect_err("negative id");
        assert_eq!(err.code(), "invalid_identifier");
    }

    #[rstest]
    fn validation_errors_become_invalid_requests() {
        let error = Error::from(BookingValidationError::AmbiguousTarget);
        assert_eq!(error.code(), crate::domain::ErrorCode::InvalidRequest);
        assert_eq!(error.detail_code(), Some("ambiguous_target"));
    }

    #[rstest]
    #[case(PaymentState::Initiated, BookingPaymentStatus::Pending)]
    #[case(PaymentState::Failed, BookingPaymentStatus::Pending)]
    #[case(PaymentState::Successful, BookingPaymentStatus::Paid)]
    #[case(PaymentState::Refunded, BookingPaymentStatus::Refunded)]
    fn booking_status_follows_payment(
        #[case] state: PaymentState,
        #[case] expected: BookingPaymentStatus,
    ) {
        assert_eq!(BookingPaymentStatus::for_payment(state), expected);
    }

    #[rstest]
    fn availability_never_underflows() {
        let event = EventId::new(1).expect("positive");
        let availability = EventAvailability::new(event, 10, 12);
        assert_eq!(availability.remaining, 0);
        assert!(!availability.admits(TicketCount::ONE));
    }

    #[rstest]
    fn target_serialises_with_kind() {
        let target = BookingTarget::Event(EventId::new(4).expect("positive"));
        assert_eq!(
            serde_json::to_value(target).expect("serialise"),
            json!({ "kind": "event", "id": 4 })
        );
    }
}
