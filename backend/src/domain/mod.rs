//! Domain primitives, booking services and ports.
//!
//! Purpose: model the booking and payment workflow independently of HTTP and
//! PostgreSQL. Types validate on construction so adapters only ever hand the
//! services well-formed commands.
//!
//! Public surface:
//! - Error / ErrorCode: transport agnostic failure payload.
//! - Identifiers and [`Money`] in integer minor units.
//! - Booking, visitor and payment value types.
//! - [`BookingCommandService`] and [`BookingQueryService`].

pub mod booking;
pub mod booking_service;
pub mod error;
pub mod ids;
pub mod money;
pub mod payment;
pub mod payment_catalogue;
pub mod ports;
pub mod trace_id;
pub mod visitor;

pub use self::booking::{
    BookingConfirmation, BookingPaymentStatus, BookingReceipt, BookingRequestParts,
    BookingTarget, BookingValidationError, CreateBookingRequest, EventAvailability,
    PaymentReceipt, RecordPaymentRequest, TicketCount,
};
pub use self::booking_service::{BookingCommandService, BookingQueryService};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::ids::{BookingId, EventId, IdValidationError, PaymentId, SiteId, VisitorId};
pub use self::money::{Money, MoneyError};
pub use self::payment::{
    FALLBACK_PAYMENT_METHODS, PaymentMethod, PaymentMethodError, PaymentMethodOrigin,
    PaymentMethodSet, PaymentOutcome, PaymentRecord, PaymentState, Settlement, UnknownStatus,
};
pub use self::payment_catalogue::load_payment_methods;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::visitor::{
    Email, GuestContact, GuestPasswordPlaceholder, GuestValidationError, VisitorRef,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use heritage_backend::domain::{ApiResult, Error};
///
/// fn lookup() -> ApiResult<()> {
///     Err(Error::not_found("booking 7 does not exist"))
/// }
/// assert!(lookup().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
