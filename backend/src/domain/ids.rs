//! Positive integer identifiers for visitors, targets, bookings and payments.
//!
//! Every identifier is a database `BIGSERIAL`, so the domain only accepts
//! strictly positive values. Adapters parse raw input through
//! [`TryFrom<i64>`] and receive an [`IdValidationError`] otherwise.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation failure raised when a raw identifier is not positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{kind} must be a positive integer (got {value})")]
pub struct IdValidationError {
    kind: &'static str,
    value: i64,
}

impl IdValidationError {
    /// Human-readable name of the identifier that failed validation.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn value(&self) -> i64 {
        self.value
    }
}

macro_rules! positive_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "i64", into = "i64")]
        pub struct $name(i64);

        impl $name {
            /// Validate and wrap a raw identifier.
            pub fn new(value: i64) -> Result<Self, IdValidationError> {
                if value > 0 {
                    Ok(Self(value))
                } else {
                    Err(IdValidationError { kind: $label, value })
                }
            }

            /// Raw database value.
            #[must_use]
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl TryFrom<i64> for $name {
            type Error = IdValidationError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

positive_id!(
    /// Identifier of a registered or guest visitor.
    VisitorId,
    "visitor_id"
);
positive_id!(
    /// Identifier of a heritage site.
    SiteId,
    "site_id"
);
positive_id!(
    /// Identifier of a capacity-limited event.
    EventId,
    "event_id"
);
positive_id!(
    /// Identifier of a booking.
    BookingId,
    "booking_id"
);
positive_id!(PaymentId, "payment_id");
