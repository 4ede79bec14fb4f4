//! Payment methods and the payment state machine.
//!
//! A booking owns at most one payment row. Its [`PaymentState`] moves
//! `initiated -> successful | failed`, a failed attempt may be retried, and
//! only a successful payment can be refunded.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{BookingId, Money, PaymentId};

/// Methods accepted when neither the database nor configuration provide any.
pub const FALLBACK_PAYMENT_METHODS: [&str; 5] = ["bkash", "nagad", "rocket", "card", "bank_transfer"];

/// Longest code the `payments.method` column stores.
pub const MAX_PAYMENT_METHOD_LEN: usize = 32;

/// Validation failure for a requested payment method.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentMethodError {
    #[error("payment method must not be empty")]
    Empty,
    #[error("payment method `{0}` is not accepted")]
    NotAccepted(String),
    #[error("payment method list must contain at least one entry")]
    EmptySet,
    #[error("payment method `{0}` exceeds {max} characters", max = MAX_PAYMENT_METHOD_LEN)]
    TooLong(String),
}

/// A normalised payment method code such as `bkash`.
///
/// Only a [`PaymentMethodSet`] hands these out, so every value is a member of
/// the active catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PaymentMethod(Arc<str>);

impl PaymentMethod {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn normalise(raw: &str) -> String {
        raw.trim().to_lowercase()
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the active payment method catalogue was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethodOrigin {
    Database,
    Configuration,
    Fallback,
}

impl fmt::Display for PaymentMethodOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Database => "database",
            Self::Configuration => "configuration",
            Self::Fallback => "fallback",
        })
    }
}

/// Ordered, de-duplicated set of accepted payment methods.
///
/// The first member is the default used when a request omits the method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentMethodSet {
    default: PaymentMethod,
    methods: Vec<PaymentMethod>,
    origin: PaymentMethodOrigin,
}

impl PaymentMethodSet {
    /// Build a set from raw codes, preserving first-seen order.
    pub fn from_codes<I, S>(codes: I, origin: PaymentMethodOrigin) -> Result<Self, PaymentMethodError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut methods: Vec<PaymentMethod> = Vec::new();
        for code in codes {
            let normalised = PaymentMethod::normalise(code.as_ref());
            if normalised.is_empty() || methods.iter().any(|m| m.as_str() == normalised) {
                continue;
            }
            if normalised.chars().count() > MAX_PAYMENT_METHOD_LEN {
                return Err(PaymentMethodError::TooLong(normalised));
            }
            methods.push(PaymentMethod(Arc::from(normalised)));
        }
        let default = methods.first().cloned().ok_or(PaymentMethodError::EmptySet)?;
        Ok(Self {
            default,
            methods,
            origin,
        })
    }

    /// Parse a comma separated list such as `"bkash, card"`.
    pub fn parse_list(list: &str, origin: PaymentMethodOrigin) -> Result<Self, PaymentMethodError> {
        Self::from_codes(list.split(','), origin)
    }

    /// The documented static catalogue.
    ///
    /// # Examples
    /// ```
    /// use heritage_backend::domain::PaymentMethodSet;
    ///
    /// let set = PaymentMethodSet::fallback();
    /// assert_eq!(set.default_method().as_str(), "bkash");
    /// assert!(set.resolve(Some(" Card ")).is_ok());
    /// ```
    pub fn fallback() -> Self {
        let methods: Vec<PaymentMethod> = FALLBACK_PAYMENT_METHODS
            .iter()
            .map(|code| PaymentMethod(Arc::from(*code)))
            .collect();
        Self {
            default: PaymentMethod(Arc::from(FALLBACK_PAYMENT_METHODS[0])),
            methods,
            origin: PaymentMethodOrigin::Fallback,
        }
    }

    pub fn origin(&self) -> PaymentMethodOrigin {
        self.origin
    }

    pub fn default_method(&self) -> &PaymentMethod {
        &self.default
    }

    pub fn iter(&self) -> impl Iterator<Item = &PaymentMethod> {
        self.methods.iter()
    }

    /// Validate a requested method.
    ///
    /// `None` selects the default; blank strings are treated as absent the
    /// same way HTML forms submit an untouched select.
    pub fn resolve(&self, requested: Option<&str>) -> Result<PaymentMethod, PaymentMethodError> {
        let Some(raw) = requested.filter(|value| !value.trim().is_empty()) else {
            return Ok(self.default_method().clone());
        };
        self.require(raw)
    }

    /// Validate a method that must be present.
    pub fn require(&self, raw: &str) -> Result<PaymentMethod, PaymentMethodError> {
        let normalised = PaymentMethod::normalise(raw);
        if normalised.is_empty() {
            return Err(PaymentMethodError::Empty);
        }
        self.methods
            .iter()
            .find(|method| method.as_str() == normalised)
            .cloned()
            .ok_or(PaymentMethodError::NotAccepted(normalised))
    }
}

/// Lifecycle state of a payment row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Initiated,
    Successful,
    Failed,
    Refunded,
}

/// Failure parsing a stored payment or booking status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status `{0}`")]
pub struct UnknownStatus(pub String);

impl PaymentState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initiated => "initiated",
            Self::Successful => "successful",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Initiated, Self::Successful)
                | (Self::Initiated, Self::Failed)
                | (Self::Failed, Self::Successful)
                | (Self::Failed, Self::Failed)
                | (Self::Successful, Self::Refunded)
        )
    }
}

impl fmt::Display for PaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentState {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initiated" => Ok(Self::Initiated),
            "successful" => Ok(Self::Successful),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

/// Result reported by the payment channel for a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Successful,
    Failed,
}

impl From<PaymentOutcome> for PaymentState {
    fn from(value: PaymentOutcome) -> Self {
        match value {
            PaymentOutcome::Successful => Self::Successful,
            PaymentOutcome::Failed => Self::Failed,
        }
    }
}

/// How the initial payment row is seeded when a booking is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Payment starts `initiated`; the visitor pays in a second step.
    Deferred,
    /// Demo convenience: the payment is recorded `successful` immediately and
    /// the booking is marked paid in the same transaction.
    Immediate,
}

impl Settlement {
    pub fn initial_state(self) -> PaymentState {
        match self {
            Self::Deferred => PaymentState::Initiated,
            Self::Immediate => PaymentState::Successful,
        }
    }
}

/// A stored payment row as seen by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRecord {
    pub payment_id: PaymentId,
    pub booking_id: BookingId,
    pub amount: Money,
    pub method: String,
    pub status: PaymentState,
    pub paid_at: Option<DateTime<Utc>>,
}
