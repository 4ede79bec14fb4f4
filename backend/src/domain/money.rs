//! Integer money amounts.
//!
//! Prices are held in minor units (1.00 = 100) so the locked booking price and
//! the payment amount are always exactly `unit_price * tickets`.

use std::fmt;

use serde::{Serialize, Serializer};

/// Minor units per major currency unit.
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;

/// A non-negative amount in minor currency units.
///
/// Serialises as a two-decimal string (`"1500.00"`) to keep JSON clients away
/// from floating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

/// Errors raised while constructing or combining [`Money`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("amount must not be negative (got {0} minor units)")]
    Negative(i64),
    #[error("amount overflowed while multiplying {unit} by {quantity}")]
    Overflow { unit: i64, quantity: u32 },
}

impl Money {
    pub const ZERO: Self = Self(0);

    /// Wrap a minor-unit amount.
    ///
    /// # Examples
    /// ```
    /// use heritage_backend::domain::Money;
    ///
    /// let price = Money::from_minor(150_000).expect("non-negative");
    /// assert_eq!(price.to_string(), "1500.00");
    /// ```
    pub fn from_minor(minor: i64) -> Result<Self, MoneyError> {
        if minor < 0 {
            return Err(MoneyError::Negative(minor));
        }
        Ok(Self(minor))
    }

    #[must_use]
    pub fn minor(self) -> i64 {
        self.0
    }

    #[must_use]
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Multiply a unit price by a ticket quantity, failing on overflow.
    pub fn checked_times(self, quantity: u32) -> Result<Self, MoneyError> {
        self.0
            .checked_mul(i64::from(quantity))
            .map(Self)
            .ok_or(MoneyError::Overflow {
                unit: self.0,
                quantity,
            })
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let major = self.0 / MINOR_UNITS_PER_MAJOR;
        let minor = self.0 % MINOR_UNITS_PER_MAJOR;
        write!(f, "{major}.{minor:02}")
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
