//! Port for the canonical payment method enumeration.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised while reading the payment method catalogue.
    pub enum PaymentMethodSourceError {
        /// Source connection could not be established.
        Connection { message: String } =>
            "payment method source connection failed: {message}",
        /// The catalogue could not be read (for example the table is missing).
        Query { message: String } => "payment method source query failed: {message}",
    }
}

/// Supplies the payment method codes in display order.
///
/// An empty list means the source has no opinion and the caller falls back to
/// configuration or the static catalogue.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentMethodSource: Send + Sync {
    async fn load_codes(&self) -> Result<Vec<String>, PaymentMethodSourceError>;
}

/// Source that never supplies codes.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePaymentMethodSource;

#[async_trait]
impl PaymentMethodSource for FixturePaymentMethodSource {
    async fn load_codes(&self) -> Result<Vec<String>, PaymentMethodSourceError> {
        Ok(Vec::new())
    }
}
