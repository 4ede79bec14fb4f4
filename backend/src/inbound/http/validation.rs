//! Shared validation helpers for inbound HTTP adapters.

use serde_json::json;

use crate::domain::{Error, IdValidationError};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidIdentifier,
    InvalidInteger,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidIdentifier => "invalid_identifier",
            ErrorCode::InvalidInteger => "invalid_integer",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

pub(crate) const BOOKING_ID: FieldName = FieldName::new("booking_id");
pub(crate) const EVENT_ID: FieldName = FieldName::new("event_id");
pub(crate) const SITE_ID: FieldName = FieldName::new("site_id");
pub(crate) const VISITOR_ID: FieldName = FieldName::new("visitor_id");
pub(crate) const NO_OF_TICKETS: FieldName = FieldName::new("no_of_tickets");

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let field = field.as_str();
    Error::invalid_request(format!("missing required field: {field}")).with_details(json!({
        "field": field,
        "code": ErrorCode::MissingField.as_str(),
    }))
}

/// Convert a raw path or form value into a positive identifier.
pub(crate) fn parse_id<T>(raw: i64, field: FieldName) -> Result<T, Error>
where
    T: TryFrom<i64, Error = IdValidationError>,
{
    T::try_from(raw).map_err(|err| {
        let field = field.as_str();
        Error::invalid_request(format!("{field} must be a positive integer")).with_details(json!({
            "field": field,
            "value": err.value(),
            "code": ErrorCode::InvalidIdentifier.as_str(),
        }))
    })
}

/// Like [`parse_id`] but reports an absent value as a missing field.
pub(crate) fn require_id<T>(raw: Option<i64>, field: FieldName) -> Result<T, Error>
where
    T: TryFrom<i64, Error = IdValidationError>,
{
    raw.ok_or_else(|| missing_field_error(field))
        .and_then(|value| parse_id(value, field))
}

/// Parse an optional form value. HTML forms submit untouched inputs as
/// empty strings, which count as absent.
pub(crate) fn parse_optional_integer(
    raw: Option<&str>,
    field: FieldName,
) -> Result<Option<i64>, Error> {
    let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    value.parse::<i64>().map(Some).map_err(|_| {
        let field = field.as_str();
        Error::invalid_request(format!("{field} must be an integer")).with_details(json!({
            "field": field,
            "value": value,
            "code": ErrorCode::InvalidInteger.as_str(),
        }))
    })
}
