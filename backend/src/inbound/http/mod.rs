//! HTTP inbound adapter.
//!
//! Two surfaces share the booking services: a JSON API mounted under
//! `/api/v1` and browser form endpoints at the root.

pub mod booking_form;
pub mod bookings;
pub mod bookings_dto;
pub mod error;
pub mod events;
pub mod health;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;
