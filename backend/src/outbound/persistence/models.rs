//! Internal Diesel row structs for the booking schema.
//!
//! These types never leave the persistence layer; repositories convert them
//! into validated domain values.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::{bookings, payments, visitors};

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = visitors)]
pub(crate) struct NewVisitorRow<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub password_hash: &'a str,
    pub created_at: DateTime<Utc>,
}

/// Capacity and price of an event, read under a row lock.
#[derive(Debug, Clone, Copy, Queryable)]
pub(crate) struct EventSeatsRow {
    pub capacity: i32,
    pub ticket_price_minor: i64,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = bookings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BookingRow {
    pub booking_id: i64,
    pub visitor_id: i64,
    pub site_id: Option<i64>,
    pub event_id: Option<i64>,
    pub no_of_tickets: i32,
    pub booked_ticket_price_minor: i64,
    pub payment_status: String,
    pub booking_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bookings)]
pub(crate) struct NewBookingRow<'a> {
    pub visitor_id: i64,
    pub site_id: Option<i64>,
    pub event_id: Option<i64>,
    pub no_of_tickets: i32,
    pub booked_ticket_price_minor: i64,
    pub payment_status: &'a str,
    pub booking_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PaymentRow {
    pub payment_id: i64,
    pub booking_id: i64,
    pub amount_minor: i64,
    pub method: String,
    pub status: String,
    pub paid_at: Option<DateTime<Utc>>,
    #[expect(dead_code, reason = "audit column not surfaced to callers")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = payments)]
pub(crate) struct NewPaymentRow<'a> {
    pub booking_id: i64,
    pub amount_minor: i64,
    pub method: &'a str,
    pub status: &'a str,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Changeset applied when a payment attempt updates the existing row.
///
/// `paid_at` is always written; a failed attempt stores `NULL`.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = payments)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct PaymentAttemptUpdate<'a> {
    pub amount_minor: i64,
    pub method: &'a str,
    pub status: &'a str,
    pub paid_at: Option<DateTime<Utc>>,
}
