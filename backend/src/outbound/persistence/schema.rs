//! Diesel table definitions for the booking schema.
//!
//! These definitions must match `migrations/` exactly; regenerate them with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Canonical payment method enumeration in display order.
    payment_methods (code) {
        code -> Varchar,
        position -> Int4,
    }
}

diesel::table! {
    /// Registered and guest visitors. `email` is unique and lower-cased.
    visitors (visitor_id) {
        visitor_id -> Int8,
        name -> Varchar,
        email -> Varchar,
        phone -> Nullable<Varchar>,
        nationality -> Nullable<Varchar>,
        /// Real password hash, or a `!guest$` placeholder for guests.
        password_hash -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    heritage_sites (site_id) {
        site_id -> Int8,
        name -> Varchar,
        location -> Varchar,
        ticket_price_minor -> Int8,
    }
}

diesel::table! {
    /// Capacity-limited events, optionally hosted at a site.
    events (event_id) {
        event_id -> Int8,
        site_id -> Nullable<Int8>,
        name -> Varchar,
        event_date -> Date,
        capacity -> Int4,
        ticket_price_minor -> Int8,
    }
}

diesel::table! {
    /// Bookings reference exactly one of `site_id` or `event_id`.
    bookings (booking_id) {
        booking_id -> Int8,
        visitor_id -> Int8,
        site_id -> Nullable<Int8>,
        event_id -> Nullable<Int8>,
        no_of_tickets -> Int4,
        /// Unit price times tickets, locked when the booking was created.
        booked_ticket_price_minor -> Int8,
        payment_status -> Varchar,
        booking_date -> Timestamptz,
    }
}

diesel::table! {
    /// At most one payment row per booking (`UNIQUE (booking_id)`).
    payments (payment_id) {
        payment_id -> Int8,
        booking_id -> Int8,
        amount_minor -> Int8,
        method -> Varchar,
        status -> Varchar,
        paid_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(bookings -> visitors (visitor_id));
diesel::joinable!(events -> heritage_sites (site_id));
diesel::joinable!(payments -> bookings (booking_id));

diesel::allow_tables_to_appear_in_same_query!(
    bookings,
    events,
    heritage_sites,
    payment_methods,
    payments,
    visitors,
);
