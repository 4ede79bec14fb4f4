//! PostgreSQL-backed `BookingRepository` using Diesel.
//!
//! Each mutating operation runs inside one database transaction. Event
//! bookings take a `FOR UPDATE` lock on the event row before summing booked
//! tickets, so concurrent requests for the same event queue behind each other
//! and the capacity check always sees every committed booking. Payment
//! attempts and refunds lock the booking row the same way.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{
    BookingRepository, BookingRepositoryError, NewBooking, PaymentAttempt,
};
use crate::domain::{
    BookingConfirmation, BookingId, BookingPaymentStatus, BookingReceipt, BookingTarget,
    EventAvailability, EventId, GuestPasswordPlaceholder, Money, PaymentId, PaymentOutcome,
    PaymentReceipt, PaymentRecord, PaymentState, SiteId, TicketCount, VisitorId, VisitorRef,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{
    BookingRow, EventSeatsRow, NewBookingRow, NewPaymentRow, NewVisitorRow, PaymentAttemptUpdate,
    PaymentRow,
};
use super::pool::{DbPool, PoolError};
use super::schema::{bookings, events, heritage_sites, payments, visitors};

/// Diesel-backed implementation of the booking repository port.
#[derive(Clone)]
pub struct DieselBookingRepository {
    pool: DbPool,
}

impl DieselBookingRepository {
    /// Create a repository over the shared pool.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use heritage_backend::outbound::persistence::{DbPool, DieselBookingRepository, PoolConfig};
    ///
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    /// let pool = DbPool::new(PoolConfig::new("postgres://localhost/heritage")).await?;
    /// let repository = DieselBookingRepository::new(pool);
    /// # let _ = repository;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Failure inside a booking transaction.
///
/// `Rejected` carries a business rule violation; returning it from the
/// transaction closure rolls back every statement issued so far.
#[derive(Debug)]
enum TxError {
    Diesel(diesel::result::Error),
    Rejected(BookingRepositoryError),
}

impl From<diesel::result::Error> for TxError {
    fn from(value: diesel::result::Error) -> Self {
        Self::Diesel(value)
    }
}

impl From<BookingRepositoryError> for TxError {
    fn from(value: BookingRepositoryError) -> Self {
        Self::Rejected(value)
    }
}

fn map_pool_error(error: PoolError) -> BookingRepositoryError {
    map_basic_pool_error(error, BookingRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> BookingRepositoryError {
    map_basic_diesel_error(
        error,
        BookingRepositoryError::query,
        BookingRepositoryError::connection,
    )
}

fn map_tx_error(error: TxError) -> BookingRepositoryError {
    match error {
        TxError::Diesel(err) => map_diesel_error(err),
        TxError::Rejected(err) => err,
    }
}

fn corrupt_row(message: impl std::fmt::Display) -> BookingRepositoryError {
    BookingRepositoryError::query(format!("stored row is invalid: {message}"))
}

fn seats_from_db(value: i64, column: &str) -> Result<u32, BookingRepositoryError> {
    u32::try_from(value).map_err(|_| corrupt_row(format!("{column} = {value}")))
}

fn money_from_db(minor: i64) -> Result<Money, BookingRepositoryError> {
    Money::from_minor(minor).map_err(corrupt_row)
}

fn tickets_to_db(tickets: TicketCount) -> Result<i32, BookingRepositoryError> {
    i32::try_from(tickets.get())
        .map_err(|_| BookingRepositoryError::invalid_amount("ticket count too large"))
}

async fn resolve_visitor(
    conn: &mut AsyncPgConnection,
    visitor: &VisitorRef,
    guest_password: &GuestPasswordPlaceholder,
    now: DateTime<Utc>,
) -> Result<(i64, bool), TxError> {
    match visitor {
        VisitorRef::Known(visitor_id) => visitors::table
            .find(visitor_id.get())
            .select(visitors::visitor_id)
            .first::<i64>(conn)
            .await
            .optional()?
            .map(|id| (id, false))
            .ok_or_else(|| BookingRepositoryError::visitor_not_found(visitor_id.get()).into()),
        VisitorRef::Guest(guest) => {
            let email = guest.email().as_str();
            let inserted = diesel::insert_into(visitors::table)
                .values(NewVisitorRow {
                    name: guest.name(),
                    email,
                    phone: guest.phone(),
                    password_hash: guest_password.as_str(),
                    created_at: now,
                })
                .on_conflict(visitors::email)
                .do_nothing()
                .execute(conn)
                .await?;
            let created = inserted == 1;
            debug!(created, "guest visitor resolved");

            let visitor_id = visitors::table
                .filter(visitors::email.eq(email))
                .select(visitors::visitor_id)
                .first::<i64>(conn)
                .await?;
            Ok((visitor_id, created))
        }
    }
}

/// Read the unit price of the target, enforcing capacity for events.
async fn price_target(
    conn: &mut AsyncPgConnection,
    target: BookingTarget,
    tickets: TicketCount,
) -> Result<Money, TxError> {
    let unit_price_minor = match target {
        BookingTarget::Site(site_id) => heritage_sites::table
            .find(site_id.get())
            .select(heritage_sites::ticket_price_minor)
            .first::<i64>(conn)
            .await
            .optional()?
            .ok_or_else(|| BookingRepositoryError::target_not_found(target.to_string()))?,
        BookingTarget::Event(event_id) => {
            let seats = events::table
                .find(event_id.get())
                .select((events::capacity, events::ticket_price_minor))
                .for_update()
                .first::<EventSeatsRow>(conn)
                .await
                .optional()?
                .ok_or_else(|| BookingRepositoryError::target_not_found(target.to_string()))?;

            let availability = load_availability(conn, event_id, seats.capacity).await?;
            if !availability.admits(tickets) {
                return Err(BookingRepositoryError::capacity_exceeded(
                    availability.remaining,
                    tickets.get(),
                )
                .into());
            }
            seats.ticket_price_minor
        }
    };

    let unit_price = money_from_db(unit_price_minor)?;
    unit_price
        .checked_times(tickets.get())
        .map_err(|err| BookingRepositoryError::invalid_amount(err.to_string()).into())
}

async fn load_availability(
    conn: &mut AsyncPgConnection,
    event_id: EventId,
    capacity: i32,
) -> Result<EventAvailability, TxError> {
    let booked: Option<i64> = bookings::table
        .filter(bookings::event_id.eq(event_id.get()))
        .select(diesel::dsl::sum(bookings::no_of_tickets))
        .first(conn)
        .await?;
    let capacity = seats_from_db(i64::from(capacity), "events.capacity")?;
    let booked = seats_from_db(booked.unwrap_or(0), "SUM(bookings.no_of_tickets)")?;
    Ok(EventAvailability::new(event_id, capacity, booked))
}

async fn lock_booking(
    conn: &mut AsyncPgConnection,
    booking_id: BookingId,
) -> Result<BookingRow, TxError> {
    bookings::table
        .find(booking_id.get())
        .select(BookingRow::as_select())
        .for_update()
        .first::<BookingRow>(conn)
        .await
        .optional()?
        .ok_or_else(|| BookingRepositoryError::booking_not_found(booking_id.get()).into())
}

fn booking_status(row: &BookingRow) -> Result<BookingPaymentStatus, BookingRepositoryError> {
    row.payment_status.parse().map_err(corrupt_row)
}

fn row_to_payment(row: PaymentRow) -> Result<PaymentRecord, BookingRepositoryError> {
    Ok(PaymentRecord {
        payment_id: PaymentId::new(row.payment_id).map_err(corrupt_row)?,
        booking_id: BookingId::new(row.booking_id).map_err(corrupt_row)?,
        amount: money_from_db(row.amount_minor)?,
        method: row.method,
        status: row.status.parse().map_err(corrupt_row)?,
        paid_at: row.paid_at,
    })
}

fn row_to_receipt(
    row: BookingRow,
    payment: Option<PaymentRow>,
) -> Result<BookingReceipt, BookingRepositoryError> {
    let payment_status = booking_status(&row)?;
    let site_id = row.site_id.map(SiteId::new).transpose().map_err(corrupt_row)?;
    let event_id = row.event_id.map(EventId::new).transpose().map_err(corrupt_row)?;
    let target = BookingTarget::from_optional(site_id, event_id).map_err(corrupt_row)?;

    Ok(BookingReceipt {
        booking_id: BookingId::new(row.booking_id).map_err(corrupt_row)?,
        visitor_id: VisitorId::new(row.visitor_id).map_err(corrupt_row)?,
        target,
        tickets: TicketCount::new(i64::from(row.no_of_tickets)).map_err(corrupt_row)?,
        booked_ticket_price: money_from_db(row.booked_ticket_price_minor)?,
        payment_status,
        booking_date: row.booking_date,
        payment: payment.map(row_to_payment).transpose()?,
    })
}

fn receipt_from_payment(
    payment: PaymentRecord,
    booking_status: BookingPaymentStatus,
) -> PaymentReceipt {
    PaymentReceipt {
        booking_id: payment.booking_id,
        payment_id: payment.payment_id,
        amount: payment.amount,
        method: payment.method,
        payment_state: payment.status,
        booking_status,
        paid_at: payment.paid_at,
    }
}

async fn set_booking_status(
    conn: &mut AsyncPgConnection,
    booking_id: i64,
    status: BookingPaymentStatus,
) -> Result<(), TxError> {
    diesel::update(bookings::table.find(booking_id))
        .set(bookings::payment_status.eq(status.as_str()))
        .execute(conn)
        .await?;
    Ok(())
}

#[async_trait]
impl BookingRepository for DieselBookingRepository {
    async fn create_booking(
        &self,
        booking: &NewBooking,
    ) -> Result<BookingConfirmation, BookingRepositoryError> {
        let NewBooking {
            request,
            guest_password,
            booked_at,
        } = booking;
        let booked_at = *booked_at;
        let tickets = tickets_to_db(request.tickets)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, TxError, _>(|conn| {
            async move {
                let (visitor_id, visitor_created) =
                    resolve_visitor(conn, &request.visitor, guest_password, booked_at).await?;
                let locked_price = price_target(conn, request.target, request.tickets).await?;

                let (site_id, event_id) = match request.target {
                    BookingTarget::Site(site) => (Some(site.get()), None),
                    BookingTarget::Event(event) => (None, Some(event.get())),
                };
                let booking_id: i64 = diesel::insert_into(bookings::table)
                    .values(NewBookingRow {
                        visitor_id,
                        site_id,
                        event_id,
                        no_of_tickets: tickets,
                        booked_ticket_price_minor: locked_price.minor(),
                        payment_status: BookingPaymentStatus::Pending.as_str(),
                        booking_date: booked_at,
                    })
                    .returning(bookings::booking_id)
                    .get_result(conn)
                    .await?;

                let payment_state = request.settlement.initial_state();
                let paid_at = (payment_state == PaymentState::Successful).then_some(booked_at);
                let payment_id: i64 = diesel::insert_into(payments::table)
                    .values(NewPaymentRow {
                        booking_id,
                        amount_minor: locked_price.minor(),
                        method: request.method.as_str(),
                        status: payment_state.as_str(),
                        paid_at,
                        created_at: booked_at,
                    })
                    .returning(payments::payment_id)
                    .get_result(conn)
                    .await?;

                let payment_status = BookingPaymentStatus::for_payment(payment_state);
                if payment_status != BookingPaymentStatus::Pending {
                    set_booking_status(conn, booking_id, payment_status).await?;
                }

                Ok(BookingConfirmation {
                    booking_id: BookingId::new(booking_id).map_err(corrupt_row)?,
                    payment_id: PaymentId::new(payment_id).map_err(corrupt_row)?,
                    visitor_id: VisitorId::new(visitor_id).map_err(corrupt_row)?,
                    amount: locked_price,
                    payment_status,
                    payment_state,
                    visitor_created,
                })
            }
            .scope_boxed()
        })
        .await
        .map_err(map_tx_error)
    }

    async fn record_payment(
        &self,
        attempt: &PaymentAttempt,
    ) -> Result<PaymentReceipt, BookingRepositoryError> {
        let PaymentAttempt {
            request,
            attempted_at,
        } = attempt;
        let attempted_at = *attempted_at;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, TxError, _>(|conn| {
            async move {
                let booking = lock_booking(conn, request.booking_id).await?;
                if request
                    .payer
                    .is_some_and(|payer| payer.get() != booking.visitor_id)
                {
                    return Err(BookingRepositoryError::payer_mismatch().into());
                }
                match booking_status(&booking)? {
                    BookingPaymentStatus::Paid => {
                        return Err(BookingRepositoryError::already_paid().into());
                    }
                    BookingPaymentStatus::Refunded => {
                        return Err(BookingRepositoryError::invalid_state("refunded").into());
                    }
                    BookingPaymentStatus::Pending | BookingPaymentStatus::Failed => {}
                }

                let amount = money_from_db(booking.booked_ticket_price_minor)?;
                if !amount.is_positive() {
                    return Err(BookingRepositoryError::invalid_amount(format!(
                        "charge of {amount} must be greater than zero"
                    ))
                    .into());
                }

                let state = PaymentState::from(request.outcome);
                let paid_at = (request.outcome == PaymentOutcome::Successful).then_some(attempted_at);
                let existing = payments::table
                    .filter(payments::booking_id.eq(booking.booking_id))
                    .select(PaymentRow::as_select())
                    .first::<PaymentRow>(conn)
                    .await
                    .optional()?;

                let payment_id: i64 = match existing {
                    Some(row) => {
                        let current: PaymentState = row.status.parse().map_err(corrupt_row)?;
                        if !current.can_transition_to(state) {
                            return Err(BookingRepositoryError::invalid_state(format!(
                                "payment {current}"
                            ))
                            .into());
                        }
                        diesel::update(payments::table.find(row.payment_id))
                            .set(PaymentAttemptUpdate {
                                amount_minor: amount.minor(),
                                method: request.method.as_str(),
                                status: state.as_str(),
                                paid_at,
                            })
                            .returning(payments::payment_id)
                            .get_result(conn)
                            .await?
                    }
                    None => {
                        diesel::insert_into(payments::table)
                            .values(NewPaymentRow {
                                booking_id: booking.booking_id,
                                amount_minor: amount.minor(),
                                method: request.method.as_str(),
                                status: state.as_str(),
                                paid_at,
                                created_at: attempted_at,
                            })
                            .returning(payments::payment_id)
                            .get_result(conn)
                            .await?
                    }
                };

                let booking_status = BookingPaymentStatus::for_payment(state);
                set_booking_status(conn, booking.booking_id, booking_status).await?;

                Ok(PaymentReceipt {
                    booking_id: request.booking_id,
                    payment_id: PaymentId::new(payment_id).map_err(corrupt_row)?,
                    amount,
                    method: request.method.to_string(),
                    payment_state: state,
                    booking_status,
                    paid_at,
                })
            }
            .scope_boxed()
        })
        .await
        .map_err(map_tx_error)
    }

    async fn refund_booking(
        &self,
        booking_id: BookingId,
    ) -> Result<PaymentReceipt, BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, TxError, _>(|conn| {
            async move {
                let booking = lock_booking(conn, booking_id).await?;
                let status = booking_status(&booking)?;
                if status != BookingPaymentStatus::Paid {
                    return Err(BookingRepositoryError::invalid_state(status.as_str()).into());
                }

                let payment = payments::table
                    .filter(payments::booking_id.eq(booking.booking_id))
                    .select(PaymentRow::as_select())
                    .first::<PaymentRow>(conn)
                    .await
                    .optional()?
                    .ok_or_else(|| BookingRepositoryError::invalid_state("paid without payment"))
                    .and_then(row_to_payment)?;
                if !payment.status.can_transition_to(PaymentState::Refunded) {
                    return Err(BookingRepositoryError::invalid_state(format!(
                        "payment {}",
                        payment.status
                    ))
                    .into());
                }

                diesel::update(payments::table.find(payment.payment_id.get()))
                    .set(payments::status.eq(PaymentState::Refunded.as_str()))
                    .execute(conn)
                    .await?;
                set_booking_status(conn, booking.booking_id, BookingPaymentStatus::Refunded)
                    .await?;

                Ok(receipt_from_payment(
                    PaymentRecord {
                        status: PaymentState::Refunded,
                        ..payment
                    },
                    BookingPaymentStatus::Refunded,
                ))
            }
            .scope_boxed()
        })
        .await
        .map_err(map_tx_error)
    }

    async fn target_exists(&self, target: BookingTarget) -> Result<bool, BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        match target {
            BookingTarget::Site(site_id) => {
                diesel::select(diesel::dsl::exists(heritage_sites::table.find(site_id.get())))
                    .get_result::<bool>(&mut conn)
                    .await
            }
            BookingTarget::Event(event_id) => {
                diesel::select(diesel::dsl::exists(events::table.find(event_id.get())))
                    .get_result::<bool>(&mut conn)
                    .await
            }
        }
        .map_err(map_diesel_error)
    }

    async fn find_booking(
        &self,
        booking_id: BookingId,
    ) -> Result<Option<BookingReceipt>, BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let Some(row) = bookings::table
            .find(booking_id.get())
            .select(BookingRow::as_select())
            .first::<BookingRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
        else {
            return Ok(None);
        };

        let payment = payments::table
            .filter(payments::booking_id.eq(row.booking_id))
            .select(PaymentRow::as_select())
            .first::<PaymentRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row_to_receipt(row, payment).map(Some)
    }

    async fn list_bookings_for_visitor(
        &self,
        visitor_id: VisitorId,
    ) -> Result<Vec<BookingReceipt>, BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<BookingRow> = bookings::table
            .filter(bookings::visitor_id.eq(visitor_id.get()))
            .order((bookings::booking_date.desc(), bookings::booking_id.desc()))
            .select(BookingRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let ids: Vec<i64> = rows.iter().map(|row| row.booking_id).collect();
        let mut payments_by_booking: HashMap<i64, PaymentRow> = payments::table
            .filter(payments::booking_id.eq_any(ids))
            .select(PaymentRow::as_select())
            .load::<PaymentRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?
            .into_iter()
            .map(|payment| (payment.booking_id, payment))
            .collect();

        rows.into_iter()
            .map(|row| {
                let payment = payments_by_booking.remove(&row.booking_id);
                row_to_receipt(row, payment)
            })
            .collect()
    }

    async fn event_availability(
        &self,
        event_id: EventId,
    ) -> Result<Option<EventAvailability>, BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let Some(capacity) = events::table
            .find(event_id.get())
            .select(events::capacity)
            .first::<i32>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
        else {
            return Ok(None);
        };

        load_availability(&mut conn, event_id, capacity)
            .await
            .map(Some)
            .map_err(map_tx_error)
    }
}
