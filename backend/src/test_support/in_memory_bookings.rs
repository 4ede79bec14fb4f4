//! In-memory [`BookingRepository`] with the same transactional guarantees as
//! the Diesel adapter.
//!
//! Each operation runs against a copy of the store under one mutex and only
//! replaces the shared state when it succeeds, so rejected work leaves no
//! trace and concurrent callers are serialised the way the event row lock
//! serialises them in PostgreSQL.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{
    BookingRepository, BookingRepositoryError, NewBooking, PaymentAttempt,
};
use crate::domain::{
    BookingConfirmation, BookingId, BookingPaymentStatus, BookingReceipt, BookingTarget,
    EventAvailability, EventId, IdValidationError, Money, PaymentId, PaymentOutcome,
    PaymentReceipt, PaymentRecord, PaymentState, SiteId, TicketCount, VisitorId, VisitorRef,
};

/// A visitor row as stored by the in-memory repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredVisitor {
    pub visitor_id: VisitorId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
}

#[derive(Debug, Clone, Copy)]
struct StoredEvent {
    capacity: u32,
    price: Money,
}

#[derive(Debug, Clone, Default)]
struct Store {
    next_id: i64,
    visitors: Vec<StoredVisitor>,
    sites: BTreeMap<SiteId, Money>,
    events: BTreeMap<EventId, StoredEvent>,
    bookings: BTreeMap<BookingId, BookingReceipt>,
    unavailable: bool,
}

fn positive<T>(raw: i64) -> T
where
    T: TryFrom<i64, Error = IdValidationError>,
{
    T::try_from(raw).unwrap_or_else(|err| panic!("sequence produced invalid id: {err}"))
}

impl Store {
    fn allocate<T>(&mut self) -> T
    where
        T: TryFrom<i64, Error = IdValidationError>,
    {
        self.next_id += 1;
        positive(self.next_id)
    }

    fn booked_for(&self, event_id: EventId) -> u32 {
        self.bookings
            .values()
            .filter(|booking| booking.target == BookingTarget::Event(event_id))
            .map(|booking| booking.tickets.get())
            .sum()
    }

    fn resolve_visitor(
        &mut self,
        booking: &NewBooking,
    ) -> Result<(VisitorId, bool), BookingRepositoryError> {
        match &booking.request.visitor {
            VisitorRef::Known(visitor_id) => self
                .visitors
                .iter()
                .any(|visitor| visitor.visitor_id == *visitor_id)
                .then_some((*visitor_id, false))
                .ok_or_else(|| BookingRepositoryError::visitor_not_found(visitor_id.get())),
            VisitorRef::Guest(guest) => {
                if let Some(existing) = self
                    .visitors
                    .iter()
                    .find(|visitor| visitor.email == guest.email().as_str())
                {
                    return Ok((existing.visitor_id, false));
                }
                let visitor_id = self.allocate();
                self.visitors.push(StoredVisitor {
                    visitor_id,
                    name: guest.name().to_owned(),
                    email: guest.email().as_str().to_owned(),
                    phone: guest.phone().map(str::to_owned),
                    password_hash: booking.guest_password.as_str().to_owned(),
                });
                Ok((visitor_id, true))
            }
        }
    }

    fn price_target(
        &self,
        target: BookingTarget,
        tickets: TicketCount,
    ) -> Result<Money, BookingRepositoryError> {
        let unit_price = match target {
            BookingTarget::Site(site_id) => self.sites.get(&site_id).copied(),
            BookingTarget::Event(event_id) => match self.events.get(&event_id) {
                Some(event) => {
                    let availability =
                        EventAvailability::new(event_id, event.capacity, self.booked_for(event_id));
                    if !availability.admits(tickets) {
                        return Err(BookingRepositoryError::capacity_exceeded(
                            availability.remaining,
                            tickets.get(),
                        ));
                    }
                    Some(event.price)
                }
                None => None,
            },
        }
        .ok_or_else(|| BookingRepositoryError::target_not_found(target.to_string()))?;

        unit_price
            .checked_times(tickets.get())
            .map_err(|err| BookingRepositoryError::invalid_amount(err.to_string()))
    }

    fn create_booking(
        &mut self,
        booking: &NewBooking,
    ) -> Result<BookingConfirmation, BookingRepositoryError> {
        let request = &booking.request;
        let (visitor_id, visitor_created) = self.resolve_visitor(booking)?;
        let locked_price = self.price_target(request.target, request.tickets)?;

        let booking_id: BookingId = self.allocate();
        let payment_id: PaymentId = self.allocate();
        let payment_state = request.settlement.initial_state();
        let payment_status = BookingPaymentStatus::for_payment(payment_state);
        let paid_at = (payment_state == PaymentState::Successful).then_some(booking.booked_at);

        self.bookings.insert(
            booking_id,
            BookingReceipt {
                booking_id,
                visitor_id,
                target: request.target,
                tickets: request.tickets,
                booked_ticket_price: locked_price,
                payment_status,
                booking_date: booking.booked_at,
                payment: Some(PaymentRecord {
                    payment_id,
                    booking_id,
                    amount: locked_price,
                    method: request.method.to_string(),
                    status: payment_state,
                    paid_at,
                }),
            },
        );

        Ok(BookingConfirmation {
            booking_id,
            payment_id,
            visitor_id,
            amount: locked_price,
            payment_status,
            payment_state,
            visitor_created,
        })
    }

    fn record_payment(
        &mut self,
        attempt: &PaymentAttempt,
    ) -> Result<PaymentReceipt, BookingRepositoryError> {
        let request = &attempt.request;
        let fresh_payment_id: PaymentId = self.allocate();
        let booking = self
            .bookings
            .get_mut(&request.booking_id)
            .ok_or_else(|| BookingRepositoryError::booking_not_found(request.booking_id.get()))?;

        if request
            .payer
            .is_some_and(|payer| payer != booking.visitor_id)
        {
            return Err(BookingRepositoryError::payer_mismatch());
        }
        match booking.payment_status {
            BookingPaymentStatus::Paid => return Err(BookingRepositoryError::already_paid()),
            BookingPaymentStatus::Refunded => {
                return Err(BookingRepositoryError::invalid_state("refunded"));
            }
            BookingPaymentStatus::Pending | BookingPaymentStatus::Failed => {}
        }

        let amount = booking.booked_ticket_price;
        if !amount.is_positive() {
            return Err(BookingRepositoryError::invalid_amount(format!(
                "charge of {amount} must be greater than zero"
            )));
        }

        let state = PaymentState::from(request.outcome);
        let paid_at = (request.outcome == PaymentOutcome::Successful).then_some(attempt.attempted_at);
        let payment_id = match &booking.payment {
            Some(existing) if !existing.status.can_transition_to(state) => {
                return Err(BookingRepositoryError::invalid_state(format!(
                    "payment {}",
                    existing.status
                )));
            }
            Some(existing) => existing.payment_id,
            None => fresh_payment_id,
        };

        let booking_status = BookingPaymentStatus::for_payment(state);
        booking.payment_status = booking_status;
        booking.payment = Some(PaymentRecord {
            payment_id,
            booking_id: request.booking_id,
            amount,
            method: request.method.to_string(),
            status: state,
            paid_at,
        });

        Ok(PaymentReceipt {
            booking_id: request.booking_id,
            payment_id,
            amount,
            method: request.method.to_string(),
            payment_state: state,
            booking_status,
            paid_at,
        })
    }

    fn refund_booking(
        &mut self,
        booking_id: BookingId,
    ) -> Result<PaymentReceipt, BookingRepositoryError> {
        let booking = self
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| BookingRepositoryError::booking_not_found(booking_id.get()))?;
        if booking.payment_status != BookingPaymentStatus::Paid {
            return Err(BookingRepositoryError::invalid_state(
                booking.payment_status.as_str(),
            ));
        }
        let payment = booking
            .payment
            .as_mut()
            .ok_or_else(|| BookingRepositoryError::invalid_state("paid without payment"))?;
        if !payment.status.can_transition_to(PaymentState::Refunded) {
            return Err(BookingRepositoryError::invalid_state(format!(
                "payment {}",
                payment.status
            )));
        }

        payment.status = PaymentState::Refunded;
        booking.payment_status = BookingPaymentStatus::Refunded;
        Ok(PaymentReceipt {
            booking_id,
            payment_id: payment.payment_id,
            amount: payment.amount,
            method: payment.method.clone(),
            payment_state: PaymentState::Refunded,
            booking_status: BookingPaymentStatus::Refunded,
            paid_at: payment.paid_at,
        })
    }
}

/// Mutex-guarded booking store for service and handler tests.
///
/// # Examples
/// ```
/// use heritage_backend::test_support::InMemoryBookingRepository;
///
/// let repo = InMemoryBookingRepository::default();
/// let event = repo.add_event(10, 50_000);
/// assert_eq!(repo.booked_tickets(event), 0);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBookingRepository {
    store: Mutex<Store>,
}

impl InMemoryBookingRepository {
    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(|err| err.into_inner())
    }

    /// Run `work` against a copy of the store, committing only on success.
    fn transaction<T>(
        &self,
        work: impl FnOnce(&mut Store) -> Result<T, BookingRepositoryError>,
    ) -> Result<T, BookingRepositoryError> {
        let mut guard = self.lock();
        if guard.unavailable {
            return Err(BookingRepositoryError::connection("store offline"));
        }
        let mut draft = guard.clone();
        let outcome = work(&mut draft)?;
        *guard = draft;
        Ok(outcome)
    }

    fn read<T>(&self, work: impl FnOnce(&Store) -> T) -> Result<T, BookingRepositoryError> {
        let guard = self.lock();
        if guard.unavailable {
            return Err(BookingRepositoryError::connection("store offline"));
        }
        Ok(work(&guard))
    }

    /// Add a heritage site with a ticket price in minor units.
    pub fn add_site(&self, ticket_price_minor: i64) -> SiteId {
        let mut store = self.lock();
        let site_id = store.allocate();
        store.sites.insert(site_id, money(ticket_price_minor));
        site_id
    }

    /// Add an event with a seat capacity and ticket price in minor units.
    pub fn add_event(&self, capacity: u32, ticket_price_minor: i64) -> EventId {
        let mut store = self.lock();
        let event_id = store.allocate();
        store.events.insert(
            event_id,
            StoredEvent {
                capacity,
                price: money(ticket_price_minor),
            },
        );
        event_id
    }

    /// Add a registered visitor.
    pub fn add_visitor(&self, name: &str, email: &str) -> VisitorId {
        let mut store = self.lock();
        let visitor_id = store.allocate();
        store.visitors.push(StoredVisitor {
            visitor_id,
            name: name.to_owned(),
            email: email.to_lowercase(),
            phone: None,
            password_hash: "$argon2id$registered".to_owned(),
        });
        visitor_id
    }

    /// Make every subsequent call fail with a connection error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    pub fn visitors(&self) -> Vec<StoredVisitor> {
        self.lock().visitors.clone()
    }

    pub fn bookings(&self) -> Vec<BookingReceipt> {
        self.lock().bookings.values().cloned().collect()
    }

    pub fn payments(&self) -> Vec<PaymentRecord> {
        self.lock()
            .bookings
            .values()
            .filter_map(|booking| booking.payment.clone())
            .collect()
    }

    pub fn booked_tickets(&self, event_id: EventId) -> u32 {
        self.lock().booked_for(event_id)
    }
}

fn money(minor: i64) -> Money {
    Money::from_minor(minor).unwrap_or_else(|err| panic!("fixture price is invalid: {err}"))
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn create_booking(
        &self,
        booking: &NewBooking,
    ) -> Result<BookingConfirmation, BookingRepositoryError> {
        self.transaction(|store| store.create_booking(booking))
    }

    async fn record_payment(
        &self,
        attempt: &PaymentAttempt,
    ) -> Result<PaymentReceipt, BookingRepositoryError> {
        self.transaction(|store| store.record_payment(attempt))
    }

    async fn refund_booking(
        &self,
        booking_id: BookingId,
    ) -> Result<PaymentReceipt, BookingRepositoryError> {
        self.transaction(|store| store.refund_booking(booking_id))
    }

    async fn target_exists(&self, target: BookingTarget) -> Result<bool, BookingRepositoryError> {
        self.read(|store| match target {
            BookingTarget::Site(site_id) => store.sites.contains_key(&site_id),
            BookingTarget::Event(event_id) => store.events.contains_key(&event_id),
        })
    }

    async fn find_booking(
        &self,
        booking_id: BookingId,
    ) -> Result<Option<BookingReceipt>, BookingRepositoryError> {
        self.read(|store| store.bookings.get(&booking_id).cloned())
    }

    async fn list_bookings_for_visitor(
        &self,
        visitor_id: VisitorId,
    ) -> Result<Vec<BookingReceipt>, BookingRepositoryError> {
        self.read(|store| {
            let mut listed: Vec<BookingReceipt> = store
                .bookings
                .values()
                .filter(|booking| booking.visitor_id == visitor_id)
                .cloned()
                .collect();
            listed.sort_by(|a, b| {
                b.booking_date
                    .cmp(&a.booking_date)
                    .then(b.booking_id.cmp(&a.booking_id))
            });
            listed
        })
    }

    async fn event_availability(
        &self,
        event_id: EventId,
    ) -> Result<Option<EventAvailability>, BookingRepositoryError> {
        self.read(|store| {
            store.events.get(&event_id).map(|event| {
                EventAvailability::new(event_id, event.capacity, store.booked_for(event_id))
            })
        })
    }
}
