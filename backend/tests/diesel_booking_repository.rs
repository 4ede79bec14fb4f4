//! Integration tests for the Diesel booking adapter against embedded
//! PostgreSQL.
//!
//! Each test provisions its own migrated database and drives the adapter
//! through the booking services. Fixture rows and assertions use the
//! synchronous `postgres` client, so async work runs on a runtime owned by
//! the test context rather than under `#[tokio::test]`.

use std::sync::Arc;

use futures::future::join_all;
use heritage_backend::domain::ports::{
    BookingCommand, BookingFields, BookingQuery, CreateBookingCommand, PaymentAttemptCommand,
    PaymentMethodSource,
};
use heritage_backend::domain::{
    BookingCommandService, BookingPaymentStatus, BookingQueryService, BookingTarget, ErrorCode,
    EventId, PaymentMethodOrigin, PaymentMethodSet, PaymentOutcome, PaymentState, Settlement,
    load_payment_methods,
};
use heritage_backend::outbound::persistence::{
    DbPool, DieselBookingRepository, DieselPaymentMethodSource, PoolConfig,
};
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::TemporaryDatabase;
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;

mod support;

use support::embedded_postgres::{execute, insert_event, insert_site, scalar};
use support::{handle_cluster_setup_failure, provision_database};

struct TestContext {
    runtime: Runtime,
    pool: DbPool,
    command: Arc<BookingCommandService<DieselBookingRepository>>,
    query: BookingQueryService<DieselBookingRepository>,
    database_url: String,
    _database: TemporaryDatabase,
}

impl TestContext {
    fn count(&self, sql: &str) -> i64 {
        scalar(&self.database_url, sql).expect("count query")
    }
}

fn setup_test_context() -> Result<TestContext, String> {
    let database = provision_database()?;
    let database_url = database.url().to_owned();
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let pool = runtime
        .block_on(DbPool::new(PoolConfig::new(&database_url).with_max_size(4)))
        .map_err(|err| err.to_string())?;
    let repo = Arc::new(DieselBookingRepository::new(pool.clone()));

    Ok(TestContext {
        runtime,
        pool,
        command: Arc::new(BookingCommandService::new(
            repo.clone(),
            Arc::new(PaymentMethodSet::fallback()),
            Arc::new(DefaultClock),
        )),
        query: BookingQueryService::new(repo),
        database_url,
        _database: database,
    })
}

#[fixture]
fn diesel_world() -> Option<TestContext> {
    match setup_test_context() {
        Ok(ctx) => Some(ctx),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

fn guest_command(email: &str, event_id: i64, tickets: i64) -> CreateBookingCommand {
    CreateBookingCommand {
        fields: BookingFields {
            name: Some("Guest".to_owned()),
            email: Some(email.to_owned()),
            event_id: Some(event_id),
            no_of_tickets: Some(tickets),
            ..BookingFields::default()
        },
        settlement: Settlement::Deferred,
    }
}

#[rstest]
fn event_booking_commits_visitor_booking_and_payment(diesel_world: Option<TestContext>) {
    let Some(ctx) = diesel_world else { return };
    let event = insert_event(&ctx.database_url, 10, 25_000).expect("seed event");

    let confirmation = ctx
        .runtime
        .block_on(
            ctx.command
                .create_booking(guest_command("Rahim@Example.com", event, 10)),
        )
        .expect("booking succeeds");

    assert_eq!(confirmation.amount.minor(), 250_000);
    assert_eq!(confirmation.payment_status, BookingPaymentStatus::Pending);
    assert_eq!(
        ctx.count("SELECT count(*) FROM visitors WHERE email = 'rahim@example.com'"),
        1
    );
    assert_eq!(
        ctx.count(&format!(
            "SELECT amount_minor FROM payments WHERE booking_id = {}",
            confirmation.booking_id
        )),
        250_000
    );

    let receipt = ctx
        .runtime
        .block_on(ctx.query.get_booking(confirmation.booking_id, None))
        .expect("booking reads back");
    assert_eq!(
        receipt.target,
        BookingTarget::Event(EventId::new(event).expect("event id"))
    );
    assert_eq!(receipt.tickets.get(), 10);
    assert_eq!(
        receipt.payment.map(|payment| payment.status),
        Some(PaymentState::Initiated)
    );
}

#[rstest]
fn full_event_rejects_and_writes_nothing(diesel_world: Option<TestContext>) {
    let Some(ctx) = diesel_world else { return };
    let event = insert_event(&ctx.database_url, 10, 1_000).expect("seed event");
    ctx.runtime
        .block_on(
            ctx.command
                .create_booking(guest_command("a@example.com", event, 10)),
        )
        .expect("fills the event");

    let err = ctx
        .runtime
        .block_on(
            ctx.command
                .create_booking(guest_command("b@example.com", event, 1)),
        )
        .expect_err("event is full");

    assert_eq!(err.code(), ErrorCode::CapacityExceeded);
    assert_eq!(
        err.details()
            .and_then(|details| details.get("remaining"))
            .and_then(serde_json::Value::as_u64),
        Some(0)
    );
    assert_eq!(ctx.count("SELECT count(*) FROM bookings"), 1);
    assert_eq!(ctx.count("SELECT count(*) FROM payments"), 1);
    assert_eq!(
        ctx.count("SELECT count(*) FROM visitors"),
        1,
        "the rejected guest row is rolled back"
    );
}

#[rstest]
fn unknown_method_is_reported_only_for_existing_targets(diesel_world: Option<TestContext>) {
    let Some(ctx) = diesel_world else { return };
    let event = insert_event(&ctx.database_url, 10, 1_000).expect("seed event");
    let with_method = |event_id: i64| {
        let mut command = guest_command("m@example.com", event_id, 1);
        command.fields.payment_method = Some("paypal".to_owned());
        command
    };

    let missing = ctx
        .runtime
        .block_on(ctx.command.create_booking(with_method(event + 100)))
        .expect_err("event does not exist");
    assert_eq!(missing.code(), ErrorCode::NotFound);

    let invalid = ctx
        .runtime
        .block_on(ctx.command.create_booking(with_method(event)))
        .expect_err("method is not accepted");
    assert_eq!(invalid.code(), ErrorCode::InvalidRequest);
    assert_eq!(ctx.count("SELECT count(*) FROM visitors"), 0);
}

#[rstest]
fn concurrent_bookings_respect_capacity(diesel_world: Option<TestContext>) {
    let Some(ctx) = diesel_world else { return };
    let event = insert_event(&ctx.database_url, 5, 700).expect("seed event");

    let results = ctx.runtime.block_on(async {
        let attempts = (0..12).map(|n| {
            let command = ctx.command.clone();
            tokio::spawn(async move {
                command
                    .create_booking(guest_command(&format!("racer{n}@example.com"), event, 1))
                    .await
            })
        });
        join_all(attempts).await
    });

    let admitted = results
        .into_iter()
        .map(|joined| joined.expect("task completes"))
        .filter(Result::is_ok)
        .count();
    assert_eq!(admitted, 5);
    assert_eq!(
        ctx.count(&format!(
            "SELECT COALESCE(SUM(no_of_tickets), 0)::BIGINT FROM bookings WHERE event_id = {event}"
        )),
        5
    );
}

#[rstest]
fn payment_lifecycle_keeps_a_single_row(diesel_world: Option<TestContext>) {
    let Some(ctx) = diesel_world else { return };
    let site = insert_site(&ctx.database_url, "Sixty Dome Mosque", 2_000).expect("seed site");

    let booked = ctx
        .runtime
        .block_on(ctx.command.create_booking(CreateBookingCommand {
            fields: BookingFields {
                name: Some("Karim".to_owned()),
                email: Some("karim@example.com".to_owned()),
                site_id: Some(site),
                no_of_tickets: Some(3),
                ..BookingFields::default()
            },
            settlement: Settlement::Deferred,
        }))
        .expect("booking");
    let attempt = |outcome| PaymentAttemptCommand {
        booking_id: booked.booking_id,
        method: Some("nagad".to_owned()),
        outcome,
        payer: Some(booked.visitor_id),
    };

    let failed = ctx
        .runtime
        .block_on(ctx.command.record_payment(attempt(PaymentOutcome::Failed)))
        .expect("failure recorded");
    assert_eq!(failed.booking_status, BookingPaymentStatus::Pending);

    let paid = ctx
        .runtime
        .block_on(ctx.command.record_payment(attempt(PaymentOutcome::Successful)))
        .expect("payment recorded");
    assert_eq!(paid.payment_id, booked.payment_id);
    assert_eq!(paid.method, "nagad");
    assert_eq!(paid.booking_status, BookingPaymentStatus::Paid);

    let err = ctx
        .runtime
        .block_on(ctx.command.record_payment(attempt(PaymentOutcome::Successful)))
        .expect_err("already paid");
    assert_eq!(err.detail_code(), Some("already_paid"));
    assert_eq!(ctx.count("SELECT count(*) FROM payments"), 1);
    assert_eq!(
        ctx.count("SELECT count(*) FROM bookings WHERE payment_status = 'paid'"),
        1
    );

    let refunded = ctx
        .runtime
        .block_on(ctx.command.refund_booking(booked.booking_id))
        .expect("refund");
    assert_eq!(refunded.payment_state, PaymentState::Refunded);
    assert_eq!(
        ctx.count("SELECT count(*) FROM payments WHERE status = 'refunded'"),
        1
    );
}

#[rstest]
fn visitor_listing_is_newest_first(diesel_world: Option<TestContext>) {
    let Some(ctx) = diesel_world else { return };
    let site = insert_site(&ctx.database_url, "Lalbagh Fort", 500).expect("seed site");
    let book = |email: &str| {
        ctx.runtime
            .block_on(ctx.command.create_booking(CreateBookingCommand {
                fields: BookingFields {
                    name: Some("Mita".to_owned()),
                    email: Some(email.to_owned()),
                    site_id: Some(site),
                    ..BookingFields::default()
                },
                settlement: Settlement::Immediate,
            }))
            .expect("booking")
    };

    let first = book("mita@example.com");
    let second = book("mita@example.com");
    assert_eq!(first.visitor_id, second.visitor_id);
    assert!(first.visitor_created);
    assert!(!second.visitor_created);

    let listed = ctx
        .runtime
        .block_on(ctx.query.list_visitor_bookings(first.visitor_id))
        .expect("listing");
    let ids: Vec<_> = listed.iter().map(|receipt| receipt.booking_id).collect();
    assert_eq!(ids, vec![second.booking_id, first.booking_id]);
}

#[rstest]
fn payment_catalogue_prefers_the_table(diesel_world: Option<TestContext>) {
    let Some(ctx) = diesel_world else { return };
    let source = DieselPaymentMethodSource::new(ctx.pool.clone());

    let codes = ctx
        .runtime
        .block_on(source.load_codes())
        .expect("seeded codes");
    assert_eq!(codes, ["bkash", "nagad", "rocket", "card", "bank_transfer"]);

    execute(&ctx.database_url, "DELETE FROM payment_methods").expect("empty table");
    let set = ctx
        .runtime
        .block_on(load_payment_methods(&source, Some("card, bkash")));
    assert_eq!(set.origin(), PaymentMethodOrigin::Configuration);
    assert_eq!(set.default_method().as_str(), "card");
}
