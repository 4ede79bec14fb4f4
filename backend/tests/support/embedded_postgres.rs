//! Embedded PostgreSQL helpers for the persistence suites.
//!
//! Each test gets a fresh temporary database on the shared cluster with the
//! crate's embedded migrations applied. Fixture rows are inserted with the
//! synchronous `postgres` client, so call these helpers outside any Tokio
//! runtime.

use heritage_backend::outbound::persistence::run_pending_migrations_blocking;
use pg_embedded_setup_unpriv::TemporaryDatabase;
use pg_embedded_setup_unpriv::test_support::shared_cluster_handle;
use postgres::{Client, NoTls};

use super::format_postgres_error;

/// Create a migrated temporary database.
pub fn provision_database() -> Result<TemporaryDatabase, String> {
    let cluster = shared_cluster_handle().map_err(|err| format!("shared cluster: {err:?}"))?;
    let name = format!("heritage_test_{}", uuid::Uuid::new_v4().simple());
    let database = cluster
        .temporary_database(name.as_str())
        .map_err(|err| format!("temporary database: {err:?}"))?;
    run_pending_migrations_blocking(database.url()).map_err(|err| err.to_string())?;
    Ok(database)
}

fn connect(url: &str) -> Result<Client, String> {
    Client::connect(url, NoTls).map_err(|err| format_postgres_error(&err))
}

/// Insert a heritage site and return its id.
pub fn insert_site(url: &str, name: &str, ticket_price_minor: i64) -> Result<i64, String> {
    let row = connect(url)?
        .query_one(
            "INSERT INTO heritage_sites (name, location, ticket_price_minor) \
             VALUES ($1, 'Bagerhat', $2) RETURNING site_id",
            &[&name, &ticket_price_minor],
        )
        .map_err(|err| format_postgres_error(&err))?;
    Ok(row.get(0))
}

/// Insert an event scheduled for today and return its id.
pub fn insert_event(url: &str, capacity: i32, ticket_price_minor: i64) -> Result<i64, String> {
    let row = connect(url)?
        .query_one(
            "INSERT INTO events (name, event_date, capacity, ticket_price_minor) \
             VALUES ('Lantern walk', CURRENT_DATE, $1, $2) RETURNING event_id",
            &[&capacity, &ticket_price_minor],
        )
        .map_err(|err| format_postgres_error(&err))?;
    Ok(row.get(0))
}

/// Run a statement returning a single `BIGINT` (for example a `count(*)`).
pub fn scalar(url: &str, sql: &str) -> Result<i64, String> {
    let row = connect(url)?
        .query_one(sql, &[])
        .map_err(|err| format_postgres_error(&err))?;
    Ok(row.get(0))
}

/// Execute one or more statements.
pub fn execute(url: &str, sql: &str) -> Result<(), String> {
    connect(url)?
        .batch_execute(sql)
        .map_err(|err| format_postgres_error(&err))
}
