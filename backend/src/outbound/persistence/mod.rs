//! PostgreSQL persistence adapters using Diesel.
//!
//! Repositories translate between Diesel row structs and domain types and
//! hold no business rules beyond the transactional guarantees their ports
//! require. Row models and table definitions stay private to this module.
//!
//! # Example
//!
//! ```rust,no_run
//! use heritage_backend::outbound::persistence::{DbPool, DieselBookingRepository, PoolConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/heritage")).await?;
//! let repo = DieselBookingRepository::new(pool);
//! # let _ = repo;
//! # Ok(())
//! # }
//! ```

mod diesel_basic_error_mapping;
mod diesel_booking_repository;
mod diesel_payment_method_source;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_booking_repository::DieselBookingRepository;
pub use diesel_payment_method_source::DieselPaymentMethodSource;
pub use migrations::{
    MIGRATIONS, MigrationError, run_pending_migrations, run_pending_migrations_blocking,
};
pub use pool::{DbPool, PoolConfig, PoolError};
