//! Test utilities shared by unit tests (in `src/`) and integration tests (in
//! `tests/`). Compiled for tests and with the `test-support` feature.

mod in_memory_bookings;

pub use in_memory_bookings::{InMemoryBookingRepository, StoredVisitor};
