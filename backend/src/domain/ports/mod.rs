//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod booking_command;
mod booking_query;
mod booking_repository;
mod payment_method_source;

#[cfg(test)]
pub use booking_command::MockBookingCommand;
pub use booking_command::{
    BookingCommand, BookingFields, CreateBookingCommand, PaymentAttemptCommand,
};
#[cfg(test)]
pub use booking_query::MockBookingQuery;
pub use booking_query::BookingQuery;
#[cfg(test)]
pub use booking_repository::MockBookingRepository;
pub use booking_repository::{
    BookingRepository, BookingRepositoryError, NewBooking, PaymentAttempt,
};
#[cfg(test)]
pub use payment_method_source::MockPaymentMethodSource;
pub use payment_method_source::{
    FixturePaymentMethodSource, PaymentMethodSource, PaymentMethodSourceError,
};
