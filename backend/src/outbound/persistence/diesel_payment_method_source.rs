//! Reads the canonical payment method enumeration from `payment_methods`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{PaymentMethodSource, PaymentMethodSourceError};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::pool::DbPool;
use super::schema::payment_methods;

/// Diesel-backed [`PaymentMethodSource`].
#[derive(Clone)]
pub struct DieselPaymentMethodSource {
    pool: DbPool,
}

impl DieselPaymentMethodSource {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentMethodSource for DieselPaymentMethodSource {
    async fn load_codes(&self) -> Result<Vec<String>, PaymentMethodSourceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_basic_pool_error(err, PaymentMethodSourceError::connection))?;

        payment_methods::table
            .order(payment_methods::position.asc())
            .select(payment_methods::code)
            .load::<String>(&mut conn)
            .await
            .map_err(|err| {
                map_basic_diesel_error(
                    err,
                    PaymentMethodSourceError::query,
                    PaymentMethodSourceError::connection,
                )
            })
    }
}
