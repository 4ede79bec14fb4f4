//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use heritage_backend::domain::Settlement;
use heritage_backend::inbound::http::session_config::SessionSettings;
use heritage_backend::outbound::persistence::DbPool;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) session: SessionSettings,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: DbPool,
    pub(crate) payment_methods: Option<String>,
    pub(crate) api_settlement: Settlement,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Construct a configuration that settles API bookings immediately and
    /// takes payment methods from the database or the fallback list.
    #[must_use]
    pub fn new(session: SessionSettings, bind_addr: SocketAddr, db_pool: DbPool) -> Self {
        Self {
            session,
            bind_addr,
            db_pool,
            payment_methods: None,
            api_settlement: Settlement::Immediate,
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    /// Comma separated payment methods consulted when the table is empty.
    #[must_use]
    pub fn with_payment_methods(mut self, list: Option<String>) -> Self {
        self.payment_methods = list;
        self
    }

    /// Settlement for bookings created through the JSON API.
    #[must_use]
    pub fn with_api_settlement(mut self, settlement: Settlement) -> Self {
        self.api_settlement = settlement;
        self
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware to the configuration.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }
}
