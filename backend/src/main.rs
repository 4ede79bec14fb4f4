//! Booking server entry-point: loads settings, prepares the database and
//! serves the JSON API, browser forms and health probes.

mod server;

use std::io;

use actix_web::web;
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use heritage_backend::config::AppSettings;
use heritage_backend::inbound::http::health::HealthState;
use heritage_backend::inbound::http::session_config::{BuildMode, session_settings_from_env};
use heritage_backend::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load_from_iter(std::env::args_os())
        .map_err(|e| io::Error::other(format!("failed to load settings: {e}")))?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::current())
        .map_err(io::Error::other)?;
    info!(fingerprint = %session.key_fingerprint(), "session key loaded");

    let database_url = settings.database_url().map_err(io::Error::other)?.to_owned();
    let bind_addr = settings.bind_addr().map_err(io::Error::other)?;

    if settings.run_migrations {
        run_pending_migrations(database_url.clone())
            .await
            .map_err(io::Error::other)?;
    }

    let pool = DbPool::new(PoolConfig::new(database_url).with_max_size(settings.pool_max_size))
        .await
        .map_err(io::Error::other)?;

    let config = ServerConfig::new(session, bind_addr, pool)
        .with_payment_methods(settings.payment_methods.clone())
        .with_api_settlement(settings.api_settlement());
    #[cfg(feature = "metrics")]
    let config = config.with_metrics(Some(server::make_metrics()?));

    let health_state = web::Data::new(HealthState::new());
    create_server(health_state, config).await?.await
}
