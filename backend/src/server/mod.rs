//! Server construction and middleware wiring.

mod config;
#[cfg(feature = "metrics")]
mod metrics;
mod state_builders;

pub use config::ServerConfig;

#[cfg(feature = "metrics")]
pub(crate) use metrics::make_metrics;
#[cfg(feature = "metrics")]
use metrics::MetricsLayer;
use state_builders::build_http_state;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use tracing::info;

use heritage_backend::Trace;
#[cfg(debug_assertions)]
use heritage_backend::doc::ApiDoc;
use heritage_backend::inbound::http::booking_form::{
    payment_status_page, submit_booking_form, submit_payment_form,
};
use heritage_backend::inbound::http::bookings::{
    create_booking, get_booking, list_my_bookings, pay_booking,
};
use heritage_backend::inbound::http::error::{form_error_handler, json_error_handler};
use heritage_backend::inbound::http::events::event_availability;
use heritage_backend::inbound::http::health::{HealthState, live, ready};
use heritage_backend::inbound::http::session_config::SessionSettings;
use heritage_backend::inbound::http::state::HttpState;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        key,
        cookie_secure,
        same_site,
    } = deps;

    // Both the JSON API and the browser forms identify the visitor from the
    // same cookie.
    let session = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(
            PersistentSession::default().session_ttl(actix_web::cookie::time::Duration::hours(2)),
        )
        .build();

    let api = web::scope("/api/v1")
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .service(create_booking)
        .service(get_booking)
        .service(pay_booking)
        .service(list_my_bookings)
        .service(event_availability);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(web::FormConfig::default().error_handler(form_error_handler))
        .wrap(session)
        .wrap(Trace)
        .service(api)
        .service(submit_booking_form)
        .service(submit_payment_form)
        .service(payment_status_page)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// The payment catalogue is resolved before the listener binds, so
/// readiness is only reported once bookings can be validated.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket or starting the server fails.
pub async fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let ServerConfig {
        session,
        bind_addr,
        db_pool,
        payment_methods,
        api_settlement,
        #[cfg(feature = "metrics")]
        prometheus,
    } = config;

    let http_state = web::Data::new(
        build_http_state(&db_pool, payment_methods.as_deref(), api_settlement).await,
    );
    let SessionSettings {
        key,
        cookie_secure,
        same_site,
    } = session;

    #[cfg(feature = "metrics")]
    let metrics_layer = MetricsLayer::from_option(prometheus);

    let server_health_state = health_state.clone();
    let server = HttpServer::new(move || {
        let app = build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            key: key.clone(),
            cookie_secure,
            same_site,
        });

        #[cfg(feature = "metrics")]
        let app = app.wrap(metrics_layer.clone());

        app
    })
    .bind(bind_addr)?
    .run();

    info!(%bind_addr, "listening");
    health_state.mark_ready();
    Ok(server)
}
