//! JSON web API for the logbook.
//!
//! [`router`] assembles the routes and middleware; [`serve`] binds the
//! configured address and runs until Ctrl-C, letting in-flight requests
//! finish.

pub mod error;
pub mod handlers;

use std::time::Duration;

use anyhow::Context;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::properties::PropertyCodec;
use crate::storage::Storage;

pub use error::{ApiError, ApiResult};
pub use handlers::AppState;

/// Build the router with all routes and middleware.
///
/// Middleware, outermost first: request tracing, then the request timeout.
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    use handlers::{drones, flights, health, operators, properties, users};

    let layers = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ));

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/operators", get(operators::list).post(operators::create))
        .route(
            "/api/operators/{id}",
            get(operators::get)
                .put(operators::update)
                .delete(operators::delete),
        )
        .route("/api/drones", get(drones::list).post(drones::create))
        .route(
            "/api/drones/{id}",
            get(drones::get).put(drones::update).delete(drones::delete),
        )
        .route(
            "/api/properties",
            get(properties::list).post(properties::create),
        )
        .route(
            "/api/properties/{id}",
            get(properties::get)
                .put(properties::update)
                .delete(properties::delete),
        )
        .route("/api/flights", get(flights::list).post(flights::create))
        .route(
            "/api/flights/{id}",
            get(flights::get).put(flights::update).delete(flights::delete),
        )
        .route(
            "/api/flights/{id}/properties",
            get(flights::list_values).put(flights::put_values),
        )
        .route(
            "/api/flights/{id}/properties/form",
            post(flights::submit_form),
        )
        .route("/api/users", get(users::list).post(users::create))
        .route("/api/users/{id}", get(users::get).delete(users::delete))
        .layer(layers)
        .with_state(state)
}

/// Serve the API until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the address cannot be
/// bound, or the server fails.
pub async fn serve(config: &Config, storage: Storage) -> anyhow::Result<()> {
    let codec = PropertyCodec::from_config(&config.values)?;
    let state = AppState::new(storage, codec);
    let app = router(state, config.request_timeout());

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to listen on {addr}"))?;
    info!("Logbook API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Logbook API stopped");
    Ok(())
}

/// Resolves when Ctrl-C is received.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested, finishing in-flight requests");
}
