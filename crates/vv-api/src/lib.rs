//! # vv-api — HTTP Surface of the VibeVault Custody Engine
//!
//! Axum services over the custody core: senders mint collectibles
//! addressed to a social handle, the vault holds them, recipients claim
//! them after proving control of the handle.
//!
//! ## API Surface
//!
//! | Route                        | Module              | Access  |
//! |------------------------------|---------------------|---------|
//! | `POST /v1/vibes/prepare`     | [`routes::vibes`]   | public  |
//! | `POST /v1/vibes/confirm`     | [`routes::vibes`]   | public  |
//! | `GET /v1/vibes/{id}`         | [`routes::vibes`]   | public  |
//! | `GET /v1/vibes/{id}/metadata`| [`routes::vibes`]   | public  |
//! | `GET /v1/vibes/pending`      | [`routes::claims`]  | session |
//! | `POST /v1/vibes/claim/*`     | [`routes::claims`]  | session |
//! | `GET /media/*`               | static files        | public  |
//! | `GET /openapi.json`          | [`openapi`]         | public  |
//! | `GET /health/*`, `/metrics`  | this module         | public  |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! MetricsMiddleware → TraceLayer → [SessionMiddleware on /v1/vibes/claim/*
//! and /v1/vibes/pending] → Handler
//! ```

pub mod auth;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::middleware::from_fn;
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth::SessionAuth;
use crate::error::AppError;
use crate::state::AppState;

/// Largest body any route legitimately receives. A fully signed
/// transaction is under 2 KiB of base64; everything else is smaller.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Assemble the full application router with all routes and middleware.
///
/// Session verification wraps only the claim routes; health probes, the
/// metrics endpoint, and the media tree stay reachable without credentials.
pub fn app(state: AppState) -> Router {
    let session = SessionAuth::new(state.verifier.clone());

    let api = Router::new()
        .merge(routes::vibes::router())
        .merge(
            routes::claims::router().layer(from_fn(auth::session_middleware)),
        )
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(session))
        .with_state(state.clone());

    // Artwork and metadata documents published by the media pipeline.
    let media = Router::new().nest_service("/media", ServeDir::new(&state.media_dir));

    // Unauthenticated probes and metrics.
    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness))
        .route("/metrics", axum::routing::get(prometheus_metrics))
        .with_state(state);

    Router::new()
        .merge(health)
        .merge(api)
        .merge(media)
        .layer(from_fn(middleware::metrics::metrics_middleware))
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — returns 200 when the application can serve traffic.
/// When a database is configured it must answer; without one the
/// in-memory store is always ready.
async fn readiness(State(state): State<AppState>) -> Result<&'static str, AppError> {
    if let Some(pool) = &state.db_pool {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(pool)
            .await
            .map_err(|err| AppError::Internal(format!("database not ready: {err}")))?;
    }
    Ok("ready")
}

/// GET /metrics — Prometheus exposition of request and domain metrics.
async fn prometheus_metrics(State(state): State<AppState>) -> String {
    state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}
