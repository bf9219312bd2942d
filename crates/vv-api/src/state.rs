//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! AppState owns no custody logic of its own. Every lifecycle operation
//! goes through the [`CustodyService`]; the remaining fields are the
//! deployment facts the HTTP layer needs to render URLs, check readiness,
//! and expose metrics.

use std::path::PathBuf;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;

use vv_custody::{CustodyConfig, CustodyService, IdentityVerifier};

/// Environment variable naming the on-disk media root.
pub const MEDIA_DIR_ENV: &str = "MEDIA_DIR";

/// Media root used when [`MEDIA_DIR_ENV`] is unset.
pub const DEFAULT_MEDIA_DIR: &str = "./media";

/// Shared application state.
///
/// Cheap to clone: everything heavyweight is behind an `Arc` or is itself
/// a pooled handle.
#[derive(Clone)]
pub struct AppState {
    /// The custody engine. All mint and claim lifecycle operations go
    /// through it; the HTTP layer never touches the store or chain directly.
    pub custody: Arc<CustodyService>,

    /// Resolves session credentials to verified handles. The session
    /// middleware is its only caller; handlers see the resulting handle.
    pub verifier: Arc<dyn IdentityVerifier>,

    /// Deployment configuration: public base URL and target cluster.
    /// Routes use it to render share, media, and explorer URLs.
    pub config: CustodyConfig,

    /// Root of the on-disk media tree served under `/media`.
    pub media_dir: PathBuf,

    /// PostgreSQL connection pool for durable custody records.
    /// When `None`, the API operates on the in-memory store only and the
    /// readiness probe skips the database check.
    pub db_pool: Option<PgPool>,

    /// Prometheus render handle for the `/metrics` endpoint. `None` when no
    /// recorder is installed, which is the case in tests (the recorder is
    /// installed once per process).
    pub metrics: Option<PrometheusHandle>,
}
