//! # vv-api — Binary Entry Point
//!
//! Starts the Axum HTTP server for the VibeVault custody engine.
//! Binds to configurable port (default 8080).

use std::path::PathBuf;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;

use vv_api::auth::SharedSecretVerifier;
use vv_api::state::{AppState, DEFAULT_MEDIA_DIR, MEDIA_DIR_ENV};
use vv_chain::{
    Cluster, ConfirmPolicy, FeeSchedule, RpcClient, RpcConfig, SolanaGateway, VaultKeypair,
};
use vv_custody::{
    CustodyConfig, CustodyService, FsMediaPipeline, IdentityVerifier, MemoryVibeStore, VibeStore,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    // Chain side: RPC endpoint, custodian key, fee schedule, confirmation
    // policy. All fail fast — a custody engine that cannot sign or cannot
    // reach its cluster has nothing to serve.
    let rpc_config = RpcConfig::from_env();
    let cluster = Cluster::from_rpc_url(&rpc_config.url);
    let rpc = RpcClient::new(rpc_config)?;
    let custodian = VaultKeypair::from_env()?;
    let fees = FeeSchedule::from_env()?;
    let policy = ConfirmPolicy::from_env()?;
    tracing::info!(cluster = ?cluster, custodian = %custodian.address(), "chain gateway configured");
    let gateway = Arc::new(SolanaGateway::new(rpc, custodian, fees, policy));

    // Custody side: deployment URLs, media pipeline, record store.
    let config = CustodyConfig::from_env(cluster);
    let media_dir = PathBuf::from(
        std::env::var(MEDIA_DIR_ENV).unwrap_or_else(|_| DEFAULT_MEDIA_DIR.to_string()),
    );
    let media = Arc::new(FsMediaPipeline::new(&media_dir, &config.base_url));

    // Initialize database pool (optional — absent means in-memory only).
    let db_pool = vv_api::db::init_pool().await.map_err(|e| {
        tracing::error!("Database initialization failed: {e}");
        e
    })?;
    let store: Arc<dyn VibeStore> = match &db_pool {
        Some(pool) => Arc::new(vv_api::db::PostgresVibeStore::new(pool.clone())),
        None => Arc::new(MemoryVibeStore::new()),
    };

    let custody = Arc::new(CustodyService::new(store, gateway, media, config.clone()));

    // Claim routes are useless without session verification, so the secret
    // is required rather than defaulted.
    let session_secret = std::env::var("SESSION_SECRET")
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or("SESSION_SECRET must be set; claim routes need session verification")?;
    let verifier: Arc<dyn IdentityVerifier> = Arc::new(SharedSecretVerifier::new(session_secret));

    // Prometheus exporter, rendered by GET /metrics.
    let metrics = PrometheusBuilder::new().install_recorder().map_err(|e| {
        tracing::error!("Prometheus recorder installation failed: {e}");
        e
    })?;

    let state = AppState {
        custody,
        verifier,
        config,
        media_dir,
        db_pool,
        metrics: Some(metrics),
    };

    let app = vv_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("VibeVault API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
