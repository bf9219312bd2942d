//! # Database Persistence Layer
//!
//! Optional Postgres persistence for custody records via SQLx.
//!
//! The database layer is **optional**. When `DATABASE_URL` is set, custody
//! records live in the `vibes` table and survive restarts. When absent,
//! the API operates on the in-memory store (suitable for development and
//! testing, useless for real custody — a restart forgets what the vault
//! holds).

pub mod vibes;

pub use vibes::PostgresVibeStore;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if `DATABASE_URL` is not set (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!(
                "DATABASE_URL not set — custody records are in-memory only \
                 and will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    // Run embedded migrations.
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}
