//! # Vibes Subcommand
//!
//! Lists custody records straight from the database, newest first. The
//! operational questions this answers: what is sitting in the vault,
//! what has been claimed, and which mint addresses are live.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use sqlx::postgres::PgPoolOptions;

use vv_api::db::PostgresVibeStore;
use vv_custody::{CustodyRecord, VibeStore};

/// Arguments for the `vv vibes` subcommand.
#[derive(Args, Debug)]
pub struct VibesArgs {
    /// Emit records as JSON instead of the table view.
    #[arg(long)]
    pub json: bool,

    /// Show at most this many records.
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Execute the vibes subcommand.
pub fn run_vibes(args: &VibesArgs) -> Result<u8> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(list_vibes(args))
}

async fn list_vibes(args: &VibesArgs) -> Result<u8> {
    let url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to list custody records")?;
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&url)
        .await
        .context("failed to connect to PostgreSQL")?;

    let store = PostgresVibeStore::new(pool);
    let mut records = store.list().await?;
    if let Some(limit) = args.limit {
        records.truncate(limit);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(0);
    }

    if records.is_empty() {
        println!("no custody records");
        return Ok(0);
    }

    println!("{}", header_line());
    for record in &records {
        println!("{}", record_line(record));
    }
    println!();
    println!("{} record(s)", records.len());

    Ok(0)
}

fn header_line() -> String {
    format!(
        "{:<8}  {:<7}  {:<22}  {:<44}  {}",
        "ID", "STATUS", "RECIPIENT", "ASSET", "CREATED"
    )
}

fn record_line(record: &CustodyRecord) -> String {
    format!(
        "{:<8}  {:<7}  {:<22}  {:<44}  {}",
        record.id,
        record.status,
        record.recipient_handle.display_with_at(),
        record.asset_address.as_deref().unwrap_or("-"),
        record.created_at.format("%Y-%m-%d %H:%M:%S"),
    )
}
