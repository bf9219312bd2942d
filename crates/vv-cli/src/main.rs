//! # vv CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vv_cli::address::{run_address, AddressArgs};
use vv_cli::keygen::{run_keygen, KeygenArgs};
use vv_cli::vibes::{run_vibes, VibesArgs};

/// VibeVault operator CLI.
///
/// Custodian key provisioning and custody record inspection for a
/// VibeVault deployment.
#[derive(Parser, Debug)]
#[command(name = "vv", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a fresh custodian keypair.
    Keygen(KeygenArgs),

    /// Print the custodian's public address.
    Address(AddressArgs),

    /// List custody records from the database.
    Vibes(VibesArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Keygen(args) => run_keygen(&args),
        Commands::Address(args) => run_address(&args),
        Commands::Vibes(args) => run_vibes(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
