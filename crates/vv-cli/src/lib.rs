//! # vv-cli — Operator Tooling for VibeVault
//!
//! Provides the `vv` command-line interface for the jobs that happen
//! outside the API process: provisioning the custodian keypair and
//! inspecting the custody ledger.
//!
//! ## Subcommands
//!
//! - `vv keygen` — Generate a custodian keypair.
//! - `vv address` — Print the custodian's public address.
//! - `vv vibes` — List custody records from the database.
//!
//! ## Key Handling
//!
//! The custodian secret is emitted only by `vv keygen`, and only because
//! provisioning requires it. Nothing in this crate logs the secret, and
//! `vv address` prints no more than the public half.

pub mod address;
pub mod keygen;
pub mod vibes;

use std::path::Path;

use anyhow::{Context, Result};
use vv_chain::VaultKeypair;

/// Load the custodian keypair from a file, or fall back to the
/// `VAULT_KEYPAIR` environment variable.
pub fn load_keypair(path: Option<&Path>) -> Result<VaultKeypair> {
    match path {
        Some(path) => {
            let secret = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read keypair file: {}", path.display()))?;
            VaultKeypair::from_base58(&secret)
                .with_context(|| format!("invalid keypair file: {}", path.display()))
        }
        None => VaultKeypair::from_env()
            .context("no --keypair given and no usable VAULT_KEYPAIR in the environment"),
    }
}
