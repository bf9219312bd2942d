//! # Keygen Subcommand
//!
//! Generates the custodian keypair a deployment signs with. The secret
//! is emitted exactly once, here, at provisioning time; every other
//! surface of the system redacts it.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use vv_chain::VaultKeypair;

/// Arguments for the `vv keygen` subcommand.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Write the base58 secret to this file instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Execute the keygen subcommand.
pub fn run_keygen(args: &KeygenArgs) -> Result<u8> {
    cmd_keygen(args.output.as_deref())
}

fn cmd_keygen(output: Option<&Path>) -> Result<u8> {
    let vault = VaultKeypair::generate();

    match output {
        Some(path) => {
            // An existing key file is never overwritten; a mistyped path
            // must not destroy a live custodian identity.
            if path.exists() {
                bail!(
                    "refusing to overwrite existing keypair file: {}",
                    path.display()
                );
            }
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create output directory: {}", parent.display())
                })?;
            }
            std::fs::write(path, vault.to_base58())
                .with_context(|| format!("failed to write keypair file: {}", path.display()))?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                    .with_context(|| {
                        format!("failed to restrict keypair file mode: {}", path.display())
                    })?;
            }

            println!("OK: generated custodian keypair");
            println!("  Address: {}", vault.address());
            println!("  Secret:  {}", path.display());
        }
        None => {
            println!("OK: generated custodian keypair");
            println!("  Address: {}", vault.address());
            println!();
            println!("Secret (base58, set as VAULT_KEYPAIR):");
            println!("{}", vault.to_base58());
        }
    }

    Ok(0)
}
