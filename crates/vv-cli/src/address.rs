//! # Address Subcommand
//!
//! Prints the custodian's public address. Deploy checks use it to
//! confirm which identity a keypair file or the `VAULT_KEYPAIR`
//! variable actually holds.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

/// Arguments for the `vv address` subcommand.
#[derive(Args, Debug)]
pub struct AddressArgs {
    /// Read the keypair from this file instead of `VAULT_KEYPAIR`.
    #[arg(long, short)]
    pub keypair: Option<PathBuf>,
}

/// Execute the address subcommand.
pub fn run_address(args: &AddressArgs) -> Result<u8> {
    let vault = crate::load_keypair(args.keypair.as_deref())?;
    println!("{}", vault.address());
    Ok(0)
}

#[cfg(test)]
mod tests {
    use vv_chain::VaultKeypair;

    use crate::load_keypair;

    #[test]
    fn load_keypair_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.key");
        let vault = VaultKeypair::generate();
        std::fs::write(&path, vault.to_base58()).unwrap();

        let loaded = load_keypair(Some(&path)).unwrap();
        assert_eq!(loaded.address(), vault.address());
    }

    #[test]
    fn load_keypair_tolerates_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.key");
        let vault = VaultKeypair::generate();
        std::fs::write(&path, format!("{}\n", vault.to_base58())).unwrap();

        let loaded = load_keypair(Some(&path)).unwrap();
        assert_eq!(loaded.address(), vault.address());
    }

    #[test]
    fn load_keypair_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_keypair(Some(&dir.path().join("absent.key")));
        assert!(result.is_err());
    }

    #[test]
    fn load_keypair_rejects_garbage_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.key");
        std::fs::write(&path, "not a keypair").unwrap();
        assert!(load_keypair(Some(&path)).is_err());
    }
}
