//! Custodial vault signer.
//!
//! The vault keypair is the backend's identity on chain: mint authority for
//! every collectible, owner of the vault token accounts, and the
//! partial-signer on every mint and claim transaction. It is provisioned
//! through the `VAULT_KEYPAIR` environment variable as the base58 encoding
//! of the 64-byte secret key.
//!
//! The secret never leaves this module except through
//! [`VaultKeypair::to_base58`], which exists for the keygen tooling. The
//! `Debug` impl redacts it.

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;

use crate::error::ChainError;

/// Environment variable holding the base58-encoded 64-byte secret key.
pub const VAULT_KEYPAIR_ENV: &str = "VAULT_KEYPAIR";

/// The custodian's signing keypair.
pub struct VaultKeypair {
    keypair: Keypair,
}

impl VaultKeypair {
    /// Load the vault keypair from [`VAULT_KEYPAIR_ENV`].
    pub fn from_env() -> Result<Self, ChainError> {
        let secret = std::env::var(VAULT_KEYPAIR_ENV)
            .map_err(|_| ChainError::Config(format!("{VAULT_KEYPAIR_ENV} is not set")))?;
        Self::from_base58(&secret)
    }

    /// Parse a keypair from the base58 encoding of its 64-byte secret key.
    pub fn from_base58(secret: &str) -> Result<Self, ChainError> {
        let bytes = bs58::decode(secret.trim())
            .into_vec()
            .map_err(|_| ChainError::Signer("vault secret is not valid base58".into()))?;
        if bytes.len() != 64 {
            return Err(ChainError::Signer(format!(
                "vault secret must decode to 64 bytes, got {}",
                bytes.len()
            )));
        }
        let keypair = Keypair::from_bytes(&bytes)
            .map_err(|e| ChainError::Signer(format!("vault secret is not a valid keypair: {e}")))?;
        Ok(Self { keypair })
    }

    /// Generate a fresh keypair (provisioning and tests).
    pub fn generate() -> Self {
        Self {
            keypair: Keypair::new(),
        }
    }

    /// The vault's public key.
    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    /// The vault's address in base58.
    pub fn address(&self) -> String {
        self.keypair.pubkey().to_string()
    }

    /// Export the secret key as base58. Only the keygen tooling calls this;
    /// never log the result.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.keypair.to_bytes()).into_string()
    }

    /// Access the underlying keypair for signing.
    pub(crate) fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

impl std::fmt::Debug for VaultKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultKeypair")
            .field("pubkey", &self.pubkey())
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
