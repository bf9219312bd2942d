//! # Identity Verification Seam
//!
//! A vibe is addressed to a social handle, so the claim side of the
//! lifecycle needs to know *which* handle the caller has proven control
//! of. How that proof works is a deployment concern (session tokens,
//! OAuth against the social platform, a test stub); the custody layer
//! only cares about the outcome. This trait is that boundary.

use async_trait::async_trait;
use thiserror::Error;
use vv_core::Handle;

/// Rejection raised when a presented credential does not establish a handle.
///
/// Deliberately carries no detail: why verification failed (unknown token,
/// bad signature, expiry) is not something we echo back to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// The credential is missing, malformed, or does not verify.
    #[error("credential does not establish a verified handle")]
    InvalidCredential,
}

/// Resolves a caller-presented credential to the handle it proves.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify `credential` and return the handle the caller controls.
    async fn verify(&self, credential: &str) -> Result<Handle, VerifyError>;
}
