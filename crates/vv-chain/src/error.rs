//! Chain-layer error types.
//!
//! Every fallible operation in this crate surfaces a [`ChainError`]. The
//! variants keep transport failures, JSON-RPC error objects, and local
//! encoding/signing problems distinct, because callers treat them
//! differently: transport and HTTP-status failures are retryable, a
//! JSON-RPC rejection is not, and local failures indicate a bug or bad
//! configuration.

use thiserror::Error;

/// Errors from Solana RPC calls and transaction handling.
#[derive(Debug, Error)]
pub enum ChainError {
    /// HTTP transport failure reaching the RPC endpoint.
    #[error("HTTP error calling {method}: {source}")]
    Http {
        /// The JSON-RPC method being invoked.
        method: String,
        /// The underlying transport error.
        source: reqwest::Error,
    },

    /// The RPC endpoint answered with a non-2xx HTTP status.
    #[error("RPC {method} returned HTTP {status}: {body}")]
    Status {
        /// The JSON-RPC method being invoked.
        method: String,
        /// The HTTP status code.
        status: u16,
        /// Response body excerpt for diagnostics.
        body: String,
    },

    /// The RPC endpoint returned a JSON-RPC error object.
    #[error("RPC {method} failed with code {code}: {message}")]
    Rpc {
        /// The JSON-RPC method being invoked.
        method: String,
        /// JSON-RPC error code.
        code: i64,
        /// JSON-RPC error message.
        message: String,
    },

    /// The response payload did not match the expected shape.
    #[error("failed to decode {method} response: {detail}")]
    Decode {
        /// The JSON-RPC method being invoked.
        method: String,
        /// What went wrong while decoding.
        detail: String,
    },

    /// Transaction serialization or wire encoding failed.
    #[error("transaction encoding error: {0}")]
    Encoding(String),

    /// Signing failed or the key material is malformed.
    #[error("signer error: {0}")]
    Signer(String),

    /// The chain client configuration is invalid.
    #[error("chain configuration error: {0}")]
    Config(String),
}

impl ChainError {
    /// True when the RPC rejected a send because the transaction already
    /// landed. Callers treat this as success and continue polling the
    /// transaction's own signature.
    pub fn is_already_processed(&self) -> bool {
        matches!(
            self,
            ChainError::Rpc { message, .. } if message.contains("already been processed")
        )
    }
}
