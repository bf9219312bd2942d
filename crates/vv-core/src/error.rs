//! # Validation Errors
//!
//! Rejections raised by the validated constructors in this crate. These are
//! the "caller sent something malformed" class of the error taxonomy; higher
//! layers map them to HTTP 422 without reinterpreting them, so every variant
//! carries enough context to render a self-explanatory message.

use thiserror::Error;

/// Rejection raised when a core domain value fails construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The handle was empty after stripping `@` and surrounding whitespace.
    #[error("handle is empty")]
    EmptyHandle,

    /// The handle exceeds the maximum supported length.
    #[error("handle {handle:?} is {len} characters, maximum is {max}")]
    HandleTooLong {
        /// The offending handle, normalized form.
        handle: String,
        /// Its character count.
        len: usize,
        /// The maximum permitted.
        max: usize,
    },

    /// The handle contains a character outside letters, digits, `_` and `.`.
    #[error("handle {handle:?} contains unsupported character {found:?}")]
    HandleCharset {
        /// The offending handle, normalized form.
        handle: String,
        /// The first unsupported character encountered.
        found: char,
    },

    /// The vibe identifier is not eight characters of the restricted alphabet.
    #[error("malformed vibe id {value:?}")]
    MalformedVibeId {
        /// The rejected input.
        value: String,
    },

    /// The wallet address is not a valid base58-encoded public key.
    #[error("malformed wallet address {value:?}")]
    MalformedAddress {
        /// The rejected input.
        value: String,
    },

    /// The signed transaction blob does not decode, or is missing its
    /// fee payer signature.
    #[error("malformed signed transaction: {detail}")]
    MalformedTransaction {
        /// What the decoder objected to.
        detail: String,
    },
}
