//! # Vibe Identifiers
//!
//! Defines `VibeId`, the short shareable identifier assigned to every vibe
//! at creation. The identifier appears in claim URLs and is read out loud
//! between people, so it draws from a restricted alphabet with the visually
//! ambiguous characters (`0`, `O`, `1`, `l`, `I`) removed.
//!
//! ## Format
//!
//! Exactly [`VIBE_ID_LEN`] characters from [`VIBE_ID_ALPHABET`]. The parser
//! is strict: uppercase forms of alphabet characters are rejected rather
//! than folded, so an identifier has exactly one textual representation.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Characters a vibe identifier may contain.
///
/// Lowercase latin letters and digits, minus `0`, `O`, `1`, `l`, `I`.
pub const VIBE_ID_ALPHABET: &[u8] = b"abcdefghjkmnpqrstuvwxyz23456789";

/// Length of every vibe identifier.
pub const VIBE_ID_LEN: usize = 8;

/// The short shareable identifier of a vibe.
///
/// Construct with [`VibeId::generate()`] for new vibes or
/// [`VibeId::parse()`] for inbound values; both uphold the format
/// invariant, and deserialization routes through the parser.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VibeId(String);

impl VibeId {
    /// Generate a new random vibe identifier.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let id = (0..VIBE_ID_LEN)
            .map(|_| {
                let idx = rng.gen_range(0..VIBE_ID_ALPHABET.len());
                VIBE_ID_ALPHABET[idx] as char
            })
            .collect();
        Self(id)
    }

    /// Parse a vibe identifier from its textual form.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MalformedVibeId`] if the input is not
    /// exactly [`VIBE_ID_LEN`] characters of [`VIBE_ID_ALPHABET`].
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        if s.len() != VIBE_ID_LEN || !s.bytes().all(|b| VIBE_ID_ALPHABET.contains(&b)) {
            return Err(ValidationError::MalformedVibeId {
                value: s.to_owned(),
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Access the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VibeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for VibeId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VibeId {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<VibeId> for String {
    fn from(id: VibeId) -> Self {
        id.0
    }
}
