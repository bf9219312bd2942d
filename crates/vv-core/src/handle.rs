//! # Recipient Handles
//!
//! Defines `Handle`, the normalized social-media handle a vibe is addressed
//! to. Senders type handles with or without the `@` prefix and with
//! arbitrary casing; the claim flow must treat `@Alice`, `alice` and
//! `ALICE ` as the same recipient.
//!
//! ## Normalization
//!
//! Construction strips one leading `@` and surrounding whitespace, then
//! validates charset and length. The original casing is preserved for
//! display; equality of identity is the explicit [`Handle::matches()`]
//! method and lookups key on [`Handle::canonical_key()`], both
//! case-insensitive. The derived `Eq` (and thus `HashMap` key behavior)
//! stays byte-exact: `Handle("Alice") != Handle("alice")`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Maximum handle length, covering the major social platforms.
pub const HANDLE_MAX_LEN: usize = 30;

/// A normalized social-media handle (no leading `@`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Handle(String);

impl Handle {
    /// Parse and normalize a handle from user input.
    ///
    /// Strips one leading `@` and surrounding whitespace, preserving the
    /// casing of what remains.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::EmptyHandle`] if nothing remains after
    ///   normalization.
    /// - [`ValidationError::HandleTooLong`] beyond [`HANDLE_MAX_LEN`]
    ///   characters.
    /// - [`ValidationError::HandleCharset`] for characters outside ASCII
    ///   letters, digits, `_` and `.`.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        let bare = trimmed.strip_prefix('@').unwrap_or(trimmed).trim();

        if bare.is_empty() {
            return Err(ValidationError::EmptyHandle);
        }
        let len = bare.chars().count();
        if len > HANDLE_MAX_LEN {
            return Err(ValidationError::HandleTooLong {
                handle: bare.to_owned(),
                len,
                max: HANDLE_MAX_LEN,
            });
        }
        if let Some(found) = bare
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '.'))
        {
            return Err(ValidationError::HandleCharset {
                handle: bare.to_owned(),
                found,
            });
        }

        Ok(Self(bare.to_owned()))
    }

    /// Access the normalized handle (no `@`), original casing preserved.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive identity comparison.
    ///
    /// This is the rule used to decide whether an authenticated caller is
    /// the recipient a vibe is addressed to.
    pub fn matches(&self, other: &Handle) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }

    /// Lowercase form used as a case-insensitive lookup key.
    pub fn canonical_key(&self) -> String {
        self.0.to_ascii_lowercase()
    }

    /// The handle rendered with its `@` prefix for display.
    pub fn display_with_at(&self) -> String {
        format!("@{}", self.0)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Handle {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Handle {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Handle> for String {
    fn from(handle: Handle) -> Self {
        handle.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        let h = Handle::parse("alice").unwrap();
        assert_eq!(h.as_str(), "alice");
    }

    #[test]
    fn test_parse_strips_at_prefix() {
        let h = Handle::parse("@alice").unwrap();
        assert_eq!(h.as_str(), "alice");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(Handle::parse("  alice  ").unwrap().as_str(), "alice");
        assert_eq!(Handle::parse("@ alice").unwrap().as_str(), "alice");
        assert_eq!(Handle::parse(" @alice ").unwrap().as_str(), "alice");
    }

    #[test]
    fn test_parse_preserves_casing() {
        let h = Handle::parse("@AlICe_99").unwrap();
        assert_eq!(h.as_str(), "AlICe_99");
    }

    #[test]
    fn test_parse_allows_underscore_and_period() {
        assert!(Handle::parse("al_ice.b").is_ok());
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(matches!(
            Handle::parse(""),
            Err(ValidationError::EmptyHandle)
        ));
        assert!(matches!(
            Handle::parse("   "),
            Err(ValidationError::EmptyHandle)
        ));
        assert!(matches!(
            Handle::parse("@"),
            Err(ValidationError::EmptyHandle)
        ));
    }

    #[test]
    fn test_parse_rejects_overlong() {
        let long = "a".repeat(HANDLE_MAX_LEN + 1);
        assert!(matches!(
            Handle::parse(&long),
            Err(ValidationError::HandleTooLong { len, .. }) if len == HANDLE_MAX_LEN + 1
        ));
    }

    #[test]
    fn test_parse_accepts_max_length() {
        let max = "a".repeat(HANDLE_MAX_LEN);
        assert!(Handle::parse(&max).is_ok());
    }

    #[test]
    fn test_parse_rejects_bad_charset() {
        assert!(matches!(
            Handle::parse("al ice"),
            Err(ValidationError::HandleCharset { found: ' ', .. })
        ));
        assert!(Handle::parse("al!ce").is_err());
        assert!(Handle::parse("ali/ce").is_err());
        assert!(Handle::parse("@@alice").is_err()); // only one @ is stripped
    }

    // ---- identity comparison ----

    #[test]
    fn test_matches_is_case_insensitive() {
        let a = Handle::parse("Alice").unwrap();
        let b = Handle::parse("aLiCe").unwrap();
        assert!(a.matches(&b));
        assert!(b.matches(&a));
    }

    #[test]
    fn test_matches_distinct_handles() {
        let a = Handle::parse("alice").unwrap();
        let b = Handle::parse("alicia").unwrap();
        assert!(!a.matches(&b));
    }

    #[test]
    fn test_derived_eq_is_exact() {
        let a = Handle::parse("Alice").unwrap();
        let b = Handle::parse("alice").unwrap();
        assert_ne!(a, b);
        assert!(a.matches(&b));
    }

    #[test]
    fn test_canonical_key_lowercases() {
        let h = Handle::parse("@AlICe").unwrap();
        assert_eq!(h.canonical_key(), "alice");
    }

    // ---- rendering ----

    #[test]
    fn test_display_without_at() {
        let h = Handle::parse("@alice").unwrap();
        assert_eq!(h.to_string(), "alice");
    }

    #[test]
    fn test_display_with_at() {
        let h = Handle::parse("alice").unwrap();
        assert_eq!(h.display_with_at(), "@alice");
    }

    // ---- serde ----

    #[test]
    fn test_serde_roundtrip() {
        let h = Handle::parse("@alice").unwrap();
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, "\"alice\"");
        let back: Handle = serde_json::from_str(&json).unwrap();
        assert_eq!(h, back);
    }

    #[test]
    fn test_serde_normalizes_on_deserialize() {
        let h: Handle = serde_json::from_str("\"@Alice\"").unwrap();
        assert_eq!(h.as_str(), "Alice");
    }

    #[test]
    fn test_serde_rejects_malformed() {
        let result: Result<Handle, _> = serde_json::from_str("\"al ice\"");
        assert!(result.is_err());
    }
}
