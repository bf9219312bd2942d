//! # Wallet Address Masking
//!
//! A vibe's public page shows who sent it without exposing the full wallet
//! address, and logs follow the same rule. The mask keeps the first and
//! last three characters with an ellipsis between them, enough to recognize
//! your own address without identifying the holder.

/// Mask a wallet address for public display: first 3 + `…` + last 3.
///
/// Inputs shorter than 7 characters pass through unchanged; masking them
/// would echo the whole string anyway. Operates on characters, so inputs
/// that are not pure base58 still mask on valid boundaries.
pub fn mask_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() < 7 {
        return address.to_owned();
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 3..].iter().collect();
    format!("{head}…{tail}")
}
