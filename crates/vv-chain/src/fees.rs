//! Service fee schedule.
//!
//! Both flows carry a flat service fee as a plain system transfer to the
//! treasury, paid by whoever signs last: the sender on mint, the claimer on
//! claim. Keeping the fee inside the same transaction as the mint or claim
//! means it is only ever collected when the operation itself lands.

use solana_sdk::pubkey::Pubkey;

use crate::error::ChainError;

/// Default mint fee in lamports (0.002 SOL).
pub const DEFAULT_MINT_FEE_LAMPORTS: u64 = 2_000_000;

/// Default claim fee in lamports (0.001 SOL).
pub const DEFAULT_CLAIM_FEE_LAMPORTS: u64 = 1_000_000;

/// Fees charged by the service and where they go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    /// Treasury account receiving the fees.
    pub treasury: Pubkey,
    /// Fee attached to every mint transaction.
    pub mint_fee_lamports: u64,
    /// Fee attached to every claim transaction.
    pub claim_fee_lamports: u64,
}

impl FeeSchedule {
    /// Fee schedule with default amounts.
    pub fn new(treasury: Pubkey) -> Self {
        Self {
            treasury,
            mint_fee_lamports: DEFAULT_MINT_FEE_LAMPORTS,
            claim_fee_lamports: DEFAULT_CLAIM_FEE_LAMPORTS,
        }
    }

    /// Load from the environment: `TREASURY_ADDRESS` (required),
    /// `MINT_FEE_LAMPORTS` and `CLAIM_FEE_LAMPORTS` (optional overrides).
    pub fn from_env() -> Result<Self, ChainError> {
        let treasury_raw = std::env::var("TREASURY_ADDRESS")
            .map_err(|_| ChainError::Config("TREASURY_ADDRESS is not set".into()))?;
        let treasury = treasury_raw.trim().parse::<Pubkey>().map_err(|e| {
            ChainError::Config(format!("TREASURY_ADDRESS {treasury_raw:?} is invalid: {e}"))
        })?;
        let mint_fee_lamports = lamports_from(
            "MINT_FEE_LAMPORTS",
            std::env::var("MINT_FEE_LAMPORTS").ok(),
            DEFAULT_MINT_FEE_LAMPORTS,
        )?;
        let claim_fee_lamports = lamports_from(
            "CLAIM_FEE_LAMPORTS",
            std::env::var("CLAIM_FEE_LAMPORTS").ok(),
            DEFAULT_CLAIM_FEE_LAMPORTS,
        )?;
        Ok(Self {
            treasury,
            mint_fee_lamports,
            claim_fee_lamports,
        })
    }
}

/// Parse an optional lamport override, keeping the default when unset.
fn lamports_from(var: &str, raw: Option<String>, default: u64) -> Result<u64, ChainError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map_err(|_| ChainError::Config(format!("{var} {value:?} is not a lamport amount"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_default_fees() {
        let fees = FeeSchedule::new(Pubkey::new_unique());
        assert_eq!(fees.mint_fee_lamports, DEFAULT_MINT_FEE_LAMPORTS);
        assert_eq!(fees.claim_fee_lamports, DEFAULT_CLAIM_FEE_LAMPORTS);
    }

    #[test]
    fn test_lamports_from_unset_keeps_default() {
        assert_eq!(lamports_from("X", None, 42).unwrap(), 42);
    }

    #[test]
    fn test_lamports_from_parses_override() {
        assert_eq!(
            lamports_from("X", Some("5000000".into()), 42).unwrap(),
            5_000_000
        );
        assert_eq!(lamports_from("X", Some(" 7 ".into()), 42).unwrap(), 7);
    }

    #[test]
    fn test_lamports_from_rejects_garbage() {
        assert!(lamports_from("X", Some("0.5 SOL".into()), 42).is_err());
        assert!(lamports_from("X", Some("-1".into()), 42).is_err());
        assert!(lamports_from("X", Some("".into()), 42).is_err());
    }
}
