//! Submission and bounded confirmation polling.
//!
//! A transaction is sent exactly once and then polled for status at a fixed
//! interval until it confirms, fails, outlives its blockhash, or the poll
//! budget runs out. The four terminal states are spelled out in
//! [`SubmitOutcome`]; transport failures surface as errors instead, so a
//! caller can always tell "the chain said no" apart from "we could not ask".
//!
//! Ambiguous endings ([`SubmitOutcome::TimedOut`]) are reported as-is. This
//! module never resubmits and never guesses.

use std::time::Duration;

use solana_sdk::signature::Signature;

use crate::error::ChainError;
use crate::rpc::RpcClient;
use crate::wire::fee_payer_signature;

/// Default pause between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default number of polls before giving up.
pub const DEFAULT_MAX_POLLS: u32 = 30;

/// Environment variable overriding the poll interval, in milliseconds.
pub const POLL_INTERVAL_ENV: &str = "CONFIRM_POLL_INTERVAL_MS";

/// Environment variable overriding the poll budget.
pub const MAX_POLLS_ENV: &str = "CONFIRM_MAX_POLLS";

/// How long and how often to poll for confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmPolicy {
    /// Pause between consecutive status polls.
    pub poll_interval: Duration,
    /// Number of polls before the outcome becomes [`SubmitOutcome::TimedOut`].
    pub max_polls: u32,
}

impl Default for ConfirmPolicy {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: DEFAULT_MAX_POLLS,
        }
    }
}

impl ConfirmPolicy {
    /// Load the policy from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ChainError> {
        let mut policy = Self::default();
        if let Ok(raw) = std::env::var(POLL_INTERVAL_ENV) {
            let millis: u64 = raw.trim().parse().map_err(|_| {
                ChainError::Config(format!("{POLL_INTERVAL_ENV} must be an integer: {raw:?}"))
            })?;
            policy.poll_interval = Duration::from_millis(millis);
        }
        if let Ok(raw) = std::env::var(MAX_POLLS_ENV) {
            policy.max_polls = raw.trim().parse().map_err(|_| {
                ChainError::Config(format!("{MAX_POLLS_ENV} must be an integer: {raw:?}"))
            })?;
        }
        Ok(policy)
    }
}

/// Terminal outcome of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The cluster confirmed the transaction.
    Confirmed {
        /// The transaction signature.
        signature: Signature,
    },
    /// The cluster executed the transaction and it failed.
    Failed {
        /// The transaction signature.
        signature: Signature,
        /// The on-chain error, rendered for humans.
        error: String,
    },
    /// The blockhash expired before any status was observed; the
    /// transaction can never land and is safe to rebuild.
    Expired {
        /// The transaction signature.
        signature: Signature,
    },
    /// The poll budget ran out with the transaction still in flight. It may
    /// yet land; nothing about it may be assumed.
    TimedOut {
        /// The transaction signature.
        signature: Signature,
    },
}

impl SubmitOutcome {
    /// The signature this outcome refers to.
    pub fn signature(&self) -> &Signature {
        match self {
            Self::Confirmed { signature }
            | Self::Failed { signature, .. }
            | Self::Expired { signature }
            | Self::TimedOut { signature } => signature,
        }
    }
}

/// Send a fully signed transaction and poll until a terminal outcome.
///
/// The blob must carry a signature in the fee payer slot; partially signed
/// transactions are rejected before anything touches the network. A send
/// rejected as a duplicate ("already been processed") drops through to
/// polling, since the first send evidently reached the cluster.
pub async fn submit_and_confirm(
    rpc: &RpcClient,
    transaction_base64: &str,
    last_valid_block_height: u64,
    policy: &ConfirmPolicy,
) -> Result<SubmitOutcome, ChainError> {
    let signature = fee_payer_signature(transaction_base64)?;

    match rpc.send_transaction(transaction_base64).await {
        Ok(sent) => {
            tracing::info!(signature = %sent, "transaction submitted");
        }
        Err(e) if e.is_already_processed() => {
            tracing::warn!(signature = %signature, "transaction already processed, polling status");
        }
        Err(e) => return Err(e),
    }

    for _ in 0..policy.max_polls {
        if let Some(status) = rpc.signature_status(&signature).await? {
            if let Some(detail) = status.error_detail() {
                return Ok(SubmitOutcome::Failed {
                    signature,
                    error: detail,
                });
            }
            if status.is_confirmed() {
                return Ok(SubmitOutcome::Confirmed { signature });
            }
        } else if rpc.block_height().await? > last_valid_block_height {
            // Unseen and unlandable: the blockhash is gone.
            return Ok(SubmitOutcome::Expired { signature });
        }
        tokio::time::sleep(policy.poll_interval).await;
    }

    tracing::warn!(signature = %signature, polls = policy.max_polls, "confirmation window exhausted");
    Ok(SubmitOutcome::TimedOut { signature })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = ConfirmPolicy::default();
        assert_eq!(policy.poll_interval, Duration::from_secs(1));
        assert_eq!(policy.max_polls, 30);
    }

    #[test]
    fn test_outcome_signature_accessor() {
        let sig = Signature::default();
        for outcome in [
            SubmitOutcome::Confirmed { signature: sig },
            SubmitOutcome::Failed {
                signature: sig,
                error: "custom program error: 0x1".into(),
            },
            SubmitOutcome::Expired { signature: sig },
            SubmitOutcome::TimedOut { signature: sig },
        ] {
            assert_eq!(outcome.signature(), &sig);
        }
    }
}
