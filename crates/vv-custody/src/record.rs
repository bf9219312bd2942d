//! # Custody Record State Machine
//!
//! A [`CustodyRecord`] tracks one collectible from the moment its identifier
//! is reserved until the recipient walks away with it.
//!
//! ## States
//!
//! ```text
//! Pending (no asset) ──▶ Pending (asset in flight / vault-held) ──▶ Claimed (terminal)
//! ```
//!
//! The status field is deliberately coarse: `Pending` covers everything from
//! "identifier reserved, nothing on chain yet" to "asset sitting in the
//! vault", because the chain — not this struct — is the authority on where
//! the asset actually is. What this struct *does* enforce is that the
//! terminal transition happens at most once and never without a minted
//! asset, and that the asset address and final media pointers are written
//! exactly once.
//!
//! ## Design Decision
//!
//! Transitions are validating methods returning `Result` rather than
//! typestates. The record crosses store and wire boundaries constantly, so
//! it must stay one serializable type; runtime-checked transitions give the
//! same single-writer guarantees without a parallel type family.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use vv_core::{mask_address, Handle, VibeId};

// ─── Claim Status ────────────────────────────────────────────────────

/// Custody status of a collectible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    /// Held (or about to be held) by the vault, awaiting its recipient.
    Pending,
    /// Transferred out of the vault to the recipient. Terminal.
    Claimed,
}

impl ClaimStatus {
    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Claimed)
    }
}

impl std::fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Claimed => f.write_str("claimed"),
        }
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors from invalid custody record transitions.
#[derive(Debug, Error)]
pub enum CustodyStateError {
    /// The record is already claimed; claimed is terminal.
    #[error("vibe {id} is already claimed")]
    AlreadyClaimed {
        /// The record identifier.
        id: VibeId,
    },

    /// The record has no minted asset, so custody cannot change hands.
    #[error("vibe {id} has no minted asset")]
    AssetMissing {
        /// The record identifier.
        id: VibeId,
    },

    /// The record already carries an asset address; it is written once.
    #[error("vibe {id} already has asset {existing}")]
    AssetAlreadySet {
        /// The record identifier.
        id: VibeId,
        /// The asset address already attached.
        existing: String,
    },

    /// The record already carries final media pointers; they are written once.
    #[error("vibe {id} already has media attached")]
    MediaAlreadySet {
        /// The record identifier.
        id: VibeId,
    },
}

// ─── Custody Record ──────────────────────────────────────────────────

/// One collectible in custody: who sent it, who may claim it, where the
/// on-chain asset lives, and whether it has been claimed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyRecord {
    /// Short shareable identifier, allocated before anything touches chain.
    pub id: VibeId,
    /// The handle the collectible is addressed to.
    pub recipient_handle: Handle,
    /// The sender's wallet address, base58.
    pub sender_address: String,
    /// Public form of the sender address.
    pub masked_sender: String,
    /// Mint address of the collectible. Set once when the mint transaction
    /// is built; the chain decides when it becomes real.
    pub asset_address: Option<String>,
    /// Metadata document URI. Starts as the placeholder pointing back into
    /// this service, replaced after upload.
    pub metadata_pointer: Option<String>,
    /// Final collectible image URI. Absent until media upload succeeds.
    pub image_pointer: Option<String>,
    /// Custody status; `Claimed` is terminal.
    pub status: ClaimStatus,
    /// Wallet that claimed the collectible. May be absent on a self-healed
    /// record until the true claimer confirms.
    pub claimer_address: Option<String>,
    /// When the claim was recorded, server clock.
    pub claimed_at: Option<DateTime<Utc>>,
    /// Display-only ordinal ("Vibe #42"). No uniqueness guarantee.
    pub sequence_number: Option<i64>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl CustodyRecord {
    /// Reserve a new pending record for `recipient_handle`.
    ///
    /// The sender address is masked here so every later consumer renders
    /// the same public form.
    pub fn new(
        id: VibeId,
        recipient_handle: Handle,
        sender_address: String,
        sequence_number: Option<i64>,
    ) -> Self {
        let masked_sender = mask_address(&sender_address);
        Self {
            id,
            recipient_handle,
            sender_address,
            masked_sender,
            asset_address: None,
            metadata_pointer: None,
            image_pointer: None,
            status: ClaimStatus::Pending,
            claimer_address: None,
            claimed_at: None,
            sequence_number,
            created_at: Utc::now(),
        }
    }

    /// Whether the record has reached its terminal state.
    pub fn is_claimed(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether `address` is the recorded claimer.
    pub fn claimed_by(&self, address: &str) -> bool {
        self.claimer_address.as_deref() == Some(address)
    }

    /// Attach the mint address of the in-flight asset. Write-once.
    pub fn attach_asset(&mut self, asset_address: String) -> Result<(), CustodyStateError> {
        if let Some(existing) = &self.asset_address {
            return Err(CustodyStateError::AssetAlreadySet {
                id: self.id.clone(),
                existing: existing.clone(),
            });
        }
        self.asset_address = Some(asset_address);
        Ok(())
    }

    /// Attach the final media pointers after a successful upload. Write-once;
    /// the placeholder metadata pointer is the one value this replaces.
    pub fn attach_media(
        &mut self,
        metadata_pointer: String,
        image_pointer: String,
    ) -> Result<(), CustodyStateError> {
        if self.image_pointer.is_some() {
            return Err(CustodyStateError::MediaAlreadySet {
                id: self.id.clone(),
            });
        }
        self.metadata_pointer = Some(metadata_pointer);
        self.image_pointer = Some(image_pointer);
        Ok(())
    }

    /// Record the terminal `pending → claimed` transition.
    ///
    /// `claimer_address` is absent on the self-healing path, where the
    /// service learns the asset left the vault without learning who took
    /// it. Rejected if the record is already claimed or was never minted.
    pub fn mark_claimed(
        &mut self,
        claimer_address: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), CustodyStateError> {
        if self.is_claimed() {
            return Err(CustodyStateError::AlreadyClaimed {
                id: self.id.clone(),
            });
        }
        if self.asset_address.is_none() {
            return Err(CustodyStateError::AssetMissing {
                id: self.id.clone(),
            });
        }
        self.status = ClaimStatus::Claimed;
        self.claimer_address = claimer_address;
        self.claimed_at = Some(at);
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
