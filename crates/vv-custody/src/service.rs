//! # Custody Service
//!
//! The conductor of the vibe lifecycle. Wallets sign transactions, the
//! chain settles them, the store remembers them; [`CustodyService`]
//! sequences those three so that every [`CustodyRecord`] tells the truth
//! about its collectible.
//!
//! ## Lifecycle
//!
//! ```text
//!                prepare_mint              confirm_mint
//! (no record) ──────────────▶ Pending ──────────────────▶ Pending, minted
//!                                │                               │
//!                                │ mint rejected / expired /     │ prepare_claim
//!                                │ timed out                     │ + confirm_claim
//!                                ▼                               ▼
//!                            (deleted)                   Claimed (terminal)
//! ```
//!
//! ## Design Decisions
//!
//! 1. **Confirmation is observed, never assumed.** Both confirm operations
//!    drive the submit-then-poll engine themselves and only write state the
//!    chain has actually confirmed. A caller cannot talk a record into
//!    `Claimed` by asserting that its transaction landed.
//! 2. **Compensation exists only on the mint side.** A failed, expired or
//!    timed-out mint deletes the reservation, freeing the handle for a new
//!    attempt; that is the sole path that ever deletes a record. A failed
//!    claim leaves the record `Pending`, because the collectible is still
//!    sitting in the vault and the recipient can simply try again.
//! 3. **The chain outranks the record.** `prepare_claim` probes live vault
//!    custody before composing anything. If the asset already left the
//!    vault while the record still says `Pending`, the record is healed to
//!    `Claimed` on the spot rather than handing out a transaction that can
//!    only fail.
//! 4. **Media is best-effort.** The placeholder metadata pointer baked into
//!    the mint resolves back into this service, so a collectible stays
//!    presentable and claimable even when image upload or the on-chain
//!    pointer rewrite fails. Those steps are logged and skipped, not
//!    retried and never fatal.

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use vv_chain::{
    fee_payer_signature, ChainError, ChainGateway, ClaimRequest, MintRequest, Pubkey,
    SubmitOutcome, VaultCustody,
};
use vv_core::{Handle, ValidationError, VibeId};

use crate::config::CustodyConfig;
use crate::media::{MediaError, MediaPipeline, VibeMetadata};
use crate::record::{CustodyRecord, CustodyStateError};
use crate::store::{RecordPatch, StoreError, VibeStore};

/// Token symbol stamped on every minted collectible.
pub const ASSET_SYMBOL: &str = "VIBE";

/// On-chain display name for a collectible addressed to `handle`.
fn asset_name(handle: &Handle) -> String {
    format!("Vibe for @{handle}")
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Everything a custody operation can refuse to do, and why.
///
/// The variants split along what the caller should do next: fix the input
/// (`Validation`, `Unauthorized`), accept the state of the world
/// (`AlreadyVibed`, `AlreadyClaimed`, `NotMinted`, `RecordNotFound`), retry
/// the same transaction (`Network`), rebuild it (`ChainRejected`,
/// `TransactionExpired`), wait and re-ask (`Ambiguous`), or page whoever
/// runs this service (`Store`, `Media`).
#[derive(Error, Debug)]
pub enum CustodyError {
    /// The caller sent something malformed. Nothing was mutated.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The verified handle is not the one the vibe is addressed to.
    #[error("vibe is addressed to @{recipient}, not @{presented}")]
    Unauthorized {
        /// The handle on the record.
        recipient: Handle,
        /// The handle the caller proved control of.
        presented: Handle,
    },

    /// The handle already has a pending vibe in custody.
    #[error("@{handle} already has a pending vibe")]
    AlreadyVibed {
        /// The occupied handle.
        handle: Handle,
    },

    /// The collectible has already been claimed.
    #[error("vibe {id} has already been claimed")]
    AlreadyClaimed {
        /// The affected record.
        id: VibeId,
    },

    /// No confirmed mint backs this record yet; there is nothing to claim.
    #[error("vibe {id} has no confirmed mint")]
    NotMinted {
        /// The affected record.
        id: VibeId,
    },

    /// No record has this identifier.
    #[error("no vibe with id {id}")]
    RecordNotFound {
        /// The identifier that resolved to nothing.
        id: VibeId,
    },

    /// The chain could not be reached or answered garbage. The caller may
    /// retry the same request unchanged.
    #[error("chain unavailable: {0}")]
    Network(#[source] ChainError),

    /// The chain accepted the question and answered no. The transaction is
    /// dead; a retry needs a freshly built one.
    #[error("transaction rejected by the chain: {detail}")]
    ChainRejected {
        /// The chain's rendering of what went wrong.
        detail: String,
    },

    /// The blockhash aged out before the transaction landed. Rebuild.
    #[error("transaction expired before confirmation")]
    TransactionExpired,

    /// Confirmation polling gave up with the transaction still in flight.
    /// It may yet land; re-poll the signature, never blind-resubmit.
    #[error("confirmation timed out for signature {signature}")]
    Ambiguous {
        /// The in-flight transaction signature, base58.
        signature: String,
    },

    /// The record store failed, or holds a record that contradicts itself.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Media generation or upload failed where it was not allowed to.
    #[error(transparent)]
    Media(#[from] MediaError),
}

impl From<CustodyStateError> for CustodyError {
    fn from(err: CustodyStateError) -> Self {
        match err {
            CustodyStateError::AlreadyClaimed { id } => CustodyError::AlreadyClaimed { id },
            CustodyStateError::AssetMissing { id } => CustodyError::NotMinted { id },
            // A record violating its own write-once rules is stored-state
            // corruption, not something the caller did.
            CustodyStateError::AssetAlreadySet { ref id, .. }
            | CustodyStateError::MediaAlreadySet { ref id } => CustodyError::Store(StoreError::Corrupt {
                id: id.clone(),
                detail: err.to_string(),
            }),
        }
    }
}

/// Sort a submit-engine failure into the caller-facing taxonomy.
///
/// A rejected `sendTransaction` is the chain refusing the transaction
/// itself; a bad blob never reached the network at all; everything else is
/// transport trouble the caller may retry through.
fn classify_submit_error(error: ChainError) -> CustodyError {
    match error {
        ChainError::Rpc { ref method, .. } if method == "sendTransaction" => {
            CustodyError::ChainRejected {
                detail: error.to_string(),
            }
        }
        ChainError::Encoding(detail) => {
            CustodyError::Validation(ValidationError::MalformedTransaction { detail })
        }
        other => CustodyError::Network(other),
    }
}

// ─── Operation Results ───────────────────────────────────────────────

/// A mint transaction awaiting the sender's wallet signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedMint {
    /// Identifier of the reserved custody record.
    pub record_id: VibeId,
    /// Base64 transaction blob, custodian- and asset-signed.
    pub transaction_base64: String,
    /// Blockhash the transaction was built against.
    pub blockhash: String,
    /// Height after which the transaction can no longer land.
    pub last_valid_block_height: u64,
    /// Mint address of the in-flight collectible, base58.
    pub asset_address: String,
    /// Service fee the sender will pay, in lamports.
    pub fee_lamports: u64,
}

/// The outcome of a confirmed mint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedMint {
    /// Mint address of the collectible, base58.
    pub asset_address: String,
    /// Confirmed transaction signature, base58.
    pub signature: String,
    /// Shareable vibe page URL.
    pub vibe_url: String,
}

/// A claim transaction awaiting the claimer's wallet signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedClaim {
    /// Base64 transaction blob, custodian-signed.
    pub transaction_base64: String,
    /// Blockhash the transaction was built against.
    pub blockhash: String,
    /// Height after which the transaction can no longer land.
    pub last_valid_block_height: u64,
    /// Mint address of the collectible being claimed, base58.
    pub asset_address: String,
    /// Service fee the claimer will pay, in lamports.
    pub fee_lamports: u64,
}

/// The outcome of a confirmed claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedClaim {
    /// Confirmed transaction signature, base58.
    pub signature: String,
}

/// What the vault holds for an authenticated handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleVibe {
    /// A pending vibe is waiting for this handle to claim it.
    Claimable {
        /// The record identifier.
        id: VibeId,
        /// Shareable vibe page URL.
        vibe_url: String,
        /// Masked sender wallet, for display.
        masked_sender: String,
    },
    /// The handle already claimed its vibe.
    Claimed {
        /// The record identifier.
        id: VibeId,
        /// Shareable vibe page URL.
        vibe_url: String,
        /// Mint address of the claimed collectible, base58.
        asset_address: String,
        /// Explorer link proving the claim.
        explorer_url: String,
    },
}

// ─── Service ─────────────────────────────────────────────────────────

/// Orchestrates mint and claim lifecycles over injected collaborators.
pub struct CustodyService {
    store: Arc<dyn VibeStore>,
    chain: Arc<dyn ChainGateway>,
    media: Arc<dyn MediaPipeline>,
    config: CustodyConfig,
}

impl CustodyService {
    pub fn new(
        store: Arc<dyn VibeStore>,
        chain: Arc<dyn ChainGateway>,
        media: Arc<dyn MediaPipeline>,
        config: CustodyConfig,
    ) -> Self {
        Self {
            store,
            chain,
            media,
            config,
        }
    }

    // ─── Mint Side ───────────────────────────────────────────────────

    /// Reserve a custody record for `recipient_handle` and compose the mint
    /// transaction `sender_address` must sign.
    ///
    /// One live vibe per handle: a pending record for the handle makes this
    /// `AlreadyVibed`. The reservation exists only to back the returned
    /// transaction, so if composing it fails the record is deleted again
    /// before the error surfaces.
    pub async fn prepare_mint(
        &self,
        recipient_handle: &str,
        sender_address: &str,
    ) -> Result<PreparedMint, CustodyError> {
        let handle = Handle::parse(recipient_handle)?;
        let sender = parse_wallet(sender_address)?;

        if let Some(existing) = self.store.find_live_by_handle(&handle).await? {
            tracing::info!(vibe = %existing.id, handle = %handle, "handle already has a pending vibe");
            return Err(CustodyError::AlreadyVibed { handle });
        }

        let sequence = self.store.next_sequence_number().await?;
        let id = VibeId::generate();
        let mut record = CustodyRecord::new(
            id.clone(),
            handle.clone(),
            sender_address.to_owned(),
            Some(sequence),
        );
        // The pointer baked into the mint must resolve from the first
        // confirmation onward, so it aims at this service, not at media
        // that does not exist yet.
        record.metadata_pointer = Some(self.config.placeholder_metadata_url(&id));
        self.store.create(record).await?;

        let prepared = match self
            .chain
            .build_mint(MintRequest {
                sender,
                asset_name: asset_name(&handle),
                asset_symbol: ASSET_SYMBOL.to_owned(),
                metadata_uri: self.config.placeholder_metadata_url(&id),
            })
            .await
        {
            Ok(prepared) => prepared,
            Err(error) => {
                self.discard_reservation(&id, "mint build failed").await;
                return Err(CustodyError::Network(error));
            }
        };

        let asset_address = prepared.asset_address.to_string();
        self.patch_record(&id, RecordPatch::asset(asset_address.clone()))
            .await?;

        tracing::info!(
            vibe = %id,
            handle = %handle,
            asset = %asset_address,
            sequence,
            "mint prepared"
        );

        Ok(PreparedMint {
            record_id: id,
            transaction_base64: prepared.transaction_base64,
            blockhash: prepared.blockhash,
            last_valid_block_height: prepared.last_valid_block_height,
            asset_address,
            fee_lamports: prepared.fee_lamports,
        })
    }

    /// Submit the wallet-signed mint transaction and poll it to a verdict.
    ///
    /// Anything short of a confirmation deletes the reservation: the handle
    /// becomes free again and the sender starts over with a fresh
    /// transaction. After confirmation the collectible is real, and the
    /// media upload plus on-chain pointer rewrite that follow are allowed
    /// to fail without undoing it.
    pub async fn confirm_mint(
        &self,
        record_id: &VibeId,
        signed_transaction: &str,
        last_valid_block_height: u64,
    ) -> Result<ConfirmedMint, CustodyError> {
        let record = self.load_record(record_id).await?;
        let (asset_address, asset_key) = minted_asset(&record)?;

        let outcome = match self
            .chain
            .submit_and_confirm(signed_transaction, last_valid_block_height)
            .await
        {
            Ok(outcome) => outcome,
            Err(error) => {
                let mapped = classify_submit_error(error);
                if matches!(mapped, CustodyError::ChainRejected { .. }) {
                    self.discard_reservation(record_id, "mint send rejected")
                        .await;
                }
                return Err(mapped);
            }
        };

        let signature = match outcome {
            SubmitOutcome::Confirmed { signature } => signature,
            SubmitOutcome::Failed { signature, error } => {
                tracing::warn!(vibe = %record_id, %signature, error, "mint failed on chain");
                self.discard_reservation(record_id, "mint failed on chain")
                    .await;
                return Err(CustodyError::ChainRejected { detail: error });
            }
            SubmitOutcome::Expired { .. } => {
                self.discard_reservation(record_id, "mint blockhash expired")
                    .await;
                return Err(CustodyError::TransactionExpired);
            }
            SubmitOutcome::TimedOut { signature } => {
                self.discard_reservation(record_id, "mint confirmation timed out")
                    .await;
                return Err(CustodyError::Ambiguous {
                    signature: signature.to_string(),
                });
            }
        };

        if record.image_pointer.is_some() {
            tracing::debug!(vibe = %record_id, "media already attached");
        } else {
            match self.media.generate_and_upload(&record).await {
                Ok(assets) => {
                    match self
                        .chain
                        .point_metadata(&asset_key, &assets.metadata_pointer)
                        .await
                    {
                        Ok(SubmitOutcome::Confirmed { .. }) => {}
                        Ok(other) => {
                            tracing::warn!(
                                vibe = %record_id,
                                outcome = ?other,
                                "metadata pointer update did not confirm"
                            );
                        }
                        Err(error) => {
                            tracing::warn!(vibe = %record_id, %error, "metadata pointer update failed");
                        }
                    }
                    self.patch_record(
                        record_id,
                        RecordPatch::media(assets.metadata_pointer, assets.image_pointer),
                    )
                    .await?;
                }
                Err(error) => {
                    tracing::warn!(
                        vibe = %record_id,
                        %error,
                        "media upload failed, placeholder pointer stays live"
                    );
                }
            }
        }

        tracing::info!(vibe = %record_id, asset = %asset_address, %signature, "mint confirmed");

        Ok(ConfirmedMint {
            asset_address,
            signature: signature.to_string(),
            vibe_url: self.config.vibe_url(record_id),
        })
    }

    // ─── Claim Side ──────────────────────────────────────────────────

    /// Compose the claim transaction `claimer_address` must sign, after
    /// proving the caller is the addressed recipient and the vault still
    /// holds the collectible.
    ///
    /// The checks run in a fixed order so the caller always gets the most
    /// specific refusal: missing record, already claimed, not minted,
    /// wrong handle, then the live vault probe.
    pub async fn prepare_claim(
        &self,
        record_id: &VibeId,
        claimer_address: &str,
        verified_handle: &Handle,
    ) -> Result<PreparedClaim, CustodyError> {
        let claimer = parse_wallet(claimer_address)?;
        let record = self.load_record(record_id).await?;

        if record.is_claimed() {
            return Err(CustodyError::AlreadyClaimed { id: record.id });
        }
        let (asset_address, asset_key) = minted_asset(&record)?;
        if !verified_handle.matches(&record.recipient_handle) {
            tracing::warn!(
                vibe = %record_id,
                recipient = %record.recipient_handle,
                presented = %verified_handle,
                "claim attempt by wrong handle"
            );
            return Err(CustodyError::Unauthorized {
                recipient: record.recipient_handle,
                presented: verified_handle.clone(),
            });
        }

        match self
            .chain
            .vault_custody(&asset_key)
            .await
            .map_err(CustodyError::Network)?
        {
            VaultCustody::Held => {}
            VaultCustody::Absent => {
                // The mint transaction creates the vault's token account,
                // so its absence means the mint never landed.
                return Err(CustodyError::NotMinted { id: record.id });
            }
            VaultCustody::Released => {
                // A claim confirmed that we never heard about. Catch the
                // record up; who took it stays unknown until that claimer
                // confirms through us.
                tracing::warn!(
                    vibe = %record_id,
                    asset = %asset_address,
                    "asset already left the vault, healing record"
                );
                self.patch_record(record_id, RecordPatch::claimed(None, Utc::now()))
                    .await?;
                return Err(CustodyError::AlreadyClaimed { id: record.id });
            }
        }

        let prepared = self
            .chain
            .build_claim(ClaimRequest {
                asset_address: asset_key,
                claimer,
            })
            .await
            .map_err(CustodyError::Network)?;

        tracing::info!(vibe = %record_id, asset = %asset_address, claimer = %claimer, "claim prepared");

        Ok(PreparedClaim {
            transaction_base64: prepared.transaction_base64,
            blockhash: prepared.blockhash,
            last_valid_block_height: prepared.last_valid_block_height,
            asset_address,
            fee_lamports: prepared.fee_lamports,
        })
    }

    /// Submit the wallet-signed claim transaction and poll it to a verdict.
    ///
    /// Only a chain-confirmed transaction performs the `pending → claimed`
    /// write; every other outcome leaves the record pending and retryable.
    /// Re-confirming an already-claimed record is idempotent for the
    /// recorded claimer and `AlreadyClaimed` for anyone else.
    pub async fn confirm_claim(
        &self,
        record_id: &VibeId,
        claimer_address: &str,
        signed_transaction: &str,
        last_valid_block_height: u64,
    ) -> Result<ConfirmedClaim, CustodyError> {
        parse_wallet(claimer_address)?;
        // Reject garbage before touching the record or the network.
        let claim_signature =
            fee_payer_signature(signed_transaction).map_err(classify_submit_error)?;

        let record = self.load_record(record_id).await?;
        if record.is_claimed() {
            if record.claimed_by(claimer_address) {
                // The earlier confirmation evidently landed; echo its result.
                tracing::info!(vibe = %record_id, "claim already recorded for this wallet");
                return Ok(ConfirmedClaim {
                    signature: claim_signature.to_string(),
                });
            }
            if record.claimer_address.is_some() {
                return Err(CustodyError::AlreadyClaimed { id: record.id });
            }
            // Healed without a claimer identity: let the submission below
            // settle whose claim actually landed. A duplicate send of the
            // winning transaction is idempotent on the chain side.
        }

        let outcome = self
            .chain
            .submit_and_confirm(signed_transaction, last_valid_block_height)
            .await
            .map_err(classify_submit_error)?;

        match outcome {
            SubmitOutcome::Confirmed { signature } => {
                let patch = if record.is_claimed() {
                    RecordPatch::claimer(claimer_address.to_owned())
                } else {
                    RecordPatch::claimed(Some(claimer_address.to_owned()), Utc::now())
                };
                self.patch_record(record_id, patch).await?;
                tracing::info!(vibe = %record_id, claimer = claimer_address, %signature, "claim confirmed");
                Ok(ConfirmedClaim {
                    signature: signature.to_string(),
                })
            }
            SubmitOutcome::Failed { signature, error } => {
                tracing::warn!(vibe = %record_id, %signature, error, "claim failed on chain");
                Err(CustodyError::ChainRejected { detail: error })
            }
            SubmitOutcome::Expired { .. } => Err(CustodyError::TransactionExpired),
            // The record stays pending; the next prepare_claim's vault
            // probe is the backstop if this transaction landed after all.
            SubmitOutcome::TimedOut { signature } => Err(CustodyError::Ambiguous {
                signature: signature.to_string(),
            }),
        }
    }

    // ─── Read Paths ──────────────────────────────────────────────────

    /// What the vault holds for the authenticated `verified_handle`: their
    /// pending vibe, else their claimed one, else nothing.
    pub async fn pending_for_handle(
        &self,
        verified_handle: &Handle,
    ) -> Result<Option<HandleVibe>, CustodyError> {
        if let Some(record) = self.store.find_live_by_handle(verified_handle).await? {
            return Ok(Some(HandleVibe::Claimable {
                vibe_url: self.config.vibe_url(&record.id),
                masked_sender: record.masked_sender,
                id: record.id,
            }));
        }

        if let Some(record) = self.store.find_claimed_by_handle(verified_handle).await? {
            // mark_claimed refuses records without an asset, so a claimed
            // record missing one is corrupt, not merely incomplete.
            let asset_address = record.asset_address.clone().ok_or_else(|| {
                CustodyError::Store(StoreError::Corrupt {
                    id: record.id.clone(),
                    detail: "claimed record carries no asset address".into(),
                })
            })?;
            let asset_key = parse_asset_key(&record.id, &asset_address)?;
            return Ok(Some(HandleVibe::Claimed {
                vibe_url: self.config.vibe_url(&record.id),
                explorer_url: self.config.explorer_token_url(&asset_key),
                id: record.id,
                asset_address,
            }));
        }

        Ok(None)
    }

    /// The record backing the public vibe page.
    pub async fn record(&self, record_id: &VibeId) -> Result<CustodyRecord, CustodyError> {
        self.load_record(record_id).await
    }

    /// The metadata document served under the placeholder pointer.
    ///
    /// Composed fresh from the record on every call, so it is correct both
    /// before the media upload (image at its conventional future address)
    /// and after (image at wherever the upload actually landed).
    pub async fn metadata_document(
        &self,
        record_id: &VibeId,
    ) -> Result<VibeMetadata, CustodyError> {
        let record = self.load_record(record_id).await?;
        let image = record
            .image_pointer
            .clone()
            .unwrap_or_else(|| self.config.media_image_url(record_id));
        let external_url = self.config.vibe_url(record_id);
        Ok(VibeMetadata::compose(&record, image, external_url))
    }

    // ─── Internals ───────────────────────────────────────────────────

    async fn load_record(&self, id: &VibeId) -> Result<CustodyRecord, CustodyError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| CustodyError::RecordNotFound { id: id.clone() })
    }

    async fn patch_record(
        &self,
        id: &VibeId,
        patch: RecordPatch,
    ) -> Result<CustodyRecord, CustodyError> {
        self.store
            .update(id, patch)
            .await?
            .ok_or_else(|| CustodyError::RecordNotFound { id: id.clone() })
    }

    /// Delete a reservation whose mint will never confirm. Deletion errors
    /// are logged, not surfaced; the caller already has a better error.
    async fn discard_reservation(&self, id: &VibeId, reason: &str) {
        tracing::warn!(vibe = %id, reason, "discarding mint reservation");
        if let Err(error) = self.store.delete(id).await {
            tracing::error!(vibe = %id, %error, "failed to discard reservation");
        }
    }
}

/// Parse a caller-supplied wallet address.
fn parse_wallet(address: &str) -> Result<Pubkey, CustodyError> {
    Pubkey::from_str(address).map_err(|_| {
        CustodyError::Validation(ValidationError::MalformedAddress {
            value: address.to_owned(),
        })
    })
}

/// Parse an asset address we stored ourselves; failure means corruption.
fn parse_asset_key(id: &VibeId, address: &str) -> Result<Pubkey, CustodyError> {
    Pubkey::from_str(address).map_err(|_| {
        CustodyError::Store(StoreError::Corrupt {
            id: id.clone(),
            detail: format!("asset address {address:?} is not a valid public key"),
        })
    })
}

/// The record's asset address, as stored and as an on-chain key.
fn minted_asset(record: &CustodyRecord) -> Result<(String, Pubkey), CustodyError> {
    let address = record
        .asset_address
        .clone()
        .ok_or(CustodyError::NotMinted {
            id: record.id.clone(),
        })?;
    let key = parse_asset_key(&record.id, &address)?;
    Ok((address, key))
}

// ─── Tests ───────────────────────────────────────────────────────────
