//! # vv-custody — Custody Domain for VibeVault
//!
//! The life of a vibe, from "someone typed a handle" to "the collectible
//! sits in its recipient's wallet". This crate owns the [`CustodyRecord`]
//! state machine, the seams to the outside world ([`VibeStore`],
//! [`MediaPipeline`], [`IdentityVerifier`]), and the [`CustodyService`]
//! that sequences mint and claim lifecycles across them.
//!
//! ## Key Design Principles
//!
//! 1. **The chain is the source of truth for custody.** The record store
//!    is a cache of intent and outcome; whenever the two disagree, the
//!    service reads the vault's token account and heals the record, never
//!    the other way around.
//! 2. **State only moves on observed confirmations.** Callers deliver
//!    signed transactions; this crate submits them and believes nothing it
//!    did not watch confirm.
//! 3. **Compensation over partial state.** A mint that cannot confirm
//!    takes its reservation with it; media and pointer updates that fail
//!    leave a degraded but fully functional collectible behind.
//!
//! ## Crate Policy
//!
//! - No panics in non-test code.
//! - Full wallet addresses appear in records and composed transactions
//!   only; anything rendered for display goes through the mask.

pub mod config;
pub mod media;
pub mod record;
pub mod service;
pub mod store;
pub mod verify;

pub use config::{CustodyConfig, BASE_URL_ENV, DEFAULT_BASE_URL};
pub use media::{
    FsMediaPipeline, MediaAssets, MediaError, MediaPipeline, MetadataAttribute, VibeMetadata,
};
pub use record::{ClaimStatus, CustodyRecord, CustodyStateError};
pub use service::{
    ConfirmedClaim, ConfirmedMint, CustodyError, CustodyService, HandleVibe, PreparedClaim,
    PreparedMint, ASSET_SYMBOL,
};
pub use store::{MemoryVibeStore, RecordPatch, StoreError, VibeStore};
pub use verify::{IdentityVerifier, VerifyError};
