//! # vv-chain — Solana Plumbing for VibeVault
//!
//! Everything that touches the Solana cluster lives here: the JSON-RPC
//! client, the custodian keypair, transaction composition for mints and
//! claims, and the submit-then-poll confirmation loop. Custody logic sees
//! none of that directly; it talks to the [`ChainGateway`] trait and deals
//! in base64 blobs and [`SubmitOutcome`]s.
//!
//! ## Key Design Principles
//!
//! 1. **Reads retry, sends do not.** Idempotent RPC queries go through a
//!    small backoff loop; `sendTransaction` is issued exactly once, and a
//!    duplicate-send rejection is treated as evidence the first one
//!    arrived.
//! 2. **Confirmation is bounded polling.** No subscriptions. A submitted
//!    transaction ends as `Confirmed`, `Failed`, `Expired` or `TimedOut`,
//!    and a timeout is reported as the ambiguity it is.
//! 3. **The custodian signs early, the wallet signs last.** Composed
//!    transactions leave here partially signed with the fee payer slot
//!    empty.
//!
//! ## Crate Policy
//!
//! - No panics in non-test code; fallible signing uses the `try_` variants.
//! - The custodian secret never appears in `Debug` output or logs.
//! - No custody or HTTP-API types; this crate knows only Solana.

pub mod cluster;
pub mod compose;
pub mod error;
pub mod fees;
pub mod gateway;
mod retry;
pub mod rpc;
pub mod signer;
pub mod submit;
pub mod wire;

pub use cluster::Cluster;
pub use compose::{AssetMetadata, MintAccountSpace, ASSET_DECIMALS, ASSET_SUPPLY};
pub use error::ChainError;
pub use fees::{FeeSchedule, DEFAULT_CLAIM_FEE_LAMPORTS, DEFAULT_MINT_FEE_LAMPORTS};
pub use gateway::{
    ChainGateway, ClaimRequest, MintRequest, PreparedClaim, PreparedMint, SolanaGateway,
    VaultCustody,
};
pub use rpc::{BlockhashInfo, RpcClient, RpcConfig, TxStatus, DEFAULT_RPC_URL};
pub use signer::VaultKeypair;
pub use submit::{submit_and_confirm, ConfirmPolicy, SubmitOutcome};
pub use wire::{decode_transaction, encode_transaction, fee_payer_signature};

// Downstream crates name addresses and signatures without depending on the
// Solana SDK themselves.
pub use solana_sdk::pubkey::Pubkey;
pub use solana_sdk::signature::Signature;
