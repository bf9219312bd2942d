//! # vv-core — Foundational Types for VibeVault
//!
//! This crate is the bedrock of the VibeVault workspace. It defines the
//! domain primitives every other crate builds on: the short shareable vibe
//! identifier, the normalized recipient handle, and the wallet-address
//! masking used everywhere a sender address is shown publicly.
//! Every other crate in the workspace depends on `vv-core`; it depends on
//! nothing internal and performs no I/O.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `VibeId` and `Handle` are
//!    newtypes with validated constructors. No bare strings for identifiers,
//!    so an unvalidated handle cannot reach a lookup or a transaction label.
//!
//! 2. **Normalization at the boundary.** A `Handle` strips the leading `@`
//!    and trims whitespace at construction; case-insensitive comparison is a
//!    method on the type, not a convention callers must remember.
//!
//! 3. **Unambiguous identifier alphabet.** `VibeId` draws from a 31-character
//!    alphabet with `0`, `O`, `1`, `l`, `I` removed, because the identifier
//!    ends up in URLs people read out loud.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `vv-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug`, `Clone`, and implement
//!   `Serialize`/`Deserialize`.

pub mod error;
pub mod handle;
pub mod id;
pub mod wallet;

// Re-export primary types for ergonomic imports.
pub use error::ValidationError;
pub use handle::Handle;
pub use id::VibeId;
pub use wallet::mask_address;
