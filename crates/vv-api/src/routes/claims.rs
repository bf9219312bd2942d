//! # Vibe Claim API
//!
//! The recipient-facing half of the lifecycle. Every route here sits
//! behind the session middleware: the caller must prove control of a
//! handle before asking what the vault holds for it, and the custody
//! layer re-checks that handle against the record on prepare.
//!
//! ## Endpoints
//!
//! - `GET /v1/vibes/pending` — what the vault holds for the session handle
//! - `POST /v1/vibes/claim/prepare` — compose the claim transaction
//! - `POST /v1/vibes/claim/confirm` — submit the signed claim, wait for confirmation

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use vv_core::VibeId;
use vv_custody::{ConfirmedClaim, HandleVibe, PreparedClaim};

use crate::auth::VerifiedSession;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

// ── Request/Response DTOs ───────────────────────────────────────────

/// Request to compose the claim transaction for a held vibe.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PrepareClaimRequest {
    /// Identifier of the vibe to claim.
    pub record_id: String,
    /// Wallet the collectible should land in, base58. Pays the claim fee.
    pub claimer_address: String,
}

impl Validate for PrepareClaimRequest {
    fn validate(&self) -> Result<(), String> {
        if self.record_id.trim().is_empty() {
            return Err("record_id must not be empty".to_string());
        }
        if self.claimer_address.trim().is_empty() {
            return Err("claimer_address must not be empty".to_string());
        }
        Ok(())
    }
}

/// Request to submit a claimer-signed claim transaction.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ConfirmClaimRequest {
    /// Identifier of the vibe being claimed.
    pub record_id: String,
    /// Wallet the collectible lands in, base58. Must match the prepared
    /// transaction's destination.
    pub claimer_address: String,
    /// The prepared transaction, now fully signed, base64.
    pub signed_transaction: String,
    /// Expiry height returned by the prepare call.
    pub last_valid_block_height: u64,
}

impl Validate for ConfirmClaimRequest {
    fn validate(&self) -> Result<(), String> {
        if self.record_id.trim().is_empty() {
            return Err("record_id must not be empty".to_string());
        }
        if self.claimer_address.trim().is_empty() {
            return Err("claimer_address must not be empty".to_string());
        }
        if self.signed_transaction.trim().is_empty() {
            return Err("signed_transaction must not be empty".to_string());
        }
        if self.last_valid_block_height == 0 {
            return Err("last_valid_block_height must be positive".to_string());
        }
        Ok(())
    }
}

/// A composed claim transaction awaiting the claimer's signature.
#[derive(Debug, Serialize, ToSchema)]
pub struct PrepareClaimResponse {
    /// Base64 transaction blob to sign and send back via confirm.
    pub transaction_base64: String,
    /// Blockhash the transaction was built against.
    pub blockhash: String,
    /// Height after which the transaction can no longer land.
    pub last_valid_block_height: u64,
    /// Mint address of the collectible being claimed, base58.
    pub asset_address: String,
    /// Service fee the claimer pays, in lamports.
    pub fee_lamports: u64,
}

impl From<PreparedClaim> for PrepareClaimResponse {
    fn from(prepared: PreparedClaim) -> Self {
        Self {
            transaction_base64: prepared.transaction_base64,
            blockhash: prepared.blockhash,
            last_valid_block_height: prepared.last_valid_block_height,
            asset_address: prepared.asset_address,
            fee_lamports: prepared.fee_lamports,
        }
    }
}

/// A confirmed claim: the collectible left the vault.
#[derive(Debug, Serialize, ToSchema)]
pub struct ConfirmClaimResponse {
    /// Confirmed transaction signature, base58.
    pub signature: String,
}

impl From<ConfirmedClaim> for ConfirmClaimResponse {
    fn from(confirmed: ConfirmedClaim) -> Self {
        Self {
            signature: confirmed.signature,
        }
    }
}

/// What the vault holds for the authenticated handle.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PendingVibeResponse {
    /// A vibe is waiting for this handle to claim it.
    Claimable {
        /// The record identifier.
        id: String,
        /// Shareable vibe page URL.
        vibe_url: String,
        /// Masked sender wallet, for display.
        masked_sender: String,
    },
    /// The handle already claimed its vibe.
    Claimed {
        /// The record identifier.
        id: String,
        /// Shareable vibe page URL.
        vibe_url: String,
        /// Mint address of the claimed collectible, base58.
        asset_address: String,
        /// Block explorer URL for the collectible.
        explorer_url: String,
    },
    /// Nothing is addressed to this handle.
    None,
}

impl From<Option<HandleVibe>> for PendingVibeResponse {
    fn from(held: Option<HandleVibe>) -> Self {
        match held {
            Some(HandleVibe::Claimable {
                id,
                vibe_url,
                masked_sender,
            }) => Self::Claimable {
                id: id.to_string(),
                vibe_url,
                masked_sender,
            },
            Some(HandleVibe::Claimed {
                id,
                vibe_url,
                asset_address,
                explorer_url,
            }) => Self::Claimed {
                id: id.to_string(),
                vibe_url,
                asset_address,
                explorer_url,
            },
            None => Self::None,
        }
    }
}

// ── Router ──────────────────────────────────────────────────────────

/// Build the claim router. The caller layers the session middleware on
/// top; nothing here is reachable without a verified handle.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/vibes/pending", get(pending_vibe))
        .route("/v1/vibes/claim/prepare", post(prepare_claim))
        .route("/v1/vibes/claim/confirm", post(confirm_claim))
}

// ── Handlers ────────────────────────────────────────────────────────

/// GET /v1/vibes/pending — What the vault holds for the session handle.
#[utoipa::path(
    get,
    path = "/v1/vibes/pending",
    responses(
        (status = 200, description = "Vault contents for the session handle", body = PendingVibeResponse),
        (status = 401, description = "No verified session", body = crate::error::ErrorBody),
    ),
    tag = "claims"
)]
async fn pending_vibe(
    State(state): State<AppState>,
    session: VerifiedSession,
) -> Result<Json<PendingVibeResponse>, AppError> {
    let held = state.custody.pending_for_handle(&session.handle).await?;
    Ok(Json(PendingVibeResponse::from(held)))
}

/// POST /v1/vibes/claim/prepare — Compose the claim transaction.
#[utoipa::path(
    post,
    path = "/v1/vibes/claim/prepare",
    request_body = PrepareClaimRequest,
    responses(
        (status = 200, description = "Transaction composed, awaiting claimer signature", body = PrepareClaimResponse),
        (status = 401, description = "No verified session", body = crate::error::ErrorBody),
        (status = 403, description = "Vibe is addressed to a different handle", body = crate::error::ErrorBody),
        (status = 404, description = "No such vibe", body = crate::error::ErrorBody),
        (status = 409, description = "Already claimed, or mint not confirmed", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
        (status = 502, description = "Chain unavailable", body = crate::error::ErrorBody),
    ),
    tag = "claims"
)]
async fn prepare_claim(
    State(state): State<AppState>,
    session: VerifiedSession,
    body: Result<Json<PrepareClaimRequest>, JsonRejection>,
) -> Result<Json<PrepareClaimResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let id = VibeId::parse(&req.record_id)?;
    let prepared = state
        .custody
        .prepare_claim(&id, &req.claimer_address, &session.handle)
        .await?;
    Ok(Json(PrepareClaimResponse::from(prepared)))
}

/// POST /v1/vibes/claim/confirm — Submit the signed claim and wait for
/// confirmation.
#[utoipa::path(
    post,
    path = "/v1/vibes/claim/confirm",
    request_body = ConfirmClaimRequest,
    responses(
        (status = 200, description = "Claim confirmed, collectible released", body = ConfirmClaimResponse),
        (status = 401, description = "No verified session", body = crate::error::ErrorBody),
        (status = 404, description = "No such vibe", body = crate::error::ErrorBody),
        (status = 409, description = "Already claimed, or mint not confirmed", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
        (status = 502, description = "Chain rejected or transaction expired", body = crate::error::ErrorBody),
        (status = 504, description = "Confirmation still pending at timeout", body = crate::error::ErrorBody),
    ),
    tag = "claims"
)]
async fn confirm_claim(
    State(state): State<AppState>,
    // Extraction alone enforces the session; ownership was already bound
    // into the transaction at prepare time.
    _session: VerifiedSession,
    body: Result<Json<ConfirmClaimRequest>, JsonRejection>,
) -> Result<Json<ConfirmClaimResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let id = VibeId::parse(&req.record_id)?;
    let confirmed = state
        .custody
        .confirm_claim(
            &id,
            &req.claimer_address,
            &req.signed_transaction,
            req.last_valid_block_height,
        )
        .await?;
    metrics::counter!("vibes_claimed_total").increment(1);
    Ok(Json(ConfirmClaimResponse::from(confirmed)))
}
