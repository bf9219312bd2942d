//! # Vibe Mint & Display API
//!
//! The sender-facing half of the lifecycle: reserve a record, get a mint
//! transaction to sign, confirm it, and render the public vibe page. No
//! session required — the sender proves themselves by signing with their
//! wallet, and the vibe page must stay reachable from a bare share link.
//!
//! ## Endpoints
//!
//! - `POST /v1/vibes/prepare` — reserve a record, compose the mint transaction
//! - `POST /v1/vibes/confirm` — submit the signed mint, wait for confirmation
//! - `GET /v1/vibes/{id}` — public vibe page data
//! - `GET /v1/vibes/{id}/metadata` — collectible metadata document

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use vv_chain::Pubkey;
use vv_core::VibeId;
use vv_custody::{ConfirmedMint, CustodyConfig, CustodyRecord, PreparedMint};

use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

// ── Request/Response DTOs ───────────────────────────────────────────

/// Request to reserve a vibe and compose its mint transaction.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PrepareVibeRequest {
    /// Social handle the collectible is addressed to, with or without `@`.
    pub recipient_handle: String,
    /// Sender wallet address, base58. Pays the mint and the service fee.
    pub sender_address: String,
}

impl Validate for PrepareVibeRequest {
    fn validate(&self) -> Result<(), String> {
        if self.recipient_handle.trim().is_empty() {
            return Err("recipient_handle must not be empty".to_string());
        }
        if self.sender_address.trim().is_empty() {
            return Err("sender_address must not be empty".to_string());
        }
        Ok(())
    }
}

/// Request to submit a sender-signed mint transaction.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ConfirmVibeRequest {
    /// Identifier returned by the prepare call.
    pub record_id: String,
    /// The prepared transaction, now fully signed, base64.
    pub signed_transaction: String,
    /// Expiry height returned by the prepare call.
    pub last_valid_block_height: u64,
}

impl Validate for ConfirmVibeRequest {
    fn validate(&self) -> Result<(), String> {
        if self.record_id.trim().is_empty() {
            return Err("record_id must not be empty".to_string());
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

/// A composed mint transaction awaiting the sender's signature.
#[derive(Debug, Serialize, ToSchema)]
pub struct PrepareVibeResponse {
    /// Identifier of the reserved custody record.
    pub record_id: String,
    /// Base64 transaction blob to sign and send back via confirm.
    pub transaction_base64: String,
    /// Blockhash the transaction was built against.
    pub blockhash: String,
    /// Height after which the transaction can no longer land.
    pub last_valid_block_height: u64,
    /// Mint address the collectible will occupy, base58.
    pub asset_address: String,
    /// Service fee the sender pays, in lamports.
    pub fee_lamports: u64,
}

impl From<PreparedMint> for PrepareVibeResponse {
    fn from(prepared: PreparedMint) -> Self {
        Self {
            record_id: prepared.record_id.to_string(),
            transaction_base64: prepared.transaction_base64,
            blockhash: prepared.blockhash,
            last_valid_block_height: prepared.last_valid_block_height,
            asset_address: prepared.asset_address,
            fee_lamports: prepared.fee_lamports,
        }
    }
}

/// A confirmed mint: the collectible now sits in the vault.
#[derive(Debug, Serialize, ToSchema)]
pub struct ConfirmVibeResponse {
    /// Mint address of the collectible, base58.
    pub asset_address: String,
    /// Confirmed transaction signature, base58.
    pub signature: String,
    /// Shareable vibe page URL for the sender to post.
    pub vibe_url: String,
}

impl From<ConfirmedMint> for ConfirmVibeResponse {
    fn from(confirmed: ConfirmedMint) -> Self {
        Self {
            asset_address: confirmed.asset_address,
            signature: confirmed.signature,
            vibe_url: confirmed.vibe_url,
        }
    }
}

/// Public view of a vibe, safe to render on the share page.
///
/// The sender appears only in masked form and the claimer's wallet is not
/// exposed at all.
#[derive(Debug, Serialize, ToSchema)]
pub struct VibeView {
    /// Record identifier.
    pub id: String,
    /// Handle the collectible is addressed to, without `@`.
    pub recipient_handle: String,
    /// Masked sender wallet, for display.
    pub masked_sender: String,
    /// Lifecycle status: "pending" or "claimed".
    pub status: String,
    /// Mint address once the mint confirmed, base58.
    pub asset_address: Option<String>,
    /// Position in the overall mint sequence, once confirmed.
    pub sequence_number: Option<i64>,
    /// Canonical shareable URL of this page.
    pub vibe_url: String,
    /// Block explorer URL for the collectible, once minted.
    pub explorer_url: Option<String>,
    /// Artwork URL.
    pub image_url: String,
    /// Metadata document URL, once published.
    pub metadata_url: Option<String>,
    /// When the vibe was created.
    pub created_at: DateTime<Utc>,
    /// When the vibe was claimed, if it has been.
    pub claimed_at: Option<DateTime<Utc>>,
}

impl VibeView {
    fn from_record(record: CustodyRecord, config: &CustodyConfig) -> Self {
        let vibe_url = config.vibe_url(&record.id);
        let explorer_url = record
            .asset_address
            .as_deref()
            .and_then(|addr| addr.parse::<Pubkey>().ok())
            .map(|key| config.explorer_token_url(&key));
        let image_url = record
            .image_pointer
            .clone()
            .unwrap_or_else(|| config.media_image_url(&record.id));

        Self {
            id: record.id.to_string(),
            recipient_handle: record.recipient_handle.as_str().to_string(),
            masked_sender: record.masked_sender,
            status: record.status.to_string(),
            asset_address: record.asset_address,
            sequence_number: record.sequence_number,
            vibe_url,
            explorer_url,
            image_url,
            metadata_url: record.metadata_pointer,
            created_at: record.created_at,
            claimed_at: record.claimed_at,
        }
    }
}

// ── Router ──────────────────────────────────────────────────────────

/// Build the public vibe router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/vibes/prepare", post(prepare_vibe))
        .route("/v1/vibes/confirm", post(confirm_vibe))
        .route("/v1/vibes/{id}", get(get_vibe))
        .route("/v1/vibes/{id}/metadata", get(vibe_metadata))
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /v1/vibes/prepare — Reserve a record and compose the mint transaction.
#[utoipa::path(
    post,
    path = "/v1/vibes/prepare",
    request_body = PrepareVibeRequest,
    responses(
        (status = 200, description = "Transaction composed, awaiting sender signature", body = PrepareVibeResponse),
        (status = 409, description = "Handle already has a live vibe", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
        (status = 502, description = "Chain unavailable", body = crate::error::ErrorBody),
    ),
    tag = "vibes"
)]
async fn prepare_vibe(
    State(state): State<AppState>,
    body: Result<Json<PrepareVibeRequest>, JsonRejection>,
) -> Result<Json<PrepareVibeResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let prepared = state
        .custody
        .prepare_mint(&req.recipient_handle, &req.sender_address)
        .await?;
    Ok(Json(PrepareVibeResponse::from(prepared)))
}

/// POST /v1/vibes/confirm — Submit the signed mint and wait for confirmation.
#[utoipa::path(
    post,
    path = "/v1/vibes/confirm",
    request_body = ConfirmVibeRequest,
    responses(
        (status = 200, description = "Mint confirmed, collectible in custody", body = ConfirmVibeResponse),
        (status = 404, description = "No such record", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
        (status = 502, description = "Chain rejected or transaction expired", body = crate::error::ErrorBody),
        (status = 504, description = "Confirmation still pending at timeout", body = crate::error::ErrorBody),
    ),
    tag = "vibes"
)]
async fn confirm_vibe(
    State(state): State<AppState>,
    body: Result<Json<ConfirmVibeRequest>, JsonRejection>,
) -> Result<Json<ConfirmVibeResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let id = VibeId::parse(&req.record_id)?;
    let confirmed = state
        .custody
        .confirm_mint(&id, &req.signed_transaction, req.last_valid_block_height)
        .await?;
    metrics::counter!("vibes_minted_total").increment(1);
    Ok(Json(ConfirmVibeResponse::from(confirmed)))
}

/// GET /v1/vibes/{id} — Public vibe page data.
#[utoipa::path(
    get,
    path = "/v1/vibes/{id}",
    params(("id" = String, Path, description = "Vibe identifier")),
    responses(
        (status = 200, description = "Vibe found", body = VibeView),
        (status = 404, description = "No such vibe", body = crate::error::ErrorBody),
        (status = 422, description = "Malformed identifier", body = crate::error::ErrorBody),
    ),
    tag = "vibes"
)]
async fn get_vibe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VibeView>, AppError> {
    let id = VibeId::parse(&id)?;
    let record = state.custody.record(&id).await?;
    Ok(Json(VibeView::from_record(record, &state.config)))
}

/// GET /v1/vibes/{id}/metadata — The collectible's metadata document.
///
/// Served under the placeholder pointer baked into the mint, so wallets
/// resolve it from the moment the collectible exists. The document is
/// composed fresh from the record until the claim finalizes it, at which
/// point it never changes again and is marked immutable for caches.
#[utoipa::path(
    get,
    path = "/v1/vibes/{id}/metadata",
    params(("id" = String, Path, description = "Vibe identifier")),
    responses(
        (status = 200, description = "Metadata document"),
        (status = 404, description = "No such vibe", body = crate::error::ErrorBody),
        (status = 422, description = "Malformed identifier", body = crate::error::ErrorBody),
    ),
    tag = "vibes"
)]
async fn vibe_metadata(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = VibeId::parse(&id)?;
    let record = state.custody.record(&id).await?;
    let document = state.custody.metadata_document(&id).await?;

    // Final once the claim has landed and the media pipeline published the
    // real artwork; until then caches must revalidate quickly.
    let cache_control = if record.is_claimed() && record.image_pointer.is_some() {
        "public, max-age=31536000, immutable"
    } else {
        "public, max-age=60"
    };

    Ok(([(header::CACHE_CONTROL, cache_control)], Json(document)))
}
