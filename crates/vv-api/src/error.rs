//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps custody and verification errors to HTTP status codes and JSON
//! bodies with machine-readable codes, so callers can tell "retry the
//! same call" from "rebuild the transaction" from "give up". Internal
//! failure detail is logged but never returned to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use vv_custody::{CustodyError, VerifyError};

/// Structured JSON error response body.
///
/// All error responses use this format for consistency across the API
/// surface.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "ALREADY_CLAIMED", "CHAIN_REJECTED").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
///
/// The conflict and chain classes carry distinct codes rather than one
/// generic CONFLICT/UPSTREAM, because the caller's next move differs:
/// `ALREADY_VIBED` means pick another handle, `TRANSACTION_EXPIRED` means
/// rebuild via prepare, `CONFIRMATION_TIMEOUT` means poll before anything
/// else.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request body could not be parsed (422).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Request failed validation (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Missing or invalid session credential (401).
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Authenticated, but not as the handle this vibe is addressed to (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// No record with the requested identifier (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The handle already has a live vibe (409).
    #[error("conflict: {0}")]
    AlreadyVibed(String),

    /// The vibe already reached its terminal claimed state (409).
    #[error("conflict: {0}")]
    AlreadyClaimed(String),

    /// The vibe has no confirmed collectible to claim yet (409).
    #[error("conflict: {0}")]
    NotMinted(String),

    /// The RPC node is unreachable; retrying the same call may work (502).
    #[error("chain unavailable: {0}")]
    ChainUnavailable(String),

    /// The chain refused the transaction; the caller must rebuild (502).
    #[error("chain rejected: {0}")]
    ChainRejected(String),

    /// The transaction outlived its blockhash; the caller must rebuild (502).
    #[error("transaction expired: {0}")]
    TransactionExpired(String),

    /// Confirmation polling hit its ceiling; the outcome is unknown and the
    /// caller should poll before retrying anything (504).
    #[error("confirmation timeout: {0}")]
    ConfirmationTimeout(String),

    /// Internal server error (500). Message is logged but not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest(_) => (StatusCode::UNPROCESSABLE_ENTITY, "BAD_REQUEST"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "HANDLE_MISMATCH"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::AlreadyVibed(_) => (StatusCode::CONFLICT, "ALREADY_VIBED"),
            Self::AlreadyClaimed(_) => (StatusCode::CONFLICT, "ALREADY_CLAIMED"),
            Self::NotMinted(_) => (StatusCode::CONFLICT, "NOT_MINTED"),
            Self::ChainUnavailable(_) => (StatusCode::BAD_GATEWAY, "CHAIN_UNAVAILABLE"),
            Self::ChainRejected(_) => (StatusCode::BAD_GATEWAY, "CHAIN_REJECTED"),
            Self::TransactionExpired(_) => (StatusCode::BAD_GATEWAY, "TRANSACTION_EXPIRED"),
            Self::ConfirmationTimeout(_) => (StatusCode::GATEWAY_TIMEOUT, "CONFIRMATION_TIMEOUT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal failure detail to clients. Chain errors
        // stay verbatim: the caller needs them to decide retry vs rebuild.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        // Log server-side errors for operator visibility.
        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::ChainUnavailable(_) => tracing::warn!(error = %self, "chain unavailable"),
            Self::ConfirmationTimeout(_) => tracing::warn!(error = %self, "confirmation timed out"),
            Self::ChainRejected(_) | Self::TransactionExpired(_) => {
                tracing::info!(error = %self, "chain refused transaction")
            }
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Convert core validation errors (handle, address, identifier parsing)
/// to API errors.
impl From<vv_core::ValidationError> for AppError {
    fn from(err: vv_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Convert custody errors to API errors, variant by variant. Each custody
/// class has exactly one HTTP rendering.
impl From<CustodyError> for AppError {
    fn from(err: CustodyError) -> Self {
        match &err {
            CustodyError::Validation(_) => Self::Validation(err.to_string()),
            CustodyError::Unauthorized { .. } => Self::Forbidden(err.to_string()),
            CustodyError::AlreadyVibed { .. } => Self::AlreadyVibed(err.to_string()),
            CustodyError::AlreadyClaimed { .. } => Self::AlreadyClaimed(err.to_string()),
            CustodyError::NotMinted { .. } => Self::NotMinted(err.to_string()),
            CustodyError::RecordNotFound { .. } => Self::NotFound(err.to_string()),
            CustodyError::Network(_) => Self::ChainUnavailable(err.to_string()),
            CustodyError::ChainRejected { .. } => Self::ChainRejected(err.to_string()),
            CustodyError::TransactionExpired => Self::TransactionExpired(err.to_string()),
            CustodyError::Ambiguous { .. } => Self::ConfirmationTimeout(err.to_string()),
            CustodyError::Store(_) | CustodyError::Media(_) => Self::Internal(err.to_string()),
        }
    }
}

/// Convert verification failures to 401s.
impl From<VerifyError> for AppError {
    fn from(err: VerifyError) -> Self {
        Self::Unauthenticated(err.to_string())
    }
}
