//! # Session Authentication Middleware
//!
//! The claim side of the API must know which handle the caller has proven
//! control of. Proof arrives as a bearer credential:
//!
//! ```text
//! Bearer {handle}:{secret}
//! ```
//!
//! The middleware hands the whole credential to an [`IdentityVerifier`]
//! and never interprets it itself, so a deployment can swap the bundled
//! [`SharedSecretVerifier`] for one that checks real platform sessions
//! without touching any route.
//!
//! ## VerifiedSession
//!
//! Every verified request gets a [`VerifiedSession`] injected into the
//! request extensions. Handlers extract it via the `FromRequestParts` impl.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use subtle::ConstantTimeEq;

use vv_core::Handle;
use vv_custody::{IdentityVerifier, VerifyError};

use crate::error::{AppError, ErrorBody, ErrorDetail};

// ── VerifiedSession ─────────────────────────────────────────────────────────

/// The handle the session middleware established for this request.
///
/// Only present on requests that passed [`session_middleware`]; routes that
/// take this extractor are therefore unreachable without a valid credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSession {
    /// The handle the caller proved control of.
    pub handle: Handle,
}

/// Extracts the session that the middleware injected into extensions.
/// Returns 401 if none is present (middleware didn't run or failed).
impl<S: Send + Sync> FromRequestParts<S> for VerifiedSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<VerifiedSession>()
            .cloned()
            .ok_or_else(|| AppError::Unauthenticated("no verified session on request".into()))
    }
}

// ── Verifier wiring ─────────────────────────────────────────────────────────

/// Verifier handle injected into request extensions for the middleware.
#[derive(Clone)]
pub struct SessionAuth {
    verifier: Arc<dyn IdentityVerifier>,
}

impl SessionAuth {
    pub fn new(verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self { verifier }
    }
}

impl std::fmt::Debug for SessionAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionAuth").finish_non_exhaustive()
    }
}

/// Shared-secret verifier for deployments without a platform session bridge.
///
/// Accepts `{handle}:{secret}` credentials: the secret half must match the
/// configured value, the handle half is taken at its word. That makes the
/// secret the only gate, which is acceptable for development and staging;
/// production is expected to supply a verifier that checks a real session.
///
/// Custom `Debug` redacts the secret to prevent credential leakage in logs.
#[derive(Clone)]
pub struct SharedSecretVerifier {
    secret: String,
}

impl SharedSecretVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for SharedSecretVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSecretVerifier")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl IdentityVerifier for SharedSecretVerifier {
    async fn verify(&self, credential: &str) -> Result<Handle, VerifyError> {
        // Handles never contain ':', so the first colon is the separator
        // and the secret half may itself contain colons.
        let (handle_part, secret_part) = credential
            .split_once(':')
            .ok_or(VerifyError::InvalidCredential)?;

        if !constant_time_secret_eq(secret_part, &self.secret) {
            return Err(VerifyError::InvalidCredential);
        }

        Handle::parse(handle_part).map_err(|_| VerifyError::InvalidCredential)
    }
}

/// Constant-time comparison of session secrets.
///
/// Prevents timing side-channels that could reveal secret length or prefix.
/// When lengths differ, performs a dummy comparison to avoid leaking length
/// information through timing variance.
fn constant_time_secret_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        // Dummy comparison to keep timing constant regardless of length match.
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

// ── Middleware ──────────────────────────────────────────────────────────────

/// Extract the bearer credential from the Authorization header and resolve
/// it to a handle via the configured [`IdentityVerifier`].
///
/// On success the resulting [`VerifiedSession`] is injected into request
/// extensions for downstream handlers. There is no bypass mode: a request
/// without a verifiable credential never reaches a session-guarded route.
pub async fn session_middleware(mut request: Request, next: Next) -> Response {
    let Some(auth) = request.extensions().get::<SessionAuth>().cloned() else {
        // Router wiring bug, not a caller mistake. Fail closed.
        tracing::error!("session middleware running without a SessionAuth extension");
        return unauthorized_response("session verification unavailable");
    };

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(header_value) if header_value.starts_with("Bearer ") => {
            let credential = &header_value[7..];
            match auth.verifier.verify(credential).await {
                Ok(handle) => {
                    tracing::debug!(handle = %handle, "session verified");
                    request.extensions_mut().insert(VerifiedSession { handle });
                    next.run(request).await
                }
                Err(err) => {
                    tracing::warn!(reason = %err, "session verification failed");
                    unauthorized_response(&err.to_string())
                }
            }
        }
        Some(_) => {
            tracing::warn!("session verification failed: non-Bearer authorization scheme");
            unauthorized_response("authorization header must use Bearer scheme")
        }
        None => {
            tracing::warn!("session verification failed: missing authorization header");
            unauthorized_response("missing authorization header")
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHENTICATED".to_string(),
            message: message.to_string(),
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
