//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "VibeVault API",
        version = "0.1.0",
        description = "Custody and transaction lifecycle for vibes: collectibles minted to a social handle, held in a vault, and released when the handle's owner claims them.",
        license(name = "MIT")
    ),
    paths(
        // Vibes (public)
        crate::routes::vibes::prepare_vibe,
        crate::routes::vibes::confirm_vibe,
        crate::routes::vibes::get_vibe,
        crate::routes::vibes::vibe_metadata,
        // Claims (session)
        crate::routes::claims::pending_vibe,
        crate::routes::claims::prepare_claim,
        crate::routes::claims::confirm_claim,
    ),
    components(schemas(
        // Error types
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        // Vibe DTOs
        crate::routes::vibes::PrepareVibeRequest,
        crate::routes::vibes::ConfirmVibeRequest,
        crate::routes::vibes::PrepareVibeResponse,
        crate::routes::vibes::ConfirmVibeResponse,
        crate::routes::vibes::VibeView,
        // Claim DTOs
        crate::routes::claims::PrepareClaimRequest,
        crate::routes::claims::ConfirmClaimRequest,
        crate::routes::claims::PrepareClaimResponse,
        crate::routes::claims::ConfirmClaimResponse,
        crate::routes::claims::PendingVibeResponse,
    )),
    tags(
        (name = "vibes", description = "Mint lifecycle and public vibe pages"),
        (name = "claims", description = "Session-guarded claim lifecycle"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
///
/// Serves the OpenAPI JSON spec at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
