//! # Integration Tests for vv-api
//!
//! Drives the assembled router over a fake chain gateway and a real
//! on-disk media pipeline: the mint and claim lifecycles end to end,
//! session enforcement, error code mapping, the public vibe page, and
//! OpenAPI spec generation.

use std::collections::VecDeque;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use solana_sdk::hash::Hash;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::signer::Signer;
use solana_sdk::system_instruction;
use solana_sdk::transaction::Transaction;
use tempfile::TempDir;
use tower::ServiceExt;

use vv_api::auth::SharedSecretVerifier;
use vv_api::state::AppState;
use vv_chain::{
    encode_transaction, ChainError, ChainGateway, ClaimRequest, Cluster, MintRequest,
    PreparedClaim, PreparedMint, Pubkey, SubmitOutcome, VaultCustody,
};
use vv_custody::{
    CustodyConfig, CustodyService, FsMediaPipeline, IdentityVerifier, MemoryVibeStore,
};

const SECRET: &str = "test-secret";
const SENDER: &str = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin";
const CLAIMER: &str = "So11111111111111111111111111111111111111112";

// ── Chain gateway double ──────────────────────────────────────────────

/// Canned transactions and scriptable submit outcomes.
struct FakeGateway {
    asset: Pubkey,
    vault: Pubkey,
    custody: Mutex<VaultCustody>,
    outcomes: Mutex<VecDeque<Result<SubmitOutcome, ChainError>>>,
}

impl FakeGateway {
    fn new() -> Self {
        Self {
            asset: Pubkey::new_unique(),
            vault: Pubkey::new_unique(),
            custody: Mutex::new(VaultCustody::Held),
            outcomes: Mutex::new(VecDeque::new()),
        }
    }

    fn queue(&self, outcome: SubmitOutcome) {
        self.outcomes.lock().push_back(Ok(outcome));
    }

    fn queue_error(&self, error: ChainError) {
        self.outcomes.lock().push_back(Err(error));
    }

    fn set_custody(&self, custody: VaultCustody) {
        *self.custody.lock() = custody;
    }
}

#[async_trait::async_trait]
impl ChainGateway for FakeGateway {
    async fn build_mint(&self, _request: MintRequest) -> Result<PreparedMint, ChainError> {
        Ok(PreparedMint {
            transaction_base64: "bWludC10eA".into(),
            blockhash: "9sHcv6xwn9YkB8nxTUGKDwPwNnmqVp5oCrDz7NfNYTRn".into(),
            last_valid_block_height: 2100,
            asset_address: self.asset,
            fee_lamports: 2_000_000,
        })
    }

    async fn build_claim(&self, _request: ClaimRequest) -> Result<PreparedClaim, ChainError> {
        Ok(PreparedClaim {
            transaction_base64: "Y2xhaW0tdHg".into(),
            blockhash: "9sHcv6xwn9YkB8nxTUGKDwPwNnmqVp5oCrDz7NfNYTRn".into(),
            last_valid_block_height: 2200,
            fee_lamports: 1_000_000,
        })
    }

    async fn submit_and_confirm(
        &self,
        _transaction_base64: &str,
        _last_valid_block_height: u64,
    ) -> Result<SubmitOutcome, ChainError> {
        self.outcomes
            .lock()
            .pop_front()
            .unwrap_or(Ok(SubmitOutcome::Confirmed {
                signature: Signature::default(),
            }))
    }

    async fn vault_custody(&self, _asset_address: &Pubkey) -> Result<VaultCustody, ChainError> {
        Ok(*self.custody.lock())
    }

    async fn point_metadata(
        &self,
        _asset_address: &Pubkey,
        _uri: &str,
    ) -> Result<SubmitOutcome, ChainError> {
        Ok(SubmitOutcome::Confirmed {
            signature: Signature::from([9u8; 64]),
        })
    }

    fn vault_address(&self) -> Pubkey {
        self.vault
    }
}

// ── Harness ───────────────────────────────────────────────────────────

/// The full application over a fake chain and a real media tree on disk.
struct TestApp {
    app: axum::Router,
    chain: Arc<FakeGateway>,
    _media_dir: TempDir,
}

fn test_app() -> TestApp {
    let media_dir = TempDir::new().unwrap();
    let chain = Arc::new(FakeGateway::new());
    let config = CustodyConfig::new("https://vault.test", Cluster::Devnet);
    let media = Arc::new(FsMediaPipeline::new(media_dir.path(), &config.base_url));
    let custody = Arc::new(CustodyService::new(
        Arc::new(MemoryVibeStore::new()),
        chain.clone(),
        media,
        config.clone(),
    ));
    let verifier: Arc<dyn IdentityVerifier> = Arc::new(SharedSecretVerifier::new(SECRET));

    let state = AppState {
        custody,
        verifier,
        config,
        media_dir: media_dir.path().to_path_buf(),
        db_pool: None,
        metrics: None,
    };

    TestApp {
        app: vv_api::app(state),
        chain,
        _media_dir: media_dir,
    }
}

/// Helper: read response body as string.
async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Helper: read response body as JSON.
async fn body_json(response: axum::http::Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_auth(uri: &str, handle: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {handle}:{SECRET}"))
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_json_auth(uri: &str, handle: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {handle}:{SECRET}"))
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// A fully signed transaction blob. Claim confirms inspect the fee payer
/// signature slot before submitting, so canned strings are not enough.
fn signed_blob() -> String {
    let payer = Keypair::new();
    let instruction = system_instruction::transfer(&payer.pubkey(), &payer.pubkey(), 1);
    let mut tx = Transaction::new_with_payer(&[instruction], Some(&payer.pubkey()));
    tx.sign(&[&payer], Hash::new_unique());
    encode_transaction(&tx).unwrap()
}

/// Drive a vibe for `handle` through prepare and confirm; returns its id.
async fn minted_vibe(test: &TestApp, handle: &str) -> String {
    let response = test
        .app
        .clone()
        .oneshot(post_json(
            "/v1/vibes/prepare",
            serde_json::json!({"recipient_handle": handle, "sender_address": SENDER}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let prepared = body_json(response).await;
    let id = prepared["record_id"].as_str().unwrap().to_string();

    let response = test
        .app
        .clone()
        .oneshot(post_json(
            "/v1/vibes/confirm",
            serde_json::json!({
                "record_id": id,
                "signed_transaction": "c2lnbmVkLW1pbnQ",
                "last_valid_block_height": 2100,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    id
}

/// Drive a vibe for `handle` through mint and claim; returns its id.
async fn claimed_vibe(test: &TestApp, handle: &str) -> String {
    let id = minted_vibe(test, handle).await;
    let response = test
        .app
        .clone()
        .oneshot(post_json_auth(
            "/v1/vibes/claim/confirm",
            handle,
            serde_json::json!({
                "record_id": id,
                "claimer_address": CLAIMER,
                "signed_transaction": signed_blob(),
                "last_valid_block_height": 2200,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    id
}

// ── Health & infrastructure ───────────────────────────────────────────

#[tokio::test]
async fn test_liveness_probe() {
    let test = test_app();
    let response = test.app.oneshot(get("/health/liveness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_probe_without_database() {
    let test = test_app();
    let response = test.app.oneshot(get("/health/readiness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

#[tokio::test]
async fn test_metrics_endpoint_responds() {
    // No recorder installed in tests; the endpoint still answers.
    let test = test_app();
    let response = test.app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_openapi_spec_generation() {
    let test = test_app();
    let response = test.app.oneshot(get("/openapi.json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let spec = body_json(response).await;
    assert!(spec["openapi"].is_string());
    assert!(spec["info"]["title"].is_string());

    let paths = spec["paths"].as_object().unwrap();
    for expected in [
        "/v1/vibes/prepare",
        "/v1/vibes/confirm",
        "/v1/vibes/{id}",
        "/v1/vibes/{id}/metadata",
        "/v1/vibes/pending",
        "/v1/vibes/claim/prepare",
        "/v1/vibes/claim/confirm",
    ] {
        assert!(paths.contains_key(expected), "missing path: {expected}");
    }
}

// ── Mint lifecycle ────────────────────────────────────────────────────

#[tokio::test]
async fn test_prepare_vibe_returns_transaction() {
    let test = test_app();
    let response = test
        .app
        .clone()
        .oneshot(post_json(
            "/v1/vibes/prepare",
            serde_json::json!({"recipient_handle": "@alice", "sender_address": SENDER}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["record_id"].as_str().unwrap().len(), 8);
    assert_eq!(body["transaction_base64"], "bWludC10eA");
    assert_eq!(body["fee_lamports"], 2_000_000);
    assert_eq!(body["asset_address"], test.chain.asset.to_string());
    assert!(body["blockhash"].is_string());
    assert_eq!(body["last_valid_block_height"], 2100);
}

#[tokio::test]
async fn test_prepare_vibe_duplicate_handle_conflict() {
    let test = test_app();
    let response = test
        .app
        .clone()
        .oneshot(post_json(
            "/v1/vibes/prepare",
            serde_json::json!({"recipient_handle": "alice", "sender_address": SENDER}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Same handle in different casing is still the same recipient.
    let response = test
        .app
        .clone()
        .oneshot(post_json(
            "/v1/vibes/prepare",
            serde_json::json!({"recipient_handle": "ALICE", "sender_address": SENDER}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let err = body_json(response).await;
    assert_eq!(err["error"]["code"], "ALREADY_VIBED");
}

#[tokio::test]
async fn test_prepare_vibe_rejects_bad_input() {
    let test = test_app();

    // Handle with illegal characters.
    let response = test
        .app
        .clone()
        .oneshot(post_json(
            "/v1/vibes/prepare",
            serde_json::json!({"recipient_handle": "not a handle!", "sender_address": SENDER}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let err = body_json(response).await;
    assert_eq!(err["error"]["code"], "VALIDATION_ERROR");

    // Empty sender.
    let response = test
        .app
        .clone()
        .oneshot(post_json(
            "/v1/vibes/prepare",
            serde_json::json!({"recipient_handle": "alice", "sender_address": "  "}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_prepare_vibe_rejects_malformed_json() {
    let test = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/v1/vibes/prepare")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = test.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let err = body_json(response).await;
    assert_eq!(err["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_confirm_vibe_mints_and_publishes_media() {
    let test = test_app();
    let id = minted_vibe(&test, "alice").await;

    // The media pipeline wrote real files; ServeDir serves them.
    let response = test
        .app
        .clone()
        .oneshot(get(&format!("/media/vibes/{id}.svg")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = test
        .app
        .clone()
        .oneshot(get(&format!("/media/metadata/{id}.json")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The view now carries the uploaded pointers and the asset.
    let response = test
        .app
        .clone()
        .oneshot(get(&format!("/v1/vibes/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let view = body_json(response).await;
    assert_eq!(view["status"], "pending");
    assert_eq!(view["asset_address"], test.chain.asset.to_string());
    assert_eq!(
        view["image_url"],
        format!("https://vault.test/media/vibes/{id}.svg")
    );
    assert_eq!(
        view["metadata_url"],
        format!("https://vault.test/media/metadata/{id}.json")
    );
}

#[tokio::test]
async fn test_confirm_vibe_chain_rejection_frees_handle() {
    let test = test_app();
    let response = test
        .app
        .clone()
        .oneshot(post_json(
            "/v1/vibes/prepare",
            serde_json::json!({"recipient_handle": "alice", "sender_address": SENDER}),
        ))
        .await
        .unwrap();
    let id = body_json(response).await["record_id"]
        .as_str()
        .unwrap()
        .to_string();

    test.chain.queue_error(ChainError::Rpc {
        method: "sendTransaction".into(),
        code: -32002,
        message: "Blockhash not found".into(),
    });

    let response = test
        .app
        .clone()
        .oneshot(post_json(
            "/v1/vibes/confirm",
            serde_json::json!({
                "record_id": id,
                "signed_transaction": "c2lnbmVkLW1pbnQ",
                "last_valid_block_height": 2100,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let err = body_json(response).await;
    assert_eq!(err["error"]["code"], "CHAIN_REJECTED");

    // The reservation is gone and the handle is free again.
    let response = test
        .app
        .clone()
        .oneshot(get(&format!("/v1/vibes/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = test
        .app
        .clone()
        .oneshot(post_json(
            "/v1/vibes/prepare",
            serde_json::json!({"recipient_handle": "alice", "sender_address": SENDER}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_confirm_vibe_unknown_record() {
    let test = test_app();
    let response = test
        .app
        .oneshot(post_json(
            "/v1/vibes/confirm",
            serde_json::json!({
                "record_id": "abcd2345",
                "signed_transaction": "c2lnbmVkLW1pbnQ",
                "last_valid_block_height": 2100,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let err = body_json(response).await;
    assert_eq!(err["error"]["code"], "NOT_FOUND");
}

// ── Public vibe page ──────────────────────────────────────────────────

#[tokio::test]
async fn test_vibe_view_masks_sender() {
    let test = test_app();
    let id = minted_vibe(&test, "alice").await;

    let response = test
        .app
        .oneshot(get(&format!("/v1/vibes/{id}")))
        .await
        .unwrap();
    let raw = body_string(response).await;
    assert!(
        !raw.contains(SENDER),
        "full sender address leaked into the public view"
    );

    let view: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(view["masked_sender"], "9xQ…Fin");
    assert_eq!(view["recipient_handle"], "alice");
    assert_eq!(view["vibe_url"], format!("https://vault.test/v/{id}"));
    assert!(view["explorer_url"]
        .as_str()
        .unwrap()
        .contains("solscan.io/token/"));
}

#[tokio::test]
async fn test_vibe_view_unknown_and_malformed_ids() {
    let test = test_app();

    let response = test
        .app
        .clone()
        .oneshot(get("/v1/vibes/abcd2345"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Wrong length / alphabet never reaches the store.
    let response = test.app.oneshot(get("/v1/vibes/zzz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_vibe_metadata_document() {
    let test = test_app();
    let id = minted_vibe(&test, "alice").await;

    let response = test
        .app
        .oneshot(get(&format!("/v1/vibes/{id}/metadata")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    // Pending vibes may still change; caches must revalidate quickly.
    let cache = response
        .headers()
        .get("cache-control")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(cache, "public, max-age=60");

    let document = body_json(response).await;
    assert_eq!(document["name"], "Vibe for @alice");
    assert!(document["description"]
        .as_str()
        .unwrap()
        .contains("9xQ…Fin"));
    assert_eq!(
        document["external_url"],
        format!("https://vault.test/v/{id}")
    );
    assert!(document["attributes"].is_array());
}

#[tokio::test]
async fn test_claimed_metadata_is_immutable() {
    let test = test_app();
    let id = claimed_vibe(&test, "alice").await;

    let response = test
        .app
        .oneshot(get(&format!("/v1/vibes/{id}/metadata")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cache = response.headers().get("cache-control").unwrap();
    assert_eq!(cache, "public, max-age=31536000, immutable");
}

// ── Session enforcement ───────────────────────────────────────────────

#[tokio::test]
async fn test_claim_routes_require_session() {
    let test = test_app();

    let response = test
        .app
        .clone()
        .oneshot(get("/v1/vibes/pending"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let err = body_json(response).await;
    assert_eq!(err["error"]["code"], "UNAUTHENTICATED");

    // Wrong secret is just as dead.
    let request = Request::builder()
        .uri("/v1/vibes/pending")
        .header("authorization", "Bearer alice:wrong-secret")
        .body(Body::empty())
        .unwrap();
    let response = test.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_public_routes_need_no_session() {
    let test = test_app();
    let response = test
        .app
        .oneshot(post_json(
            "/v1/vibes/prepare",
            serde_json::json!({"recipient_handle": "alice", "sender_address": SENDER}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ── Claim lifecycle ───────────────────────────────────────────────────

#[tokio::test]
async fn test_prepare_claim_returns_transaction() {
    let test = test_app();
    let id = minted_vibe(&test, "alice").await;

    let response = test
        .app
        .oneshot(post_json_auth(
            "/v1/vibes/claim/prepare",
            "alice",
            serde_json::json!({"record_id": id, "claimer_address": CLAIMER}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["transaction_base64"], "Y2xhaW0tdHg");
    assert_eq!(body["fee_lamports"], 1_000_000);
    assert_eq!(body["asset_address"], test.chain.asset.to_string());
}

#[tokio::test]
async fn test_prepare_claim_wrong_handle_forbidden() {
    let test = test_app();
    let id = minted_vibe(&test, "alice").await;

    let response = test
        .app
        .oneshot(post_json_auth(
            "/v1/vibes/claim/prepare",
            "mallory",
            serde_json::json!({"record_id": id, "claimer_address": CLAIMER}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let err = body_json(response).await;
    assert_eq!(err["error"]["code"], "HANDLE_MISMATCH");
}

#[tokio::test]
async fn test_prepare_claim_before_mint_lands() {
    let test = test_app();

    // Reserved but never confirmed: the vault account does not exist.
    let response = test
        .app
        .clone()
        .oneshot(post_json(
            "/v1/vibes/prepare",
            serde_json::json!({"recipient_handle": "alice", "sender_address": SENDER}),
        ))
        .await
        .unwrap();
    let id = body_json(response).await["record_id"]
        .as_str()
        .unwrap()
        .to_string();
    test.chain.set_custody(VaultCustody::Absent);

    let response = test
        .app
        .oneshot(post_json_auth(
            "/v1/vibes/claim/prepare",
            "alice",
            serde_json::json!({"record_id": id, "claimer_address": CLAIMER}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let err = body_json(response).await;
    assert_eq!(err["error"]["code"], "NOT_MINTED");
}

#[tokio::test]
async fn test_claim_lifecycle_via_pending() {
    let test = test_app();

    // Nothing addressed to bob, ever.
    let response = test
        .app
        .clone()
        .oneshot(get_auth("/v1/vibes/pending", "bob"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "none");

    let id = minted_vibe(&test, "alice").await;

    // The session handle is matched case-insensitively.
    let response = test
        .app
        .clone()
        .oneshot(get_auth("/v1/vibes/pending", "Alice"))
        .await
        .unwrap();
    let pending = body_json(response).await;
    assert_eq!(pending["status"], "claimable");
    assert_eq!(pending["id"], id);
    assert_eq!(pending["masked_sender"], "9xQ…Fin");
    assert_eq!(pending["vibe_url"], format!("https://vault.test/v/{id}"));

    let response = test
        .app
        .clone()
        .oneshot(post_json_auth(
            "/v1/vibes/claim/confirm",
            "alice",
            serde_json::json!({
                "record_id": id,
                "claimer_address": CLAIMER,
                "signed_transaction": signed_blob(),
                "last_valid_block_height": 2200,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["signature"].is_string());

    let response = test
        .app
        .clone()
        .oneshot(get_auth("/v1/vibes/pending", "alice"))
        .await
        .unwrap();
    let pending = body_json(response).await;
    assert_eq!(pending["status"], "claimed");
    assert_eq!(pending["asset_address"], test.chain.asset.to_string());
    assert!(pending["explorer_url"]
        .as_str()
        .unwrap()
        .contains("?cluster=devnet"));

    // The public page reflects the terminal state.
    let response = test
        .app
        .clone()
        .oneshot(get(&format!("/v1/vibes/{id}")))
        .await
        .unwrap();
    let view = body_json(response).await;
    assert_eq!(view["status"], "claimed");
    assert!(view["claimed_at"].is_string());

    // Bob is still empty-handed.
    let response = test
        .app
        .oneshot(get_auth("/v1/vibes/pending", "bob"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["status"], "none");
}

#[tokio::test]
async fn test_claim_already_claimed_conflict() {
    let test = test_app();
    let id = claimed_vibe(&test, "alice").await;

    let response = test
        .app
        .oneshot(post_json_auth(
            "/v1/vibes/claim/prepare",
            "alice",
            serde_json::json!({"record_id": id, "claimer_address": CLAIMER}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let err = body_json(response).await;
    assert_eq!(err["error"]["code"], "ALREADY_CLAIMED");
}

#[tokio::test]
async fn test_confirm_claim_rejects_unsigned_blob() {
    let test = test_app();
    let id = minted_vibe(&test, "alice").await;

    // Valid base64, but not a serialized transaction.
    let response = test
        .app
        .oneshot(post_json_auth(
            "/v1/vibes/claim/confirm",
            "alice",
            serde_json::json!({
                "record_id": id,
                "claimer_address": CLAIMER,
                "signed_transaction": "bm90LWEtdHg",
                "last_valid_block_height": 2200,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let err = body_json(response).await;
    assert_eq!(err["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_confirm_claim_timeout_maps_to_gateway_timeout() {
    let test = test_app();
    let id = minted_vibe(&test, "alice").await;
    test.chain.queue(SubmitOutcome::TimedOut {
        signature: Signature::from([7u8; 64]),
    });

    let response = test
        .app
        .clone()
        .oneshot(post_json_auth(
            "/v1/vibes/claim/confirm",
            "alice",
            serde_json::json!({
                "record_id": id,
                "claimer_address": CLAIMER,
                "signed_transaction": signed_blob(),
                "last_valid_block_height": 2200,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let err = body_json(response).await;
    assert_eq!(err["error"]["code"], "CONFIRMATION_TIMEOUT");
    // The caller needs the in-flight signature to poll.
    assert!(err["error"]["message"]
        .as_str()
        .unwrap()
        .contains(&Signature::from([7u8; 64]).to_string()));

    // The record stays pending and claimable.
    let response = test
        .app
        .oneshot(get(&format!("/v1/vibes/{id}")))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["status"], "pending");
}
