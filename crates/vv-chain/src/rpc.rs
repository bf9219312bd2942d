//! Raw Solana JSON-RPC client.
//!
//! A deliberately small client over `reqwest` covering exactly the calls the
//! custody flows need. No websocket subscriptions: confirmation is polled,
//! which survives serverless and restrictive network environments.
//!
//! ## Methods Used
//!
//! | JSON-RPC method | Wrapper |
//! |-----------------|---------|
//! | `getLatestBlockhash` | [`RpcClient::latest_blockhash`] |
//! | `sendTransaction` | [`RpcClient::send_transaction`] |
//! | `getSignatureStatuses` | [`RpcClient::signature_status`] |
//! | `getBlockHeight` | [`RpcClient::block_height`] |
//! | `getMinimumBalanceForRentExemption` | [`RpcClient::minimum_rent_exemption`] |
//! | `getTokenAccountBalance` | [`RpcClient::token_account_balance`] |
//! | `getAccountInfo` | [`RpcClient::account_exists`] |
//!
//! Read calls retry transient transport failures with backoff.
//! `sendTransaction` is never retried here: a send that failed ambiguously
//! is resolved by polling the signature, not by sending again.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Deserialize;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;

use crate::error::ChainError;
use crate::retry::retry_send;

/// Endpoint used when `SOLANA_RPC_URL` is not set.
pub const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";

/// Commitment level used for reads and preflight.
pub const DEFAULT_COMMITMENT: &str = "confirmed";

static REQUEST_ID: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> u64 {
    REQUEST_ID.fetch_add(1, Ordering::Relaxed)
}

/// Configuration for [`RpcClient`].
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// RPC endpoint URL.
    pub url: String,
    /// Commitment level sent with reads and preflight.
    pub commitment: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl RpcConfig {
    /// Create a configuration for the given endpoint with defaults.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            commitment: DEFAULT_COMMITMENT.into(),
            timeout_secs: 30,
        }
    }

    /// Read the endpoint from `SOLANA_RPC_URL`, falling back to devnet.
    pub fn from_env() -> Self {
        let url = std::env::var("SOLANA_RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.into());
        Self::new(url)
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self::new(DEFAULT_RPC_URL)
    }
}

/// A blockhash paired with the height at which it stops being usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockhashInfo {
    /// The recent blockhash to sign against.
    pub blockhash: Hash,
    /// Last block height at which a transaction using this blockhash can
    /// still be included.
    pub last_valid_block_height: u64,
}

/// Signature status as reported by `getSignatureStatuses`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxStatus {
    /// Slot the transaction was processed in.
    #[serde(default)]
    pub slot: u64,
    /// `processed` / `confirmed` / `finalized`, when known.
    #[serde(default)]
    pub confirmation_status: Option<String>,
    /// Chain-reported execution error, `null` on success.
    #[serde(default)]
    pub err: Option<serde_json::Value>,
}

impl TxStatus {
    /// True once the cluster reports `confirmed` or `finalized`.
    pub fn is_confirmed(&self) -> bool {
        matches!(
            self.confirmation_status.as_deref(),
            Some("confirmed") | Some("finalized")
        )
    }

    /// Render the chain-reported error, if any.
    pub fn error_detail(&self) -> Option<String> {
        self.err.as_ref().map(|e| e.to_string())
    }
}

#[derive(Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockhashValue {
    blockhash: String,
    last_valid_block_height: u64,
}

#[derive(Deserialize)]
struct TokenAmountValue {
    amount: String,
}

/// Minimal Solana JSON-RPC client.
#[derive(Debug, Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    url: url::Url,
    commitment: String,
}

impl RpcClient {
    /// Build a client from configuration.
    pub fn new(config: RpcConfig) -> Result<Self, ChainError> {
        let url = url::Url::parse(&config.url)
            .map_err(|e| ChainError::Config(format!("invalid RPC URL {:?}: {e}", config.url)))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChainError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            url,
            commitment: config.commitment,
        })
    }

    /// The endpoint this client talks to.
    pub fn endpoint(&self) -> &str {
        self.url.as_str()
    }

    /// Fetch the latest blockhash and its expiry height.
    pub async fn latest_blockhash(&self) -> Result<BlockhashInfo, ChainError> {
        let method = "getLatestBlockhash";
        let params = serde_json::json!([{ "commitment": self.commitment }]);
        let result = self.call(method, params).await?;
        let value: WithContext<BlockhashValue> = parse_result(method, result)?;
        let blockhash = value
            .value
            .blockhash
            .parse::<Hash>()
            .map_err(|e| decode_err(method, format!("invalid blockhash: {e}")))?;
        Ok(BlockhashInfo {
            blockhash,
            last_valid_block_height: value.value.last_valid_block_height,
        })
    }

    /// Submit a base64-encoded signed transaction.
    ///
    /// Preflight stays on: a transaction that would fail is rejected before
    /// it costs the sender a fee. This call is intentionally not retried;
    /// on an ambiguous failure the caller polls the transaction's own
    /// signature instead.
    pub async fn send_transaction(&self, transaction_base64: &str) -> Result<Signature, ChainError> {
        let method = "sendTransaction";
        let params = serde_json::json!([
            transaction_base64,
            {
                "encoding": "base64",
                "skipPreflight": false,
                "preflightCommitment": self.commitment,
            }
        ]);
        let result = self.call_once(method, params).await?;
        let signature: String = parse_result(method, result)?;
        signature
            .parse::<Signature>()
            .map_err(|e| decode_err(method, format!("invalid signature: {e}")))
    }

    /// Look up the status of a signature.
    ///
    /// Returns `None` while the cluster has not seen the transaction.
    /// `searchTransactionHistory` is on so a transaction that confirmed
    /// before an earlier poll crashed is still found.
    pub async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<TxStatus>, ChainError> {
        let method = "getSignatureStatuses";
        let params = serde_json::json!([
            [signature.to_string()],
            { "searchTransactionHistory": true }
        ]);
        let result = self.call(method, params).await?;
        let value: WithContext<Vec<Option<TxStatus>>> = parse_result(method, result)?;
        Ok(value.value.into_iter().next().flatten())
    }

    /// Current block height at the configured commitment.
    pub async fn block_height(&self) -> Result<u64, ChainError> {
        let method = "getBlockHeight";
        let params = serde_json::json!([{ "commitment": self.commitment }]);
        let result = self.call(method, params).await?;
        parse_result(method, result)
    }

    /// Lamports required to make an account of `space` bytes rent-exempt.
    pub async fn minimum_rent_exemption(&self, space: u64) -> Result<u64, ChainError> {
        let method = "getMinimumBalanceForRentExemption";
        let params = serde_json::json!([space]);
        let result = self.call(method, params).await?;
        parse_result(method, result)
    }

    /// Token balance of an SPL token account.
    ///
    /// Returns `None` when the account does not exist, which the ownership
    /// probe treats as "the asset has left custody".
    pub async fn token_account_balance(
        &self,
        token_account: &Pubkey,
    ) -> Result<Option<u64>, ChainError> {
        let method = "getTokenAccountBalance";
        let params = serde_json::json!([
            token_account.to_string(),
            { "commitment": self.commitment }
        ]);
        // The RPC reports a missing account as an invalid-param error rather
        // than a null value.
        let result = match self.call(method, params).await {
            Ok(result) => result,
            Err(ChainError::Rpc { message, .. }) if message.contains("could not find account") => {
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let value: WithContext<TokenAmountValue> = parse_result(method, result)?;
        let amount = value
            .value
            .amount
            .parse::<u64>()
            .map_err(|e| decode_err(method, format!("invalid token amount: {e}")))?;
        Ok(Some(amount))
    }

    /// Whether an account exists on chain.
    pub async fn account_exists(&self, address: &Pubkey) -> Result<bool, ChainError> {
        let method = "getAccountInfo";
        let params = serde_json::json!([
            address.to_string(),
            { "encoding": "base64", "commitment": self.commitment }
        ]);
        let result = self.call(method, params).await?;
        let value: WithContext<serde_json::Value> = parse_result(method, result)?;
        Ok(!value.value.is_null())
    }

    /// Perform a JSON-RPC call with transport retry (reads only).
    async fn call(
        &self,
        method: &'static str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ChainError> {
        let body = envelope(method, &params);
        let resp = retry_send(|| self.http.post(self.url.clone()).json(&body).send())
            .await
            .map_err(|e| ChainError::Http {
                method: method.into(),
                source: e,
            })?;
        Self::unwrap_response(method, resp).await
    }

    /// Perform a JSON-RPC call without any retry (sends).
    async fn call_once(
        &self,
        method: &'static str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ChainError> {
        let body = envelope(method, &params);
        let resp = self
            .http
            .post(self.url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| ChainError::Http {
                method: method.into(),
                source: e,
            })?;
        Self::unwrap_response(method, resp).await
    }

    async fn unwrap_response(
        method: &'static str,
        resp: reqwest::Response,
    ) -> Result<serde_json::Value, ChainError> {
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read response body: {e}>"));
            return Err(ChainError::Status {
                method: method.into(),
                status,
                body,
            });
        }

        let envelope: RpcEnvelope = resp
            .json()
            .await
            .map_err(|e| decode_err(method, e.to_string()))?;

        if let Some(err) = envelope.error {
            return Err(ChainError::Rpc {
                method: method.into(),
                code: err.code,
                message: err.message,
            });
        }

        envelope
            .result
            .ok_or_else(|| decode_err(method, "response carried neither result nor error".into()))
    }
}

fn envelope(method: &str, params: &serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": next_request_id(),
        "method": method,
        "params": params,
    })
}

fn parse_result<T: serde::de::DeserializeOwned>(
    method: &'static str,
    result: serde_json::Value,
) -> Result<T, ChainError> {
    serde_json::from_value(result).map_err(|e| decode_err(method, e.to_string()))
}

fn decode_err(method: &'static str, detail: String) -> ChainError {
    ChainError::Decode {
        method: method.into(),
        detail,
    }
}
