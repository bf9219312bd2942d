//! Custody service configuration and public URL scheme.
//!
//! Every URL the service hands out — the shareable vibe page, the
//! placeholder metadata pointer baked into the mint, the explorer link —
//! is derived here, so the scheme lives in exactly one place.

use vv_chain::{Cluster, Pubkey};
use vv_core::VibeId;

/// Environment variable naming the public base URL of this deployment.
pub const BASE_URL_ENV: &str = "BASE_URL";

/// Default base URL for local development.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Deployment-level knobs the custody service needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustodyConfig {
    /// Public base URL, no trailing slash.
    pub base_url: String,
    /// Which cluster the chain gateway talks to; drives explorer links.
    pub cluster: Cluster,
}

impl CustodyConfig {
    pub fn new(base_url: &str, cluster: Cluster) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            cluster,
        }
    }

    /// Read `BASE_URL` from the environment, defaulting to localhost.
    pub fn from_env(cluster: Cluster) -> Self {
        let base_url =
            std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(&base_url, cluster)
    }

    /// The shareable vibe page URL.
    pub fn vibe_url(&self, id: &VibeId) -> String {
        format!("{}/v/{}", self.base_url, id)
    }

    /// The placeholder metadata URI baked into the mint transaction. It
    /// resolves back into this service, so it serves correct data even if
    /// the media upload or the on-chain pointer update never happens.
    pub fn placeholder_metadata_url(&self, id: &VibeId) -> String {
        format!("{}/v1/vibes/{}/metadata", self.base_url, id)
    }

    /// Where the collectible card image is served from once uploaded.
    ///
    /// The placeholder metadata document references this address before the
    /// upload happens; the media pipeline writes to the matching path.
    pub fn media_image_url(&self, id: &VibeId) -> String {
        format!("{}/media/vibes/{}.svg", self.base_url, id)
    }

    /// Explorer link for a minted collectible.
    pub fn explorer_token_url(&self, mint: &Pubkey) -> String {
        self.cluster.solscan_token_url(mint)
    }
}
