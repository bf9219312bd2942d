//! Cluster detection and explorer links.
//!
//! The service treats any endpoint whose URL does not mention mainnet as a
//! devnet-class cluster: explorer links get the `?cluster=devnet` suffix so
//! a shared claim page never points a recipient at the wrong network.

use solana_sdk::pubkey::Pubkey;

/// Which Solana cluster the configured RPC endpoint serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cluster {
    /// Mainnet-beta.
    Mainnet,
    /// Everything else (devnet, testnet, local validators) is labeled
    /// devnet for explorer purposes.
    Devnet,
}

impl Cluster {
    /// Detect the cluster from the RPC endpoint URL.
    pub fn from_rpc_url(url: &str) -> Self {
        if url.contains("mainnet") {
            Cluster::Mainnet
        } else {
            Cluster::Devnet
        }
    }

    /// True on mainnet-beta.
    pub fn is_mainnet(&self) -> bool {
        matches!(self, Cluster::Mainnet)
    }

    /// Solscan link for a token mint on this cluster.
    pub fn solscan_token_url(&self, mint: &Pubkey) -> String {
        match self {
            Cluster::Mainnet => format!("https://solscan.io/token/{mint}"),
            Cluster::Devnet => format!("https://solscan.io/token/{mint}?cluster=devnet"),
        }
    }
}
