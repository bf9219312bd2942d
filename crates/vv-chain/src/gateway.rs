//! High-level gateway tying the RPC client, signer and composer together.
//!
//! [`ChainGateway`] is the seam between custody logic and Solana. Callers
//! hand over plain data (addresses, names, URIs) and get back base64
//! transaction blobs plus the facts needed to confirm them later. The
//! production implementation is [`SolanaGateway`]; tests substitute their
//! own.

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use solana_sdk::transaction::Transaction;

use crate::compose::{
    compose_claim, compose_mint, metadata_uri_update, mint_account_space, vault_token_account,
    AssetMetadata, ClaimParams, MintParams, ASSET_SUPPLY,
};
use crate::error::ChainError;
use crate::fees::FeeSchedule;
use crate::rpc::RpcClient;
use crate::signer::VaultKeypair;
use crate::submit::{submit_and_confirm, ConfirmPolicy, SubmitOutcome};
use crate::wire::encode_transaction;

/// What to mint, and for whom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintRequest {
    /// The sender's wallet; pays fees and rent.
    pub sender: Pubkey,
    /// Display name for the collectible.
    pub asset_name: String,
    /// Token symbol.
    pub asset_symbol: String,
    /// Metadata document URI baked in at mint time.
    pub metadata_uri: String,
}

/// A mint transaction awaiting the sender's signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedMint {
    /// Base64 transaction blob, partially signed by custodian and asset.
    pub transaction_base64: String,
    /// Blockhash the transaction was built against.
    pub blockhash: String,
    /// Height after which the blockhash is dead.
    pub last_valid_block_height: u64,
    /// Mint address of the collectible being created.
    pub asset_address: Pubkey,
    /// Service fee the sender will pay, in lamports.
    pub fee_lamports: u64,
}

/// What to claim, and for whom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimRequest {
    /// The collectible's mint address.
    pub asset_address: Pubkey,
    /// The recipient's wallet; pays fees and receives the token.
    pub claimer: Pubkey,
}

/// A claim transaction awaiting the claimer's signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedClaim {
    /// Base64 transaction blob, partially signed by the custodian.
    pub transaction_base64: String,
    /// Blockhash the transaction was built against.
    pub blockhash: String,
    /// Height after which the blockhash is dead.
    pub last_valid_block_height: u64,
    /// Service fee the claimer will pay, in lamports.
    pub fee_lamports: u64,
}

/// Where a collectible stands relative to the vault, per live chain state.
///
/// The mint transaction itself creates the vault's token account, so a
/// missing account means the mint never landed, while an existing but
/// emptied account means the collectible left custody.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultCustody {
    /// The vault's token account holds the collectible.
    Held,
    /// The vault's token account exists but the collectible is gone.
    Released,
    /// The vault's token account does not exist on chain.
    Absent,
}

/// Everything custody needs from the chain.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Compose a partially signed mint transaction for `request`.
    async fn build_mint(&self, request: MintRequest) -> Result<PreparedMint, ChainError>;

    /// Compose a partially signed claim transaction for `request`.
    async fn build_claim(&self, request: ClaimRequest) -> Result<PreparedClaim, ChainError>;

    /// Send a signed blob and poll it to a terminal outcome.
    async fn submit_and_confirm(
        &self,
        transaction_base64: &str,
        last_valid_block_height: u64,
    ) -> Result<SubmitOutcome, ChainError>;

    /// Live custody status of the collectible, read from the chain.
    async fn vault_custody(&self, asset_address: &Pubkey) -> Result<VaultCustody, ChainError>;

    /// Rewrite the collectible's metadata URI; custodian pays.
    async fn point_metadata(
        &self,
        asset_address: &Pubkey,
        uri: &str,
    ) -> Result<SubmitOutcome, ChainError>;

    /// The custodian's public address.
    fn vault_address(&self) -> Pubkey;
}

/// The live implementation backed by a Solana RPC node.
#[derive(Debug)]
pub struct SolanaGateway {
    rpc: RpcClient,
    custodian: VaultKeypair,
    fees: FeeSchedule,
    policy: ConfirmPolicy,
}

impl SolanaGateway {
    pub fn new(
        rpc: RpcClient,
        custodian: VaultKeypair,
        fees: FeeSchedule,
        policy: ConfirmPolicy,
    ) -> Self {
        Self {
            rpc,
            custodian,
            fees,
            policy,
        }
    }

    /// The RPC endpoint this gateway talks to.
    pub fn endpoint(&self) -> &str {
        self.rpc.endpoint()
    }
}

#[async_trait]
impl ChainGateway for SolanaGateway {
    async fn build_mint(&self, request: MintRequest) -> Result<PreparedMint, ChainError> {
        let metadata = AssetMetadata {
            name: request.asset_name,
            symbol: request.asset_symbol,
            uri: request.metadata_uri,
        };
        let space = mint_account_space(&metadata)?;
        let blockhash = self.rpc.latest_blockhash().await?;
        let rent = self
            .rpc
            .minimum_rent_exemption(space.rent_funded_len as u64)
            .await?;

        let asset = Keypair::new();
        let tx = compose_mint(&MintParams {
            custodian: &self.custodian,
            asset: &asset,
            sender: request.sender,
            metadata: &metadata,
            fees: &self.fees,
            recent_blockhash: blockhash.blockhash,
            mint_rent_lamports: rent,
        })?;
        let asset_address = asset.pubkey();
        tracing::info!(
            asset = %asset_address,
            sender = %request.sender,
            "composed mint transaction"
        );

        Ok(PreparedMint {
            transaction_base64: encode_transaction(&tx)?,
            blockhash: blockhash.blockhash.to_string(),
            last_valid_block_height: blockhash.last_valid_block_height,
            asset_address,
            fee_lamports: self.fees.mint_fee_lamports,
        })
    }

    async fn build_claim(&self, request: ClaimRequest) -> Result<PreparedClaim, ChainError> {
        let blockhash = self.rpc.latest_blockhash().await?;
        let tx = compose_claim(&ClaimParams {
            custodian: &self.custodian,
            asset_address: request.asset_address,
            claimer: request.claimer,
            fees: &self.fees,
            recent_blockhash: blockhash.blockhash,
        })?;
        tracing::info!(
            asset = %request.asset_address,
            claimer = %request.claimer,
            "composed claim transaction"
        );

        Ok(PreparedClaim {
            transaction_base64: encode_transaction(&tx)?,
            blockhash: blockhash.blockhash.to_string(),
            last_valid_block_height: blockhash.last_valid_block_height,
            fee_lamports: self.fees.claim_fee_lamports,
        })
    }

    async fn submit_and_confirm(
        &self,
        transaction_base64: &str,
        last_valid_block_height: u64,
    ) -> Result<SubmitOutcome, ChainError> {
        submit_and_confirm(
            &self.rpc,
            transaction_base64,
            last_valid_block_height,
            &self.policy,
        )
        .await
    }

    async fn vault_custody(&self, asset_address: &Pubkey) -> Result<VaultCustody, ChainError> {
        let vault_account = vault_token_account(&self.custodian.pubkey(), asset_address);
        Ok(match self.rpc.token_account_balance(&vault_account).await? {
            Some(balance) if balance >= ASSET_SUPPLY => VaultCustody::Held,
            Some(_) => VaultCustody::Released,
            None => VaultCustody::Absent,
        })
    }

    async fn point_metadata(
        &self,
        asset_address: &Pubkey,
        uri: &str,
    ) -> Result<SubmitOutcome, ChainError> {
        let blockhash = self.rpc.latest_blockhash().await?;
        let ix = metadata_uri_update(&self.custodian, asset_address, uri);
        let mut tx = Transaction::new_with_payer(&[ix], Some(&self.custodian.pubkey()));
        tx.try_sign(&[self.custodian.keypair()], blockhash.blockhash)
            .map_err(|e| ChainError::Signer(format!("sign metadata update: {e}")))?;
        let blob = encode_transaction(&tx)?;
        self.submit_and_confirm(&blob, blockhash.last_valid_block_height)
            .await
    }

    fn vault_address(&self) -> Pubkey {
        self.custodian.pubkey()
    }
}
