//! Transaction composition for mint and claim.
//!
//! A collectible is a supply-1, decimals-0 Token-2022 mint carrying the
//! metadata-pointer extension aimed at itself, with the token-metadata TLV
//! holding name, symbol and URI. Both flows produce a partially signed
//! transaction: the custodian (and, for mints, the fresh asset keypair)
//! sign here, the end-user wallet signs last as fee payer.
//!
//! ## Mint transaction (fee payer: sender)
//!
//! | # | Instruction | Signer |
//! |---|-------------|--------|
//! | 1 | `system::create_account` for the mint | sender, asset |
//! | 2 | `metadata_pointer::initialize` → the mint itself | — |
//! | 3 | `initialize_mint2`, decimals 0, authority custodian | — |
//! | 4 | create vault token account, funded by sender | sender |
//! | 5 | token-metadata `initialize` | custodian |
//! | 6 | `mint_to` 1 token → vault account | custodian |
//! | 7 | `system::transfer` mint fee → treasury | sender |
//!
//! ## Claim transaction (fee payer: claimer)
//!
//! | # | Instruction | Signer |
//! |---|-------------|--------|
//! | 1 | create claimer token account (idempotent) | claimer |
//! | 2 | `transfer_checked` 1 token, vault → claimer | custodian |
//! | 3 | `system::transfer` claim fee → treasury | claimer |

use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use solana_sdk::system_instruction;
use solana_sdk::transaction::Transaction;
use spl_associated_token_account::get_associated_token_address_with_program_id;
use spl_associated_token_account::instruction::{
    create_associated_token_account, create_associated_token_account_idempotent,
};
use spl_token_2022::extension::metadata_pointer;
use spl_token_2022::extension::ExtensionType;
use spl_token_2022::state::Mint;
use spl_token_metadata_interface::state::{Field, TokenMetadata};

use crate::error::ChainError;
use crate::fees::FeeSchedule;
use crate::signer::VaultKeypair;

/// Collectibles are indivisible.
pub const ASSET_DECIMALS: u8 = 0;

/// Exactly one token is ever minted per collectible.
pub const ASSET_SUPPLY: u64 = 1;

/// Extra rent-funded bytes beyond the initial URI, so the post-upload
/// pointer update can write a longer URI without growing past the funded
/// size.
pub const METADATA_URI_HEADROOM: usize = 128;

/// On-chain metadata for a collectible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetMetadata {
    /// Display name, e.g. `Vibe for @alice`.
    pub name: String,
    /// Token symbol.
    pub symbol: String,
    /// Metadata document URI.
    pub uri: String,
}

/// Byte sizes governing mint account creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintAccountSpace {
    /// Allocation size passed to `create_account` (mint + extensions).
    pub account_len: usize,
    /// Size the rent deposit must cover: allocation plus the metadata TLV
    /// the token-metadata program appends, plus [`METADATA_URI_HEADROOM`].
    pub rent_funded_len: usize,
}

/// Compute the mint account allocation and the size its rent must cover.
pub fn mint_account_space(metadata: &AssetMetadata) -> Result<MintAccountSpace, ChainError> {
    let account_len =
        ExtensionType::try_calculate_account_len::<Mint>(&[ExtensionType::MetadataPointer])
            .map_err(|e| ChainError::Encoding(format!("mint account length: {e}")))?;
    let tlv = TokenMetadata {
        name: metadata.name.clone(),
        symbol: metadata.symbol.clone(),
        uri: metadata.uri.clone(),
        ..Default::default()
    }
    .tlv_size_of()
    .map_err(|e| ChainError::Encoding(format!("metadata size: {e}")))?;
    Ok(MintAccountSpace {
        account_len,
        rent_funded_len: account_len + tlv + METADATA_URI_HEADROOM,
    })
}

/// The vault's token account for a given collectible mint.
pub fn vault_token_account(vault_address: &Pubkey, asset_address: &Pubkey) -> Pubkey {
    get_associated_token_address_with_program_id(
        vault_address,
        asset_address,
        &spl_token_2022::id(),
    )
}

/// Inputs to [`compose_mint`].
pub struct MintParams<'a> {
    /// The custodian, mint authority and vault owner.
    pub custodian: &'a VaultKeypair,
    /// Fresh keypair for the collectible's mint account.
    pub asset: &'a Keypair,
    /// The sender's wallet; fee payer and funder.
    pub sender: Pubkey,
    /// On-chain metadata to initialize.
    pub metadata: &'a AssetMetadata,
    /// Service fee schedule.
    pub fees: &'a FeeSchedule,
    /// Recent blockhash to sign against.
    pub recent_blockhash: Hash,
    /// Rent deposit for the mint account, covering
    /// [`MintAccountSpace::rent_funded_len`].
    pub mint_rent_lamports: u64,
}

/// Build the mint transaction, partially signed by custodian and asset.
///
/// The returned transaction still needs the sender's signature in the fee
/// payer slot before it can be submitted.
pub fn compose_mint(params: &MintParams<'_>) -> Result<Transaction, ChainError> {
    let custodian_address = params.custodian.pubkey();
    let asset_address = params.asset.pubkey();
    let vault_account = vault_token_account(&custodian_address, &asset_address);
    let space = mint_account_space(params.metadata)?;

    let instructions: Vec<Instruction> = vec![
        system_instruction::create_account(
            &params.sender,
            &asset_address,
            params.mint_rent_lamports,
            space.account_len as u64,
            &spl_token_2022::id(),
        ),
        metadata_pointer::instruction::initialize(
            &spl_token_2022::id(),
            &asset_address,
            Some(custodian_address),
            Some(asset_address),
        )
        .map_err(|e| ChainError::Encoding(format!("metadata pointer instruction: {e}")))?,
        spl_token_2022::instruction::initialize_mint2(
            &spl_token_2022::id(),
            &asset_address,
            &custodian_address,
            None,
            ASSET_DECIMALS,
        )
        .map_err(|e| ChainError::Encoding(format!("initialize mint instruction: {e}")))?,
        create_associated_token_account(
            &params.sender,
            &custodian_address,
            &asset_address,
            &spl_token_2022::id(),
        ),
        spl_token_metadata_interface::instruction::initialize(
            &spl_token_2022::id(),
            &asset_address,
            &custodian_address,
            &asset_address,
            &custodian_address,
            params.metadata.name.clone(),
            params.metadata.symbol.clone(),
            params.metadata.uri.clone(),
        ),
        spl_token_2022::instruction::mint_to(
            &spl_token_2022::id(),
            &asset_address,
            &vault_account,
            &custodian_address,
            &[],
            ASSET_SUPPLY,
        )
        .map_err(|e| ChainError::Encoding(format!("mint_to instruction: {e}")))?,
        system_instruction::transfer(
            &params.sender,
            &params.fees.treasury,
            params.fees.mint_fee_lamports,
        ),
    ];

    let mut tx = Transaction::new_with_payer(&instructions, Some(&params.sender));
    tx.try_partial_sign(
        &[params.custodian.keypair(), params.asset],
        params.recent_blockhash,
    )
    .map_err(|e| ChainError::Signer(format!("partial-sign mint transaction: {e}")))?;
    Ok(tx)
}

/// Inputs to [`compose_claim`].
pub struct ClaimParams<'a> {
    /// The custodian, owner of the vault token account.
    pub custodian: &'a VaultKeypair,
    /// The collectible's mint address.
    pub asset_address: Pubkey,
    /// The claimer's wallet; fee payer and funder.
    pub claimer: Pubkey,
    /// Service fee schedule.
    pub fees: &'a FeeSchedule,
    /// Recent blockhash to sign against.
    pub recent_blockhash: Hash,
}

/// Build the claim transaction, partially signed by the custodian.
///
/// The claimer token account is created idempotently, so a claim rebuilt
/// after an expired blockhash never fails on an account that the first
/// attempt already created.
pub fn compose_claim(params: &ClaimParams<'_>) -> Result<Transaction, ChainError> {
    let custodian_address = params.custodian.pubkey();
    let vault_account = vault_token_account(&custodian_address, &params.asset_address);
    let claimer_account = get_associated_token_address_with_program_id(
        &params.claimer,
        &params.asset_address,
        &spl_token_2022::id(),
    );

    let instructions: Vec<Instruction> = vec![
        create_associated_token_account_idempotent(
            &params.claimer,
            &params.claimer,
            &params.asset_address,
            &spl_token_2022::id(),
        ),
        spl_token_2022::instruction::transfer_checked(
            &spl_token_2022::id(),
            &vault_account,
            &params.asset_address,
            &claimer_account,
            &custodian_address,
            &[],
            ASSET_SUPPLY,
            ASSET_DECIMALS,
        )
        .map_err(|e| ChainError::Encoding(format!("transfer instruction: {e}")))?,
        system_instruction::transfer(
            &params.claimer,
            &params.fees.treasury,
            params.fees.claim_fee_lamports,
        ),
    ];

    let mut tx = Transaction::new_with_payer(&instructions, Some(&params.claimer));
    tx.try_partial_sign(&[params.custodian.keypair()], params.recent_blockhash)
        .map_err(|e| ChainError::Signer(format!("partial-sign claim transaction: {e}")))?;
    Ok(tx)
}

/// Instruction rewriting the on-chain metadata URI after media upload.
pub fn metadata_uri_update(
    custodian: &VaultKeypair,
    asset_address: &Pubkey,
    uri: &str,
) -> Instruction {
    spl_token_metadata_interface::instruction::update_field(
        &spl_token_2022::id(),
        asset_address,
        &custodian.pubkey(),
        Field::Uri,
        uri.to_owned(),
    )
}
