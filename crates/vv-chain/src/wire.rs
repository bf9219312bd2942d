//! Wire codec for transactions.
//!
//! Transactions cross two boundaries as base64-encoded bincode: down to the
//! end-user wallet for the final signature, and out to the RPC endpoint with
//! `"encoding": "base64"`. Both directions share this codec so a blob built
//! here round-trips through a wallet's `signTransaction` unchanged.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;

use crate::error::ChainError;

/// Serialize a transaction to its base64 wire form.
pub fn encode_transaction(tx: &Transaction) -> Result<String, ChainError> {
    let bytes = bincode::serialize(tx)
        .map_err(|e| ChainError::Encoding(format!("serialize transaction: {e}")))?;
    Ok(BASE64_STANDARD.encode(bytes))
}

/// Decode a transaction from its base64 wire form.
pub fn decode_transaction(blob: &str) -> Result<Transaction, ChainError> {
    let bytes = BASE64_STANDARD
        .decode(blob.trim())
        .map_err(|e| ChainError::Encoding(format!("base64 decode error: {e}")))?;
    bincode::deserialize(&bytes)
        .map_err(|e| ChainError::Encoding(format!("deserialize transaction: {e}")))
}

/// The signature sitting in the fee payer slot of an encoded transaction.
///
/// Fails when the blob does not decode or the slot still holds the all-zero
/// placeholder, meaning the wallet never signed.
pub fn fee_payer_signature(blob: &str) -> Result<Signature, ChainError> {
    let tx = decode_transaction(blob)?;
    match tx.signatures.first() {
        Some(sig) if *sig != Signature::default() => Ok(*sig),
        _ => Err(ChainError::Encoding(
            "transaction is missing the fee payer signature".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::hash::Hash;
    use solana_sdk::signature::Keypair;
    use solana_sdk::signer::Signer;
    use solana_sdk::system_instruction;

    fn signed_transfer() -> Transaction {
        let payer = Keypair::new();
        let ix = system_instruction::transfer(&payer.pubkey(), &Keypair::new().pubkey(), 1);
        let mut tx = Transaction::new_with_payer(&[ix], Some(&payer.pubkey()));
        tx.sign(&[&payer], Hash::new_unique());
        tx
    }

    #[test]
    fn test_roundtrip_preserves_signatures() {
        let tx = signed_transfer();
        let blob = encode_transaction(&tx).unwrap();
        let back = decode_transaction(&blob).unwrap();
        assert_eq!(back.signatures, tx.signatures);
        assert_eq!(back.message, tx.message);
    }

    #[test]
    fn test_decode_tolerates_surrounding_whitespace() {
        let tx = signed_transfer();
        let blob = format!("  {}\n", encode_transaction(&tx).unwrap());
        assert!(decode_transaction(&blob).is_ok());
    }

    #[test]
    fn test_decode_rejects_invalid_base64() {
        assert!(decode_transaction("not base64!!!").is_err());
    }

    #[test]
    fn test_decode_rejects_truncated_payload() {
        let tx = signed_transfer();
        let blob = encode_transaction(&tx).unwrap();
        let truncated = &blob[..blob.len() / 2];
        assert!(decode_transaction(truncated).is_err());
    }

    #[test]
    fn test_decode_rejects_non_transaction_bytes() {
        let blob = BASE64_STANDARD.encode([0u8; 8]);
        assert!(decode_transaction(&blob).is_err());
    }

    #[test]
    fn test_fee_payer_signature_of_signed_transaction() {
        let tx = signed_transfer();
        let blob = encode_transaction(&tx).unwrap();
        assert_eq!(fee_payer_signature(&blob).unwrap(), tx.signatures[0]);
    }

    #[test]
    fn test_fee_payer_signature_rejects_unsigned_slot() {
        let payer = Keypair::new();
        let ix = system_instruction::transfer(&payer.pubkey(), &Keypair::new().pubkey(), 1);
        let tx = Transaction::new_with_payer(&[ix], Some(&payer.pubkey()));
        let blob = encode_transaction(&tx).unwrap();
        assert!(fee_payer_signature(&blob).is_err());
    }
}
