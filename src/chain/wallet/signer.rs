use anyhow::Result;
use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use sha2::{Digest, Sha256};

/// SIGN_MODE_DIRECT signer for Cosmos SDK chains
/// Signs the SHA-256 of the sign bytes and returns the 64-byte compact signature
pub struct TransactionSigner {
    secp: Secp256k1<secp256k1::All>,
}

impl TransactionSigner {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::new(),
        }
    }

    /// Sign encoded `SignDoc` bytes
    /// RFC6979 nonces make this deterministic for a given key and payload
    pub fn sign_bytes(&self, sign_bytes: &[u8], private_key: &SecretKey) -> Result<Vec<u8>> {
        let hash: [u8; 32] = Sha256::digest(sign_bytes).into();
        let message = Message::from_digest_slice(&hash)?;

        // libsecp256k1 always produces low-S signatures, which the SDK requires
        let signature = self.secp.sign_ecdsa(&message, private_key);
        Ok(signature.serialize_compact().to_vec())
    }

    /// Verify a compact signature over `sign_bytes` against a compressed public key
    pub fn verify_bytes(&self, sign_bytes: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
        let hash: [u8; 32] = Sha256::digest(sign_bytes).into();
        let parsed = (
            Message::from_digest_slice(&hash),
            Signature::from_compact(signature),
            PublicKey::from_slice(public_key),
        );

        match parsed {
            (Ok(message), Ok(signature), Ok(public_key)) => {
                self.secp.verify_ecdsa(&message, &signature, &public_key).is_ok()
            }
            _ => false,
        }
    }
}

impl Default for TransactionSigner {
    fn default() -> Self {
        Self::new()
    }
}
