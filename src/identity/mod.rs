//! Identity and signing services.
//!
//! The workflow never holds keys itself. It asks an [`IdentityService`] for the
//! logged-in account and for signatures, so the same code runs against a
//! local mnemonic-backed session or a remote passwordless-login bridge.

mod bridge;
mod local;

pub use bridge::BridgeIdentity;
pub use local::LocalKeyIdentity;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::chain::codec::transaction_hash;
use crate::chain::messages::{FeeDescriptor, WireMessage};
use crate::chain::wallet::TransactionSigner;
use crate::error::{TransferError, TransferResult};

/// The account behind the current session. Immutable until logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountIdentity {
    pub public_address: String,
    pub email: String,
}

/// Opaque signed envelope returned by [`IdentityService::sign`]
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    /// Encoded `TxRaw`, ready for broadcast
    pub tx_bytes: Vec<u8>,
    /// Exact bytes covered by the signatures
    pub sign_bytes: Vec<u8>,
    pub signatures: Vec<Vec<u8>>,
    /// Compressed secp256k1 key of the signer, when the service discloses it
    pub public_key: Option<Vec<u8>>,
}

impl SignedTransaction {
    /// Hash the chain will assign once this envelope is broadcast
    pub fn transaction_hash(&self) -> String {
        transaction_hash(&self.tx_bytes)
    }

    /// True when every signature verifies over `sign_bytes` with `public_key`
    pub fn verify_signatures(&self) -> bool {
        let Some(public_key) = &self.public_key else {
            return false;
        };
        let signer = TransactionSigner::new();
        !self.signatures.is_empty()
            && self
                .signatures
                .iter()
                .all(|sig| signer.verify_bytes(&self.sign_bytes, sig, public_key))
    }
}

/// Outcome of a successful sign-and-broadcast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastResult {
    pub transaction_hash: String,
}

/// Session and signing operations of an identity provider
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Start a session for `email`
    async fn login(&self, email: &str) -> TransferResult<()>;

    /// End the session and drop any key material
    async fn logout(&self) -> TransferResult<()>;

    async fn is_logged_in(&self) -> bool;

    /// Account of the current session; fails with `Session` when logged out
    async fn get_metadata(&self) -> TransferResult<AccountIdentity>;

    /// Sign without broadcasting
    async fn sign(&self, messages: &[WireMessage], fee: &FeeDescriptor) -> TransferResult<SignedTransaction>;

    /// Sign and submit to the network
    async fn sign_and_broadcast(
        &self,
        messages: &[WireMessage],
        fee: &FeeDescriptor,
    ) -> TransferResult<BroadcastResult>;
}

/// Minimal shape check for login emails: `local@domain.tld`
pub fn validate_email(email: &str) -> TransferResult<()> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(TransferError::Validation(format!("invalid email address: {:?}", email)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email(" user@mail.example.org ").is_ok());

        for bad in ["", "user", "@example.com", "user@", "user@example", "a@b@c.com", "us er@example.com", "user@.com"] {
            assert!(validate_email(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_unsigned_envelope_does_not_verify() {
        let signed = SignedTransaction {
            tx_bytes: vec![1, 2, 3],
            sign_bytes: vec![4, 5, 6],
            signatures: vec![],
            public_key: None,
        };
        assert!(!signed.verify_signatures());
        assert_eq!(signed.transaction_hash().len(), 64);
    }
}
