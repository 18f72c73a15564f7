//! SIGN_MODE_DIRECT transaction builder for Cosmos SDK chains

use anyhow::{bail, Result};
use prost::Message;

use crate::chain::codec::{encode_envelope, transaction_hash};
use crate::chain::messages::{FeeDescriptor, WireMessage};
use crate::chain::proto::{
    mode_info, Any, AuthInfo, Fee, ModeInfo, PubKey, SignDoc, SignMode, SignerInfo, TxBody,
    SECP256K1_PUBKEY_TYPE_URL,
};
use crate::chain::wallet::{CosmosWallet, TransactionSigner};

/// A signed, encoded transaction ready for broadcast
#[derive(Debug, Clone)]
pub struct SignedTx {
    /// Encoded `TxRaw`
    pub tx_bytes: Vec<u8>,
    /// Encoded `SignDoc` that was signed
    pub sign_doc_bytes: Vec<u8>,
    pub signature: Vec<u8>,
}

/// Builds and signs transactions for a single account
pub struct TxBuilder<'a> {
    chain_id: String,
    account_number: u64,
    sequence: u64,
    memo: String,
    wallet: &'a CosmosWallet,
    signer: TransactionSigner,
}

impl<'a> TxBuilder<'a> {
    pub fn new(chain_id: String, account_number: u64, sequence: u64, wallet: &'a CosmosWallet) -> Self {
        Self {
            chain_id,
            account_number,
            sequence,
            memo: String::new(),
            wallet,
            signer: TransactionSigner::new(),
        }
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    /// Build a complete signed transaction carrying `messages` and paying `fee`
    pub fn build(&self, messages: &[WireMessage], fee: &FeeDescriptor) -> Result<SignedTx> {
        if messages.is_empty() {
            bail!("Transaction must carry at least one message");
        }

        let tx_body = TxBody {
            messages: messages.iter().map(WireMessage::to_any).collect(),
            memo: self.memo.clone(),
            ..Default::default()
        };

        let pub_key_any = Any {
            type_url: SECP256K1_PUBKEY_TYPE_URL.to_string(),
            value: PubKey {
                key: self.wallet.public_key_compressed().to_vec(),
            }
            .encode_to_vec(),
        };

        let signer_info = SignerInfo {
            public_key: Some(pub_key_any),
            mode_info: Some(ModeInfo {
                sum: Some(mode_info::Sum::Single(mode_info::Single {
                    mode: SignMode::Direct as i32,
                })),
            }),
            sequence: self.sequence,
        };

        let auth_info = AuthInfo {
            signer_infos: vec![signer_info],
            fee: Some(Fee::from(fee)),
            ..Default::default()
        };

        let body_bytes = tx_body.encode_to_vec();
        let auth_info_bytes = auth_info.encode_to_vec();

        let sign_doc = SignDoc {
            body_bytes: body_bytes.clone(),
            auth_info_bytes: auth_info_bytes.clone(),
            chain_id: self.chain_id.clone(),
            account_number: self.account_number,
        };
        let sign_doc_bytes = sign_doc.encode_to_vec();

        let private_key = self.wallet.private_key()?;
        let signature = self.signer.sign_bytes(&sign_doc_bytes, &private_key)?;

        let tx_bytes = encode_envelope(body_bytes, auth_info_bytes, vec![signature.clone()]);
        log::debug!(
            "Built tx {} ({} bytes, sequence {})",
            transaction_hash(&tx_bytes),
            tx_bytes.len(),
            self.sequence
        );

        Ok(SignedTx {
            tx_bytes,
            sign_doc_bytes,
            signature,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::codec::decode_envelope;
    use crate::chain::messages::BankSendMsg;

    const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_transaction_building() {
        let wallet = CosmosWallet::from_mnemonic_no_passphrase(TEST_MNEMONIC).unwrap();
        let builder = TxBuilder::new("localnet".to_string(), 7, 3, &wallet).with_memo("demo");

        let msg = WireMessage::BankSend(BankSendMsg::new(&wallet.address, "cosmos1dest", "5", "token").unwrap());
        let fee = FeeDescriptor::default_for("token");
        let signed = builder.build(&[msg.clone()], &fee).unwrap();

        assert_eq!(signed.signature.len(), 64);

        let envelope = decode_envelope(&signed.tx_bytes).unwrap();
        assert_eq!(envelope.first_message().unwrap(), msg);
        assert_eq!(envelope.auth_info.fee, fee);
        assert_eq!(envelope.auth_info.signer_count, 1);
        assert_eq!(envelope.body.memo, "demo");
        assert_eq!(envelope.signatures, vec![signed.signature.clone()]);

        // Signature covers the sign doc bound to chain id and account number
        let sign_doc = SignDoc::decode(signed.sign_doc_bytes.as_slice()).unwrap();
        assert_eq!(sign_doc.chain_id, "localnet");
        assert_eq!(sign_doc.account_number, 7);
        assert!(TransactionSigner::new().verify_bytes(
            &signed.sign_doc_bytes,
            &signed.signature,
            &wallet.public_key_compressed()
        ));
    }

    #[test]
    fn test_empty_message_list_rejected() {
        let wallet = CosmosWallet::from_mnemonic_no_passphrase(TEST_MNEMONIC).unwrap();
        let builder = TxBuilder::new("localnet".to_string(), 0, 0, &wallet);
        let result = builder.build(&[], &FeeDescriptor::default_for("token"));
        assert!(result.is_err());
    }
}
