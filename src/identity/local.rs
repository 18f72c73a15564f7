//! Mnemonic-backed identity: signs locally, broadcasts through the chain client

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use zeroize::Zeroizing;

use super::{validate_email, AccountIdentity, BroadcastResult, IdentityService, SignedTransaction};
use crate::chain::client::ChainSubmitter;
use crate::chain::messages::{FeeDescriptor, WireMessage};
use crate::chain::tx_builder::TxBuilder;
use crate::chain::wallet::CosmosWallet;
use crate::error::{TransferError, TransferResult};

struct Session {
    email: String,
    wallet: CosmosWallet,
}

pub struct LocalKeyIdentity {
    mnemonic: Zeroizing<String>,
    passphrase: Zeroizing<String>,
    prefix: String,
    chain: Arc<dyn ChainSubmitter>,
    session: RwLock<Option<Session>>,
}

impl LocalKeyIdentity {
    pub fn new(mnemonic: String, prefix: &str, chain: Arc<dyn ChainSubmitter>) -> Self {
        Self {
            mnemonic: Zeroizing::new(mnemonic),
            passphrase: Zeroizing::new(String::new()),
            prefix: prefix.to_string(),
            chain,
            session: RwLock::new(None),
        }
    }

    pub fn with_passphrase(mut self, passphrase: String) -> Self {
        self.passphrase = Zeroizing::new(passphrase);
        self
    }

    /// Build and sign with fresh account state from the chain
    async fn sign_with_session(
        &self,
        messages: &[WireMessage],
        fee: &FeeDescriptor,
    ) -> TransferResult<SignedTransaction> {
        let guard = self.session.read().await;
        let session = guard
            .as_ref()
            .ok_or_else(|| TransferError::Session("not logged in".to_string()))?;

        for msg in messages {
            if let Some(send) = msg.as_bank_send() {
                if send.from_address != session.wallet.address {
                    return Err(TransferError::Signing(format!(
                        "message sender {} is not the session account {}",
                        send.from_address, session.wallet.address
                    )));
                }
            }
        }

        let account = self
            .chain
            .query_account(&session.wallet.address)
            .await
            .map_err(|e| TransferError::Signing(format!("cannot load account state: {}", e)))?;

        let builder = TxBuilder::new(
            self.chain.chain_id().to_string(),
            account.account_number,
            account.sequence,
            &session.wallet,
        );
        let signed = builder
            .build(messages, fee)
            .map_err(|e| TransferError::Signing(e.to_string()))?;

        Ok(SignedTransaction {
            tx_bytes: signed.tx_bytes,
            sign_bytes: signed.sign_doc_bytes,
            signatures: vec![signed.signature],
            public_key: Some(session.wallet.public_key_compressed().to_vec()),
        })
    }
}

#[async_trait]
impl IdentityService for LocalKeyIdentity {
    async fn login(&self, email: &str) -> TransferResult<()> {
        validate_email(email)?;

        let wallet = CosmosWallet::from_mnemonic(&self.mnemonic, &self.passphrase, &self.prefix)
            .map_err(|e| TransferError::Session(format!("cannot load key: {}", e)))?;
        log::info!("Logged in {} as {}", email.trim(), wallet.address);

        *self.session.write().await = Some(Session {
            email: email.trim().to_string(),
            wallet,
        });
        Ok(())
    }

    async fn logout(&self) -> TransferResult<()> {
        if self.session.write().await.take().is_some() {
            log::info!("Logged out");
        }
        Ok(())
    }

    async fn is_logged_in(&self) -> bool {
        self.session.read().await.is_some()
    }

    async fn get_metadata(&self) -> TransferResult<AccountIdentity> {
        let guard = self.session.read().await;
        let session = guard
            .as_ref()
            .ok_or_else(|| TransferError::Session("not logged in".to_string()))?;

        Ok(AccountIdentity {
            public_address: session.wallet.address.clone(),
            email: session.email.clone(),
        })
    }

    async fn sign(&self, messages: &[WireMessage], fee: &FeeDescriptor) -> TransferResult<SignedTransaction> {
        self.sign_with_session(messages, fee).await
    }

    async fn sign_and_broadcast(
        &self,
        messages: &[WireMessage],
        fee: &FeeDescriptor,
    ) -> TransferResult<BroadcastResult> {
        let signed = self.sign_with_session(messages, fee).await?;
        let expected_hash = signed.transaction_hash();

        let response = self.chain.broadcast_tx(signed.tx_bytes).await?;
        if !response.tx_hash.eq_ignore_ascii_case(&expected_hash) {
            log::warn!(
                "Node reported hash {} for locally computed {}",
                response.tx_hash,
                expected_hash
            );
        }

        Ok(BroadcastResult {
            transaction_hash: response.tx_hash,
        })
    }
}
