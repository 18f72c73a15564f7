//! Deterministic in-process collaborators for unit tests

use async_trait::async_trait;
use prost::Message;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::chain::client::{AccountInfo, BroadcastResponse, ChainReader, ChainSubmitter};
use crate::chain::codec::{decode_envelope, transaction_hash};
use crate::chain::messages::{Coin, FeeDescriptor, WireMessage};
use crate::chain::proto::{AuthInfo, TxBody};
use crate::chain::tx_builder::TxBuilder;
use crate::chain::wallet::CosmosWallet;
use crate::error::{TransferError, TransferResult};
use crate::identity::{AccountIdentity, BroadcastResult, IdentityService, SignedTransaction};

pub const TEST_MNEMONIC: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<String, AccountInfo>,
    balances: HashMap<String, Vec<Coin>>,
    committed: HashMap<String, Vec<u8>>,
    reject_next: Option<String>,
    indexing: bool,
}

/// In-memory chain: accepts broadcasts and serves them back by hash
pub struct MemoryLedger {
    chain_id: String,
    state: Mutex<LedgerState>,
}

impl MemoryLedger {
    pub fn new(chain_id: &str) -> Self {
        Self {
            chain_id: chain_id.to_string(),
            state: Mutex::new(LedgerState {
                indexing: true,
                ..Default::default()
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap()
    }

    pub fn set_account(&self, address: &str, account_number: u64, sequence: u64) {
        self.lock().accounts.insert(
            address.to_string(),
            AccountInfo {
                address: address.to_string(),
                account_number,
                sequence,
            },
        );
    }

    pub fn set_balances(&self, address: &str, balances: Vec<Coin>) {
        self.lock().balances.insert(address.to_string(), balances);
    }

    /// Store envelope bytes under an arbitrary hash
    pub fn commit_as(&self, hash: &str, tx_bytes: Vec<u8>) {
        self.lock().committed.insert(hash.to_string(), tx_bytes);
    }

    /// Fail the next broadcast with `reason`
    pub fn reject_next_broadcast(&self, reason: &str) {
        self.lock().reject_next = Some(reason.to_string());
    }

    /// When off, broadcasts are accepted but not yet visible to `get_tx`
    pub fn set_indexing(&self, indexing: bool) {
        self.lock().indexing = indexing;
    }

    pub fn committed_count(&self) -> usize {
        self.lock().committed.len()
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.lock().committed.contains_key(hash)
    }
}

#[async_trait]
impl ChainReader for MemoryLedger {
    async fn get_all_balances(&self, address: &str) -> TransferResult<Vec<Coin>> {
        Ok(self.lock().balances.get(address).cloned().unwrap_or_default())
    }

    async fn get_tx(&self, hash: &str) -> TransferResult<Vec<u8>> {
        self.lock()
            .committed
            .get(hash)
            .cloned()
            .ok_or_else(|| TransferError::NotFound(hash.to_string()))
    }
}

#[async_trait]
impl ChainSubmitter for MemoryLedger {
    fn chain_id(&self) -> &str {
        &self.chain_id
    }

    async fn query_account(&self, address: &str) -> TransferResult<AccountInfo> {
        Ok(self.lock().accounts.get(address).cloned().unwrap_or(AccountInfo {
            address: address.to_string(),
            ..Default::default()
        }))
    }

    async fn broadcast_tx(&self, tx_bytes: Vec<u8>) -> TransferResult<BroadcastResponse> {
        let mut state = self.lock();
        if let Some(reason) = state.reject_next.take() {
            return Err(TransferError::Broadcast(reason));
        }

        let envelope = decode_envelope(&tx_bytes).map_err(|e| TransferError::Broadcast(e.to_string()))?;
        if let Ok(WireMessage::BankSend(send)) = envelope.first_message() {
            let account = state.accounts.entry(send.from_address.clone()).or_insert(AccountInfo {
                address: send.from_address.clone(),
                ..Default::default()
            });
            account.sequence += 1;
        }

        let hash = transaction_hash(&tx_bytes);
        if state.indexing {
            state.committed.insert(hash.clone(), tx_bytes);
        }
        Ok(BroadcastResponse {
            tx_hash: hash,
            code: 0,
            raw_log: String::new(),
        })
    }
}

/// Identity whose account address and broadcast hashes are fixed by the test.
/// Signs with the test mnemonic key and commits to a [`MemoryLedger`].
pub struct ScriptedIdentity {
    identity: AccountIdentity,
    wallet: CosmosWallet,
    ledger: Arc<MemoryLedger>,
    hashes: Mutex<VecDeque<String>>,
    sign_error: Mutex<Option<String>>,
    /// Rewrites the committed body before it is stored
    tamper: Mutex<Option<Box<dyn Fn(&mut TxBody, &mut AuthInfo) + Send>>>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedIdentity {
    pub fn new(address: &str, ledger: Arc<MemoryLedger>) -> Self {
        Self {
            identity: AccountIdentity {
                public_address: address.to_string(),
                email: "tester@example.com".to_string(),
            },
            wallet: CosmosWallet::from_mnemonic_no_passphrase(TEST_MNEMONIC).unwrap(),
            ledger,
            hashes: Mutex::new(VecDeque::new()),
            sign_error: Mutex::new(None),
            tamper: Mutex::new(None),
            gate: None,
        }
    }

    pub fn identity(&self) -> AccountIdentity {
        self.identity.clone()
    }

    /// Hash to report for the next broadcast
    pub fn push_hash(&self, hash: &str) {
        self.hashes.lock().unwrap().push_back(hash.to_string());
    }

    pub fn fail_signing(&self, reason: &str) {
        *self.sign_error.lock().unwrap() = Some(reason.to_string());
    }

    pub fn tamper_with(&self, f: impl Fn(&mut TxBody, &mut AuthInfo) + Send + 'static) {
        *self.tamper.lock().unwrap() = Some(Box::new(f));
    }

    /// Block signing until `gate` is notified
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    async fn build(&self, messages: &[WireMessage], fee: &FeeDescriptor) -> TransferResult<SignedTransaction> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(reason) = self.sign_error.lock().unwrap().clone() {
            return Err(TransferError::Signing(reason));
        }

        let signed = TxBuilder::new("testnet".to_string(), 1, 0, &self.wallet)
            .build(messages, fee)
            .map_err(|e| TransferError::Signing(e.to_string()))?;

        Ok(SignedTransaction {
            tx_bytes: signed.tx_bytes,
            sign_bytes: signed.sign_doc_bytes,
            signatures: vec![signed.signature],
            public_key: Some(self.wallet.public_key_compressed().to_vec()),
        })
    }
}

#[async_trait]
impl IdentityService for ScriptedIdentity {
    async fn login(&self, _email: &str) -> TransferResult<()> {
        Ok(())
    }

    async fn logout(&self) -> TransferResult<()> {
        Ok(())
    }

    async fn is_logged_in(&self) -> bool {
        true
    }

    async fn get_metadata(&self) -> TransferResult<AccountIdentity> {
        Ok(self.identity.clone())
    }

    async fn sign(&self, messages: &[WireMessage], fee: &FeeDescriptor) -> TransferResult<SignedTransaction> {
        self.build(messages, fee).await
    }

    async fn sign_and_broadcast(
        &self,
        messages: &[WireMessage],
        fee: &FeeDescriptor,
    ) -> TransferResult<BroadcastResult> {
        let signed = self.build(messages, fee).await?;

        let mut tx_bytes = signed.tx_bytes;
        if let Some(tamper) = self.tamper.lock().unwrap().as_ref() {
            let envelope = crate::chain::proto::TxRaw::decode(tx_bytes.as_slice()).unwrap();
            let mut body = TxBody::decode(envelope.body_bytes.as_slice()).unwrap();
            let mut auth_info = AuthInfo::decode(envelope.auth_info_bytes.as_slice()).unwrap();
            tamper(&mut body, &mut auth_info);
            tx_bytes = crate::chain::codec::encode_envelope(
                body.encode_to_vec(),
                auth_info.encode_to_vec(),
                envelope.signatures,
            );
        }

        let hash = self
            .hashes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| transaction_hash(&tx_bytes));
        self.ledger.commit_as(&hash, tx_bytes);

        Ok(BroadcastResult { transaction_hash: hash })
    }
}
