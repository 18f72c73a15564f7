//! Transfer workflow: build a bank send from user input, have the identity
//! service sign (and optionally broadcast) it, then confirm what the chain
//! committed.
//!
//! Failures are terminal for the attempt that hit them. Nothing here retries;
//! the caller resubmits, which starts a fresh attempt at `Building`.

mod state;
mod verify;

pub use state::{StateTransition, WorkflowState};
pub use verify::{verify_committed, VerificationResult};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::chain::client::ChainReader;
use crate::chain::messages::{BankSendMsg, FeeDescriptor, WireMessage};
use crate::chain::messages::Coin;
use crate::error::{TransferError, TransferResult};
use crate::identity::{AccountIdentity, BroadcastResult, IdentityService, SignedTransaction};
use state::StateMachine;

/// One submit action's input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub from_address: String,
    pub to_address: String,
    /// Whole number of minor units, as entered
    pub amount: String,
    pub denom: String,
}

impl TransferRequest {
    pub fn new(from_address: &str, to_address: &str, amount: &str, denom: &str) -> Self {
        Self {
            from_address: from_address.to_string(),
            to_address: to_address.to_string(),
            amount: amount.to_string(),
            denom: denom.to_string(),
        }
    }
}

/// Result of a full send: broadcast plus confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendOutcome {
    pub transaction_hash: String,
    pub verification: VerificationResult,
}

pub struct TransactionWorkflow {
    identity: Arc<dyn IdentityService>,
    chain: Arc<dyn ChainReader>,
    denom: String,
    fee: FeeDescriptor,
    machine: StateMachine,
}

impl TransactionWorkflow {
    /// Workflow for the chain's minor denomination `denom`, paying the default fee
    pub fn new(identity: Arc<dyn IdentityService>, chain: Arc<dyn ChainReader>, denom: &str) -> Self {
        Self {
            identity,
            chain,
            denom: denom.to_string(),
            fee: FeeDescriptor::default_for(denom),
            machine: StateMachine::new(),
        }
    }

    /// Replace the fixed fee authorized for every transaction
    pub fn with_fee(mut self, fee: FeeDescriptor) -> Self {
        self.fee = fee;
        self
    }

    pub fn denom(&self) -> &str {
        &self.denom
    }

    pub fn state(&self) -> WorkflowState {
        self.machine.state()
    }

    pub fn transitions(&self) -> Vec<StateTransition> {
        self.machine.history()
    }

    /// The fixed fee attached to every transaction. Never estimated.
    pub fn default_fee(&self) -> FeeDescriptor {
        self.fee.clone()
    }

    /// Request from `identity` to `to_address` in this workflow's denomination
    pub fn transfer_request(&self, identity: &AccountIdentity, to_address: &str, amount: &str) -> TransferRequest {
        TransferRequest::new(&identity.public_address, to_address, amount, &self.denom)
    }

    /// Validate `request` and build the bank send it describes
    pub fn build_transfer_message(
        &self,
        identity: &AccountIdentity,
        request: &TransferRequest,
    ) -> TransferResult<WireMessage> {
        if request.from_address.trim() != identity.public_address {
            return Err(TransferError::Validation(format!(
                "sender {:?} is not the session account {}",
                request.from_address, identity.public_address
            )));
        }
        if request.denom.trim() != self.denom {
            return Err(TransferError::Validation(format!(
                "denomination {:?} is not the chain's {}",
                request.denom, self.denom
            )));
        }

        let msg = BankSendMsg::new(&identity.public_address, &request.to_address, &request.amount, &self.denom)?;
        Ok(WireMessage::BankSend(msg))
    }

    /// Sign without broadcasting. The envelope is returned as-is.
    pub async fn sign_only(
        &self,
        identity: &AccountIdentity,
        request: &TransferRequest,
    ) -> TransferResult<SignedTransaction> {
        let mut attempt = self.machine.begin()?;
        let message = self.build_transfer_message(identity, request)?;

        attempt.advance(WorkflowState::Signing);
        let signed = self.identity.sign(&[message], &self.fee).await?;
        log::info!("Signed transfer of {} {} to {}", request.amount, self.denom, request.to_address);

        attempt.finish();
        Ok(signed)
    }

    /// Sign and broadcast; returns once the network accepted the transaction
    pub async fn sign_and_broadcast(
        &self,
        identity: &AccountIdentity,
        request: &TransferRequest,
    ) -> TransferResult<BroadcastResult> {
        let mut attempt = self.machine.begin()?;
        let result = self.broadcast_in(&mut attempt, identity, request).await?;
        attempt.finish();
        Ok(result)
    }

    /// Broadcast, then fetch the committed transaction once and compare it
    /// with `request`. A not-yet-indexed hash surfaces as `NotFound`.
    pub async fn send(&self, identity: &AccountIdentity, request: &TransferRequest) -> TransferResult<SendOutcome> {
        let mut attempt = self.machine.begin()?;
        let result = self.broadcast_in(&mut attempt, identity, request).await?;

        attempt.advance(WorkflowState::Confirming);
        let verification = self.verify_committed(&result.transaction_hash, request).await?;

        attempt.finish();
        Ok(SendOutcome {
            transaction_hash: result.transaction_hash,
            verification,
        })
    }

    /// Confirm a committed transfer against this workflow's authorized fee
    pub async fn verify_committed(
        &self,
        transaction_hash: &str,
        request: &TransferRequest,
    ) -> TransferResult<VerificationResult> {
        verify_committed(self.chain.as_ref(), transaction_hash, request, &self.fee).await
    }

    /// Balances of the session account
    pub async fn balances(&self, identity: &AccountIdentity) -> TransferResult<Vec<Coin>> {
        self.chain.get_all_balances(&identity.public_address).await
    }

    async fn broadcast_in(
        &self,
        attempt: &mut state::Attempt<'_>,
        identity: &AccountIdentity,
        request: &TransferRequest,
    ) -> TransferResult<BroadcastResult> {
        let message = self.build_transfer_message(identity, request)?;

        attempt.advance(WorkflowState::Signing);
        let result = self.identity.sign_and_broadcast(&[message], &self.fee).await?;
        attempt.advance(WorkflowState::Broadcasting);

        log::info!(
            "Broadcast transfer of {} {} to {}: {}",
            request.amount,
            self.denom,
            request.to_address,
            result.transaction_hash
        );
        Ok(result)
    }
}
