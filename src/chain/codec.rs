//! Decoding of committed transaction envelopes fetched back from the chain

use prost::Message;
use sha2::{Digest, Sha256};

use crate::chain::messages::{FeeDescriptor, WireMessage};
use crate::chain::proto::{Any, AuthInfo, TxBody, TxRaw};
use crate::error::{TransferError, TransferResult};

/// Decoded transaction body
#[derive(Debug, Clone)]
pub struct EnvelopeBody {
    /// Messages in on-chain order, still packed
    pub messages: Vec<Any>,
    pub memo: String,
}

/// Decoded auth info section
#[derive(Debug, Clone)]
pub struct EnvelopeAuthInfo {
    /// Fee actually attached to the transaction
    pub fee: FeeDescriptor,
    pub signer_count: usize,
}

/// A transaction envelope split into its body and auth info
#[derive(Debug, Clone)]
pub struct Envelope {
    pub body: EnvelopeBody,
    pub auth_info: EnvelopeAuthInfo,
    pub signatures: Vec<Vec<u8>>,
}

impl Envelope {
    /// Decode the first message, which must be of a recognized kind
    pub fn first_message(&self) -> TransferResult<WireMessage> {
        let first = self
            .body
            .messages
            .first()
            .ok_or_else(|| TransferError::Decode("transaction carries no messages".to_string()))?;
        WireMessage::from_any(first)
    }
}

/// Decode `TxRaw` bytes (or a wire-identical `Tx`) into an envelope
pub fn decode_envelope(bytes: &[u8]) -> TransferResult<Envelope> {
    if bytes.is_empty() {
        return Err(TransferError::Decode("empty transaction envelope".to_string()));
    }

    let raw = TxRaw::decode(bytes)?;
    let body = TxBody::decode(raw.body_bytes.as_slice())?;
    let auth_info = AuthInfo::decode(raw.auth_info_bytes.as_slice())?;

    let fee = auth_info
        .fee
        .ok_or_else(|| TransferError::Decode("auth info carries no fee".to_string()))?;

    log::debug!(
        "Decoded envelope: {} message(s), {} signature(s)",
        body.messages.len(),
        raw.signatures.len()
    );

    Ok(Envelope {
        body: EnvelopeBody {
            messages: body.messages,
            memo: body.memo,
        },
        auth_info: EnvelopeAuthInfo {
            fee: fee.into(),
            signer_count: auth_info.signer_infos.len(),
        },
        signatures: raw.signatures,
    })
}

/// Encode an envelope from its already-encoded parts
pub fn encode_envelope(body_bytes: Vec<u8>, auth_info_bytes: Vec<u8>, signatures: Vec<Vec<u8>>) -> Vec<u8> {
    TxRaw {
        body_bytes,
        auth_info_bytes,
        signatures,
    }
    .encode_to_vec()
}

/// Chain transaction hash: uppercase hex SHA-256 of the encoded `TxRaw`
pub fn transaction_hash(tx_bytes: &[u8]) -> String {
    let digest = Sha256::digest(tx_bytes);
    hex::encode_upper(digest)
}
