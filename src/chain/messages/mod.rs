mod bank_send;
mod coin;
mod fee;

pub use bank_send::{amounts_equal, decode_bank_send, encode_bank_send, parse_amount, BankSendMsg};
pub use coin::Coin;
pub(crate) use coin::from_proto_coins;
pub use fee::{FeeDescriptor, DEFAULT_FEE_AMOUNT, DEFAULT_GAS_LIMIT};

use serde::{Deserialize, Serialize};

use crate::chain::proto::{Any, MSG_SEND_TYPE_URL};
use crate::error::{TransferError, TransferResult};

/// Amino JSON type name of a bank send, used by JSON signing bridges
pub const MSG_SEND_AMINO_TYPE: &str = "cosmos-sdk/MsgSend";

/// Message kinds this client knows how to build and decode.
///
/// Serializes to the amino JSON shape `{"type": ..., "value": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum WireMessage {
    #[serde(rename = "cosmos-sdk/MsgSend")]
    BankSend(BankSendMsg),
}

impl WireMessage {
    /// Protobuf type URL of this message kind
    pub fn type_url(&self) -> &'static str {
        match self {
            WireMessage::BankSend(_) => MSG_SEND_TYPE_URL,
        }
    }

    /// Pack into a protobuf `Any`
    pub fn to_any(&self) -> Any {
        match self {
            WireMessage::BankSend(msg) => msg.to_any(),
        }
    }

    /// Unpack from a protobuf `Any`, rejecting unknown kinds
    pub fn from_any(any: &Any) -> TransferResult<Self> {
        match any.type_url.as_str() {
            MSG_SEND_TYPE_URL => Ok(WireMessage::BankSend(decode_bank_send(&any.value)?)),
            other => Err(TransferError::Decode(format!("unrecognized message type: {}", other))),
        }
    }

    pub fn as_bank_send(&self) -> Option<&BankSendMsg> {
        match self {
            WireMessage::BankSend(msg) => Some(msg),
        }
    }
}
