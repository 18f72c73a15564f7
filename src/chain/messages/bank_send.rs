use prost::Message;
use serde::{Deserialize, Serialize};

use super::coin::{from_proto_coins, to_proto_coins, Coin};
use crate::chain::proto::{Any, MsgSend, MSG_SEND_TYPE_URL};
use crate::error::{TransferError, TransferResult};

/// Token transfer from one account to another (`cosmos.bank.v1beta1.MsgSend`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankSendMsg {
    pub from_address: String,
    pub to_address: String,
    pub amount: Vec<Coin>,
}

impl BankSendMsg {
    /// Create a single-coin transfer with validation.
    /// The amount goes on the wire exactly as entered (surrounding whitespace aside).
    pub fn new(from_address: &str, to_address: &str, amount: &str, denom: &str) -> TransferResult<Self> {
        if from_address.trim().is_empty() {
            return Err(TransferError::Validation("sender address is empty".to_string()));
        }
        if to_address.trim().is_empty() {
            return Err(TransferError::Validation("destination address is empty".to_string()));
        }
        if denom.trim().is_empty() {
            return Err(TransferError::Validation("denomination is empty".to_string()));
        }

        let amount = parse_amount(amount)?;

        Ok(Self {
            from_address: from_address.trim().to_string(),
            to_address: to_address.trim().to_string(),
            amount: vec![Coin::new(amount, denom.trim())],
        })
    }

    /// Wrap in a protobuf `Any` for inclusion in a `TxBody`
    pub fn to_any(&self) -> Any {
        Any {
            type_url: MSG_SEND_TYPE_URL.to_string(),
            value: encode_bank_send(self),
        }
    }
}

impl From<MsgSend> for BankSendMsg {
    fn from(msg: MsgSend) -> Self {
        Self {
            from_address: msg.from_address,
            to_address: msg.to_address,
            amount: from_proto_coins(msg.amount),
        }
    }
}

impl From<&BankSendMsg> for MsgSend {
    fn from(msg: &BankSendMsg) -> Self {
        MsgSend {
            from_address: msg.from_address.clone(),
            to_address: msg.to_address.clone(),
            amount: to_proto_coins(&msg.amount),
        }
    }
}

/// Protobuf-encode a bank send message
pub fn encode_bank_send(msg: &BankSendMsg) -> Vec<u8> {
    MsgSend::from(msg).encode_to_vec()
}

/// Decode protobuf `MsgSend` bytes
pub fn decode_bank_send(bytes: &[u8]) -> TransferResult<BankSendMsg> {
    let msg = MsgSend::decode(bytes)?;
    Ok(msg.into())
}

/// Validate a user-entered amount: a non-negative decimal `digits[.digits]`.
/// Returns the input with surrounding whitespace removed, otherwise untouched.
pub fn parse_amount(input: &str) -> TransferResult<&str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TransferError::Validation("amount is empty".to_string()));
    }
    if trimmed.starts_with('-') {
        return Err(TransferError::Validation(format!("amount must not be negative: {}", trimmed)));
    }
    if decimal_parts(trimmed).is_none() {
        return Err(TransferError::Validation(format!(
            "amount must be a non-negative decimal number: {}",
            trimmed
        )));
    }
    Ok(trimmed)
}

/// True when both strings are decimals of the same exact value (`"007"` == `"7.0"`)
pub fn amounts_equal(a: &str, b: &str) -> bool {
    match (decimal_parts(a.trim()), decimal_parts(b.trim())) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Integer and fraction digits with insignificant zeros stripped
fn decimal_parts(value: &str) -> Option<(&str, &str)> {
    let (integer, fraction) = match value.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (value, None),
    };

    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(integer) || fraction.is_some_and(|f| !all_digits(f)) {
        return None;
    }

    Some((
        integer.trim_start_matches('0'),
        fraction.unwrap_or("").trim_end_matches('0'),
    ))
}
