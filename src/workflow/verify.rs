//! Confirmation of what the chain actually committed for a broadcast transfer

use serde::Serialize;

use super::TransferRequest;
use crate::chain::client::ChainReader;
use crate::chain::codec::decode_envelope;
use crate::chain::messages::{amounts_equal, parse_amount, Coin, FeeDescriptor, WireMessage};
use crate::error::TransferResult;

/// Decoded committed transfer compared against the original request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    pub transaction_hash: String,
    pub from_address: String,
    pub to_address: String,
    /// Amount list of the committed message
    pub amount: Vec<Coin>,
    /// Fee attached to the committed transaction
    pub fee_charged: FeeDescriptor,
    /// Sender, recipient and amount all equal the request
    pub message_matches: bool,
    /// Charged fee does not exceed the authorized fee
    pub fee_within_authorized: bool,
    /// Both of the above
    pub matches: bool,
}

/// Fetch the transaction once, decode it and compare its first message with
/// `original`. A mismatch is reported through the result, not as an error.
pub async fn verify_committed(
    client: &dyn ChainReader,
    transaction_hash: &str,
    original: &TransferRequest,
    authorized_fee: &FeeDescriptor,
) -> TransferResult<VerificationResult> {
    let raw = client.get_tx(transaction_hash).await?;
    let envelope = decode_envelope(&raw)?;

    let WireMessage::BankSend(committed) = envelope.first_message()?;

    let message_matches = committed.from_address == original.from_address.trim()
        && committed.to_address == original.to_address.trim()
        && amount_matches(&committed.amount, original)?;
    let fee_within_authorized = envelope.auth_info.fee.is_within(authorized_fee);

    if !message_matches {
        log::warn!(
            "Committed transfer {} differs from request: {} -> {} {:?}",
            transaction_hash,
            committed.from_address,
            committed.to_address,
            committed.amount
        );
    }
    if !fee_within_authorized {
        log::warn!(
            "Committed transfer {} charged {:?}, more than authorized {:?}",
            transaction_hash,
            envelope.auth_info.fee,
            authorized_fee
        );
    }

    Ok(VerificationResult {
        transaction_hash: transaction_hash.to_string(),
        from_address: committed.from_address,
        to_address: committed.to_address,
        amount: committed.amount,
        fee_charged: envelope.auth_info.fee,
        message_matches,
        fee_within_authorized,
        matches: message_matches && fee_within_authorized,
    })
}

/// Exactly one coin, same denom, amount of the same decimal value
fn amount_matches(committed: &[Coin], original: &TransferRequest) -> TransferResult<bool> {
    let requested = parse_amount(&original.amount)?;
    Ok(match committed {
        [coin] => coin.denom == original.denom.trim() && amounts_equal(&coin.amount, requested),
        _ => false,
    })
}
