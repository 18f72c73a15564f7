//! Error taxonomy for the transfer workflow and its collaborators

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransferError {
    /// Bad user input (empty recipient, non-numeric or negative amount)
    #[error("validation error: {0}")]
    Validation(String),

    /// No active session, or the identity service refused login/logout
    #[error("session error: {0}")]
    Session(String),

    /// The identity service rejected or could not produce a signature
    #[error("signing error: {0}")]
    Signing(String),

    /// The network or chain rejected the transaction
    #[error("broadcast error: {0}")]
    Broadcast(String),

    /// The queried transaction hash is not (yet) indexed
    #[error("transaction not found: {0}")]
    NotFound(String),

    /// Malformed envelope or message bytes
    #[error("decode error: {0}")]
    Decode(String),

    /// Transport failure while reading chain state
    #[error("chain query error: {0}")]
    Chain(String),

    /// Another attempt is still in flight on this workflow
    #[error("workflow busy: attempt already in state {0}")]
    Busy(String),
}

impl From<prost::DecodeError> for TransferError {
    fn from(e: prost::DecodeError) -> Self {
        TransferError::Decode(e.to_string())
    }
}

pub type TransferResult<T> = std::result::Result<T, TransferError>;
