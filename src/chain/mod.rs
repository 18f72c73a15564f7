pub mod account;
pub mod client;
pub mod codec;
pub mod messages;
pub mod proto;
pub mod tx_builder;
pub mod wallet;

pub use client::{AccountInfo, BroadcastResponse, ChainClient, ChainReader, ChainSubmitter, ClientConfig};
pub use codec::{decode_envelope, encode_envelope, transaction_hash, Envelope};
pub use messages::{decode_bank_send, encode_bank_send, BankSendMsg, FeeDescriptor, WireMessage};
pub use messages::Coin;
pub use tx_builder::{SignedTx, TxBuilder};
pub use wallet::{CosmosWallet, TransactionSigner};
