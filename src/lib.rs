// Library exports for cosmos_send

pub mod chain;
pub mod config;
pub mod error;
pub mod identity;
pub mod workflow;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use chain::{ChainClient, ClientConfig, CosmosWallet, FeeDescriptor, WireMessage};
pub use error::{TransferError, TransferResult};
pub use identity::{AccountIdentity, BridgeIdentity, IdentityService, LocalKeyIdentity};
pub use workflow::{TransactionWorkflow, TransferRequest, VerificationResult, WorkflowState};
