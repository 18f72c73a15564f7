mod keys;
mod signer;

pub use keys::{account_address, generate_mnemonic, validate_address, CosmosWallet, COSMOS_HD_PATH, DEFAULT_PREFIX};
pub use signer::TransactionSigner;
