//! Live transfer smoke test
//! Signs, broadcasts and verifies a small self-transfer against a running node

use anyhow::{bail, Result};
use std::sync::Arc;
use std::time::Duration;

use cosmos_send::chain::wallet::DEFAULT_PREFIX;
use cosmos_send::config::Config;
use cosmos_send::identity::IdentityService;
use cosmos_send::{ChainClient, LocalKeyIdentity, TransactionWorkflow, TransferError};

const TEST_EMAIL: &str = "smoke-test@example.com";
const TEST_AMOUNT: &str = "1";
/// Blocks can take a few seconds to index
const INDEX_WAIT_ATTEMPTS: u32 = 10;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    println!("=== Transfer Flow Smoke Test ===\n");

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let mnemonic = Config::mnemonic_from_env()?;

    let mut client = ChainClient::new(config.client_config());
    client.connect().await?;
    let client = Arc::new(client);
    println!("Connected to {} ({})", config.chain.grpc_endpoint, config.chain.chain_id);

    let identity = Arc::new(LocalKeyIdentity::new(mnemonic, DEFAULT_PREFIX, client.clone()));
    identity.login(TEST_EMAIL).await?;
    let account = identity.get_metadata().await?;
    println!("Account: {}", account.public_address);

    let workflow = TransactionWorkflow::new(identity, client, &config.chain.denom).with_fee(config.to_fee_descriptor()?);

    println!("\n--- Balances ---");
    for coin in workflow.balances(&account).await? {
        println!("  {} {}", coin.amount, coin.denom);
    }

    // Self-transfer keeps the balance unchanged apart from fees
    let request = workflow.transfer_request(&account, &account.public_address, TEST_AMOUNT);

    println!("\n--- Sign only ---");
    let signed = workflow.sign_only(&account, &request).await?;
    println!("Sign bytes: {} bytes", signed.sign_bytes.len());
    println!("Signatures verify: {}", signed.verify_signatures());
    println!("Expected hash: {}", signed.transaction_hash());

    println!("\n--- Sign and broadcast ---");
    let result = workflow.sign_and_broadcast(&account, &request).await?;
    println!("Transaction hash: {}", result.transaction_hash);

    println!("\n--- Verify ---");
    for attempt in 1..=INDEX_WAIT_ATTEMPTS {
        match workflow.verify_committed(&result.transaction_hash, &request).await {
            Ok(verification) => {
                println!("{}", serde_json::to_string_pretty(&verification)?);
                if !verification.matches {
                    bail!("committed transaction does not match the request");
                }
                println!("\n✅ Transfer verified");
                return Ok(());
            }
            Err(TransferError::NotFound(_)) => {
                println!("Not indexed yet... attempt {}/{}", attempt, INDEX_WAIT_ATTEMPTS);
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
            Err(e) => return Err(e.into()),
        }
    }

    bail!("transaction {} was never indexed", result.transaction_hash)
}
