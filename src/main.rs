use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cosmos_send::chain::wallet::{generate_mnemonic, CosmosWallet};
use cosmos_send::config::{Config, SignerMode};
use cosmos_send::identity::IdentityService;
use cosmos_send::workflow::verify_committed;
use cosmos_send::{BridgeIdentity, ChainClient, LocalKeyIdentity, TransactionWorkflow, TransferRequest};

/// Health checks before giving up on the signing bridge
const BRIDGE_HEALTH_ATTEMPTS: u32 = 5;

#[derive(Parser)]
#[command(name = "cosmos_send")]
#[command(about = "Send and verify Cosmos bank transfers", version)]
struct Cli {
    /// Configuration file path (defaults to the user config directory)
    #[arg(short, long, global = true, env = "COSMOS_SEND_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a default configuration file
    Init {
        /// Output path for config file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate a new 24-word mnemonic and show its address
    Keygen,

    /// Log in and show the session address
    Address {
        #[arg(short, long, env = "COSMOS_SEND_EMAIL")]
        email: String,
    },

    /// Log in and list the session account's balances
    Balances {
        #[arg(short, long, env = "COSMOS_SEND_EMAIL")]
        email: String,
    },

    /// Sign, broadcast and verify a transfer
    Send {
        #[arg(short, long, env = "COSMOS_SEND_EMAIL")]
        email: String,

        /// Recipient address
        #[arg(long)]
        to: String,

        /// Whole number of minor units
        #[arg(long)]
        amount: String,

        /// Return after broadcast without fetching the committed transaction
        #[arg(long)]
        no_verify: bool,
    },

    /// Sign a transfer without broadcasting it
    Sign {
        #[arg(short, long, env = "COSMOS_SEND_EMAIL")]
        email: String,

        #[arg(long)]
        to: String,

        #[arg(long)]
        amount: String,
    },

    /// Check a committed transfer against what was requested
    Verify {
        /// Transaction hash
        #[arg(long)]
        hash: String,

        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        #[arg(long)]
        amount: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cosmos_send=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { output } => {
            let output = match output.or(cli.config) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            if output.exists() {
                bail!("{} already exists", output.display());
            }
            Config::default().save(&output)?;
            info!("Configuration file created at: {}", output.display());
        }
        Commands::Keygen => {
            let config = Config::load_or_default(cli.config.as_deref())?;
            let mnemonic = generate_mnemonic()?;
            let wallet = CosmosWallet::from_mnemonic(&mnemonic, "", &config.chain.address_prefix)?;
            println!("{}", mnemonic);
            println!("{}", wallet.address);
            warn!("Store the mnemonic offline; export it as {} to sign", cosmos_send::config::MNEMONIC_ENV);
        }
        Commands::Address { email } => {
            let config = Config::load_or_default(cli.config.as_deref())?;
            let session = Session::open(&config, &email).await?;
            let account = session.identity.get_metadata().await?;
            println!("{}", account.public_address);
        }
        Commands::Balances { email } => {
            let config = Config::load_or_default(cli.config.as_deref())?;
            let session = Session::open(&config, &email).await?;
            let account = session.identity.get_metadata().await?;

            let balances = session.workflow.balances(&account).await?;
            if balances.is_empty() {
                info!("No balances for {}", account.public_address);
            }
            for coin in balances {
                println!("{} {}", coin.amount, coin.denom);
            }
        }
        Commands::Send { email, to, amount, no_verify } => {
            let config = Config::load_or_default(cli.config.as_deref())?;
            let session = Session::open(&config, &email).await?;
            let account = session.identity.get_metadata().await?;
            let request = session.workflow.transfer_request(&account, &to, &amount);

            if no_verify {
                let result = session.workflow.sign_and_broadcast(&account, &request).await?;
                println!("{}", result.transaction_hash);
            } else {
                let outcome = session.workflow.send(&account, &request).await?;
                println!("{}", serde_json::to_string_pretty(&outcome)?);
                if !outcome.verification.matches {
                    bail!("committed transaction {} does not match the request", outcome.transaction_hash);
                }
            }
        }
        Commands::Sign { email, to, amount } => {
            let config = Config::load_or_default(cli.config.as_deref())?;
            let session = Session::open(&config, &email).await?;
            let account = session.identity.get_metadata().await?;
            let request = session.workflow.transfer_request(&account, &to, &amount);

            let signed = session.workflow.sign_only(&account, &request).await?;
            info!("Signatures verify: {}", signed.verify_signatures());
            println!("{}", hex::encode(&signed.tx_bytes));
            println!("{}", signed.transaction_hash());
        }
        Commands::Verify { hash, from, to, amount } => {
            let config = Config::load_or_default(cli.config.as_deref())?;
            let mut client = ChainClient::new(config.client_config());
            client.connect().await?;

            let request = TransferRequest::new(&from, &to, &amount, &config.chain.denom);
            let fee = config.to_fee_descriptor()?;
            let result = verify_committed(&client, &hash, &request, &fee).await?;

            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.matches {
                bail!("committed transaction {} does not match the request", hash);
            }
        }
    }

    Ok(())
}

/// A logged-in identity plus a workflow bound to it
struct Session {
    identity: Arc<dyn IdentityService>,
    workflow: TransactionWorkflow,
}

impl Session {
    async fn open(config: &Config, email: &str) -> Result<Self> {
        let mut client = ChainClient::new(config.client_config());
        client.connect().await?;
        let client = Arc::new(client);

        let identity: Arc<dyn IdentityService> = match config.signer.mode {
            SignerMode::Local => {
                let mnemonic = Config::mnemonic_from_env()?;
                Arc::new(LocalKeyIdentity::new(mnemonic, &config.chain.address_prefix, client.clone()))
            }
            SignerMode::Bridge => {
                let bridge = BridgeIdentity::new(&config.signer.bridge_url, Config::bridge_key_from_env())?;
                bridge.wait_for_health(BRIDGE_HEALTH_ATTEMPTS).await?;
                Arc::new(bridge)
            }
        };

        identity.login(email).await?;

        let workflow = TransactionWorkflow::new(identity.clone(), client, &config.chain.denom)
            .with_fee(config.to_fee_descriptor()?);
        Ok(Self { identity, workflow })
    }
}
