use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::chain::client::ClientConfig;
use crate::chain::messages::{FeeDescriptor, DEFAULT_FEE_AMOUNT, DEFAULT_GAS_LIMIT};

/// Environment variable holding the signing mnemonic
pub const MNEMONIC_ENV: &str = "COSMOS_SEND_MNEMONIC";
/// Environment variable holding the signing bridge API key
pub const BRIDGE_KEY_ENV: &str = "COSMOS_SEND_BRIDGE_KEY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub chain: ChainConfig,
    #[serde(default)]
    pub fee: FeeConfig,
    #[serde(default)]
    pub signer: SignerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub grpc_endpoint: String,
    pub chain_id: String,
    /// Minor denomination all transfers and fees are expressed in
    pub denom: String,
    pub address_prefix: String,
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Fixed fee attached to every transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Whole minor units, as a string so large values survive TOML
    pub amount: String,
    pub gas_limit: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignerMode {
    /// Sign with a mnemonic from the environment
    Local,
    /// Delegate login and signing to an HTTP signing bridge
    Bridge,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignerConfig {
    pub mode: SignerMode,
    pub bridge_url: String,
    // Secrets (mnemonic, bridge API key) come from the environment only
}

fn default_connection_timeout() -> u64 {
    ClientConfig::default().connection_timeout
}

fn default_request_timeout() -> u64 {
    ClientConfig::default().request_timeout
}

fn default_max_retries() -> u32 {
    ClientConfig::default().max_retries
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            amount: DEFAULT_FEE_AMOUNT.to_string(),
            gas_limit: DEFAULT_GAS_LIMIT,
        }
    }
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            mode: SignerMode::Local,
            bridge_url: "http://localhost:3000".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let client = ClientConfig::default();
        Self {
            chain: ChainConfig {
                grpc_endpoint: client.grpc_endpoint,
                chain_id: client.chain_id,
                denom: "token".to_string(),
                address_prefix: "cosmos".to_string(),
                connection_timeout: client.connection_timeout,
                request_timeout: client.request_timeout,
                max_retries: client.max_retries,
            },
            fee: FeeConfig::default(),
            signer: SignerConfig::default(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// `<user config dir>/cosmos_send/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().ok_or_else(|| anyhow!("no user config directory on this platform"))?;
        Ok(dir.join("cosmos_send").join("config.toml"))
    }

    /// Load `path` if given, else the default path, else built-in defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::load(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.chain.denom.trim().is_empty() {
            return Err(anyhow!("chain.denom must not be empty"));
        }
        if self.chain.address_prefix.trim().is_empty() {
            return Err(anyhow!("chain.address_prefix must not be empty"));
        }
        self.fee
            .amount
            .parse::<u128>()
            .with_context(|| format!("fee.amount {:?} is not a whole number", self.fee.amount))?;
        Ok(())
    }

    /// The fixed fee, in the chain's minor denomination
    pub fn to_fee_descriptor(&self) -> Result<FeeDescriptor> {
        let amount = self
            .fee
            .amount
            .parse::<u128>()
            .with_context(|| format!("fee.amount {:?} is not a whole number", self.fee.amount))?;
        Ok(FeeDescriptor::new(amount, &self.chain.denom, self.fee.gas_limit))
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            grpc_endpoint: self.chain.grpc_endpoint.clone(),
            connection_timeout: self.chain.connection_timeout,
            request_timeout: self.chain.request_timeout,
            max_retries: self.chain.max_retries,
            chain_id: self.chain.chain_id.clone(),
        }
    }

    /// Signing mnemonic from the environment
    pub fn mnemonic_from_env() -> Result<String> {
        std::env::var(MNEMONIC_ENV).map_err(|_| anyhow!("{} is not set", MNEMONIC_ENV))
    }

    /// Bridge API key from the environment, if any
    pub fn bridge_key_from_env() -> Option<String> {
        std::env::var(BRIDGE_KEY_ENV).ok().filter(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.chain.grpc_endpoint, "http://localhost:9090");
        assert_eq!(config.chain.chain_id, "localnet");
        assert_eq!(config.chain.denom, "token");
        assert_eq!(config.signer.mode, SignerMode::Local);

        let fee = config.to_fee_descriptor().unwrap();
        assert_eq!(fee, FeeDescriptor::default_for("token"));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("cosmos_send_config_{}.toml", uuid::Uuid::new_v4()));

        let mut config = Config::default();
        config.chain.denom = "uatom".to_string();
        config.fee.amount = "2500".to_string();
        config.signer.mode = SignerMode::Bridge;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
        assert_eq!(loaded.to_fee_descriptor().unwrap(), FeeDescriptor::new(2500, "uatom", 200_000));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [chain]
            grpc_endpoint = "http://node:9090"
            chain_id = "cosmoshub-4"
            denom = "uatom"
            address_prefix = "cosmos"
            "#,
        )
        .unwrap();

        assert_eq!(config.chain.max_retries, 3);
        assert_eq!(config.fee, FeeConfig::default());
        assert_eq!(config.signer, SignerConfig::default());

        let client = config.client_config();
        assert_eq!(client.grpc_endpoint, "http://node:9090");
        assert_eq!(client.chain_id, "cosmoshub-4");
    }

    #[test]
    fn test_rejects_bad_fee() {
        let mut config = Config::default();
        config.fee.amount = "-1".to_string();
        assert!(config.validate().is_err());
        assert!(config.to_fee_descriptor().is_err());
    }
}
