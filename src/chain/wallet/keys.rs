use anyhow::{anyhow, bail, Result};
use bech32::{self, Hrp};
use bip32::{DerivationPath, XPrv};
use bip39::Mnemonic;
use rand::RngCore;
use ripemd::Ripemd160;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Standard Cosmos HD path (coin type 118)
pub const COSMOS_HD_PATH: &str = "m/44'/118'/0'/0/0";
pub const DEFAULT_PREFIX: &str = "cosmos";

/// Secp256k1 account key for a Cosmos SDK chain
/// Derived with BIP32 from a BIP39 mnemonic; secrets are zeroized on drop
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct CosmosWallet {
    #[zeroize(skip)] // Public data doesn't need zeroizing
    pub address: String,

    private_key_bytes: [u8; 32],
    public_key_bytes: [u8; 33],
}

// Key material stays out of logs
impl fmt::Debug for CosmosWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CosmosWallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl CosmosWallet {
    /// Create a wallet from a BIP39 mnemonic phrase with optional passphrase
    pub fn from_mnemonic(mnemonic_str: &str, passphrase: &str, prefix: &str) -> Result<Self> {
        let mnemonic = Mnemonic::parse(mnemonic_str.trim())?;
        let mut seed = mnemonic.to_seed(passphrase);

        let path: DerivationPath = COSMOS_HD_PATH
            .parse()
            .map_err(|e| anyhow!("Invalid derivation path: {}", e))?;
        let derived = XPrv::derive_from_path(seed, &path)
            .map_err(|e| anyhow!("Failed to derive key: {}", e));
        seed.zeroize();
        let mut private_key = derived?.to_bytes();

        let secp = Secp256k1::new();
        let secret_key = SecretKey::from_slice(&private_key)?;
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        let address = account_address(&public_key.serialize(), prefix)?;

        let wallet = Self {
            address,
            private_key_bytes: private_key,
            public_key_bytes: public_key.serialize(),
        };
        private_key.zeroize();

        Ok(wallet)
    }

    /// Create a wallet from a mnemonic with no passphrase and the default prefix
    pub fn from_mnemonic_no_passphrase(mnemonic_str: &str) -> Result<Self> {
        Self::from_mnemonic(mnemonic_str, "", DEFAULT_PREFIX)
    }

    /// Get the private key as a SecretKey (for signing)
    pub fn private_key(&self) -> Result<SecretKey> {
        SecretKey::from_slice(&self.private_key_bytes).map_err(|e| anyhow!("Invalid private key: {}", e))
    }

    /// Compressed public key (33 bytes)
    pub fn public_key_compressed(&self) -> [u8; 33] {
        self.public_key_bytes
    }
}

/// Generate a fresh 24-word mnemonic
pub fn generate_mnemonic() -> Result<String> {
    let mut entropy = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut entropy);
    let mnemonic = Mnemonic::from_entropy(&entropy);
    entropy.zeroize();
    Ok(mnemonic?.to_string())
}

/// Bech32 account address: ripemd160(sha256(compressed pubkey))
pub fn account_address(compressed_pubkey: &[u8], prefix: &str) -> Result<String> {
    let sha = Sha256::digest(compressed_pubkey);
    let hash = Ripemd160::digest(sha);

    let hrp = Hrp::parse(prefix)?;
    Ok(bech32::encode::<bech32::Bech32>(hrp, &hash)?)
}

/// Check that `address` is a bech32 account address with the expected prefix
pub fn validate_address(address: &str, prefix: &str) -> Result<()> {
    let (hrp, data) = bech32::decode(address)?;
    if hrp.as_str() != prefix {
        bail!("Address prefix {} does not match expected {}", hrp.as_str(), prefix);
    }
    if data.len() != 20 && data.len() != 32 {
        bail!("Invalid address length: {} bytes", data.len());
    }
    Ok(())
}
