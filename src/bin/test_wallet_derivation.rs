use cosmos_send::chain::wallet::{account_address, validate_address, CosmosWallet, COSMOS_HD_PATH};

fn main() {
    let mnemonic = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    println!("=== Testing Wallet Address Derivation ===\n");
    println!("Path: {}", COSMOS_HD_PATH);

    for prefix in ["cosmos", "osmo", "juno"] {
        match CosmosWallet::from_mnemonic(mnemonic, "", prefix) {
            Ok(wallet) => {
                let public_key = wallet.public_key_compressed();
                println!("\n{} wallet:", prefix);
                println!("Address: {}", wallet.address);
                println!("Public key (hex): {}", hex::encode(public_key));
                println!("Public key length: {} bytes", public_key.len());

                match account_address(&public_key, prefix) {
                    Ok(address) if address == wallet.address => println!("Re-derived address matches"),
                    Ok(address) => eprintln!("Re-derived address differs: {}", address),
                    Err(e) => eprintln!("Error re-deriving address: {}", e),
                }
                if let Err(e) = validate_address(&wallet.address, prefix) {
                    eprintln!("Address failed validation: {}", e);
                }
            }
            Err(e) => {
                eprintln!("Error with {} wallet: {}", prefix, e);
            }
        }
    }

    println!("\nExpected cosmos address: cosmos19rl4cm2hmr8afy4kldpxz3fka4jguq0auqdal4");
}
