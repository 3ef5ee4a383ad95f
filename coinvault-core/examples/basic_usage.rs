use coinvault_core::{JsonWalletStore, MirrorStatus, WalletConfig, WalletService};
use std::sync::Arc;
use tempfile::tempdir;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Create temp dir
    let temp_dir = tempdir()?;
    let path = temp_dir.path().join("wallets.json");
    println!("Using snapshot file: {:?}", path);

    // Open the ledger and build the service
    let store = Arc::new(JsonWalletStore::open(&path)?);
    let service = WalletService::new(store, WalletConfig::default())?;

    println!("Creating wallet...");
    let wallet = service.create_wallet("example-wallet")?;
    println!("Wallet ID: {}", wallet.id);
    println!("Address: {}", wallet.address);
    println!("Balance: {} BTC", wallet.balance);

    // Fund it from an outside address
    let incoming = service.receive(&wallet.id, "X", 0.5, Some("faucet".to_string()))?;
    println!("\nReceived {} BTC in {}", incoming.amount, incoming.id);

    // Pay an address this ledger does not know about
    let receipt = service.send(
        &wallet.id,
        "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4",
        0.2,
        0.0001,
        None,
    )?;
    println!("Sent {} BTC in {}", receipt.transaction.amount, receipt.transaction.id);
    if receipt.mirror == MirrorStatus::NotLocal {
        println!("Destination is external, no local credit recorded");
    }

    println!("\nBalance: {} BTC", service.get_balance(&wallet.id)?);

    // Get transaction history
    let history = service.transaction_history(&wallet.id, 0)?;
    println!("\nTransaction history: {} transactions", history.len());
    for tx in &history {
        println!(
            "  {:?} {} BTC (fee {}) {} -> {}",
            tx.kind, tx.amount, tx.fee, tx.from, tx.to
        );
    }

    println!("\nExample completed successfully!");

    Ok(())
}
