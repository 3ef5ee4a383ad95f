mod commands;
mod config;

use clap::{Parser, Subcommand};
use coinvault_core::{JsonWalletStore, VaultError, WalletService};
use config::CliConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "coinvault")]
#[command(about = "CoinVault - custodial Bitcoin-style wallet")]
#[command(version)]
struct Cli {
    /// Wallet snapshot file
    #[arg(short, long, global = true)]
    data_file: Option<PathBuf>,

    /// Bitcoin network (bitcoin, testnet, signet, regtest)
    #[arg(long, global = true, default_value = "bitcoin")]
    network: String,

    /// Address format for new wallets (legacy, segwit)
    #[arg(long, global = true)]
    format: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Wallet(commands::WalletCommands),

    #[command(flatten)]
    Transaction(commands::TransactionCommands),

    #[command(flatten)]
    Balance(commands::BalanceCommands),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "coinvault_core={},coinvault={}",
            log_level, log_level
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<VaultError>() {
            Some(VaultError::WalletNotFound { id }) => {
                eprintln!("Error: Wallet '{}' not found", id);
                eprintln!("Use 'coinvault list' to see available wallets");
            }
            Some(VaultError::InsufficientBalance { need, available }) => {
                eprintln!("Error: Insufficient balance");
                eprintln!("Need: {:.8} BTC, Available: {:.8} BTC", need, available);
            }
            Some(VaultError::InvalidAmount(msg)) => {
                eprintln!("Error: Invalid amount: {}", msg);
            }
            _ => {
                eprintln!("Error: {:#}", e);
            }
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::from_args(
        cli.data_file,
        &cli.network,
        cli.format.as_deref(),
    )?;
    tracing::debug!("Using wallet snapshot {}", config.data_file.display());

    // Open the ledger
    let store = Arc::new(JsonWalletStore::open(&config.data_file)?);
    let service = WalletService::new(store, config.wallet_config())?;

    // Execute command
    match cli.command {
        Commands::Wallet(cmd) => commands::handle_wallet_command(cmd, &service),
        Commands::Transaction(cmd) => commands::handle_transaction_command(cmd, &service),
        Commands::Balance(cmd) => commands::handle_balance_command(cmd, &service).await,
    }
}
