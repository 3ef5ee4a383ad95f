use super::{resolve_wallet, Service};
use bitcoin::SignedAmount;
use clap::Subcommand;
use coinvault_core::types::btc_to_sats;
use coinvault_core::EsploraExplorer;
use comfy_table::{presets::UTF8_FULL, Table};

#[derive(Subcommand)]
pub enum BalanceCommands {
    /// Show wallet balance
    Balance {
        /// Wallet ID or name
        wallet: String,
    },
    /// Fetch the on-chain balance from the block explorer
    Sync {
        /// Wallet ID or name
        wallet: String,
    },
}

pub async fn handle_balance_command(cmd: BalanceCommands, service: &Service) -> anyhow::Result<()> {
    match cmd {
        BalanceCommands::Balance { wallet } => {
            let wallet = resolve_wallet(service, &wallet)?;

            println!("Balance for wallet '{}':", wallet.name);
            println!("  Address: {}", wallet.address);

            let ledger = SignedAmount::from_sat(btc_to_sats(wallet.balance));
            println!("  Ledger: {} sats ({:.8} BTC)", ledger.to_sat(), ledger.to_btc());

            match (wallet.chain_balance, wallet.synced_at) {
                (Some(chain), Some(synced_at)) => {
                    let chain = SignedAmount::from_sat(btc_to_sats(chain));
                    println!(
                        "  On-chain: {} sats ({:.8} BTC) as of {}",
                        chain.to_sat(),
                        chain.to_btc(),
                        synced_at.format("%Y-%m-%d %H:%M:%S UTC")
                    );
                }
                _ => println!("  On-chain: not synced (run: coinvault sync <wallet>)"),
            }
        }

        BalanceCommands::Sync { wallet } => {
            let wallet = resolve_wallet(service, &wallet)?;
            let explorer = EsploraExplorer::new(service.config())?;

            println!(
                "Fetching balance for {} from {}...",
                wallet.address,
                explorer.base_url()
            );
            let chain_balance = service.sync_wallet(&wallet.id, &explorer).await?;

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Source", "Balance (BTC)"]);
            table.add_row(vec!["Ledger".to_string(), format!("{:.8}", wallet.balance)]);
            table.add_row(vec!["On-chain".to_string(), format!("{:.8}", chain_balance)]);
            println!("{}", table);
        }
    }

    Ok(())
}
