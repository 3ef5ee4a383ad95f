use super::{resolve_wallet, short_id, Service};
use clap::Subcommand;
use coinvault_core::{MirrorStatus, TransactionKind};
use comfy_table::{presets::UTF8_FULL, Table};

#[derive(Subcommand)]
pub enum TransactionCommands {
    /// Send BTC from a wallet to an address
    Send {
        /// Wallet ID or name
        wallet: String,
        /// Recipient address
        address: String,
        /// Amount in BTC
        amount: f64,
        /// Flat fee in BTC
        #[arg(short, long, default_value = "0.0001")]
        fee: f64,
        /// Free-form note stored with the transaction
        #[arg(short, long)]
        note: Option<String>,
    },
    /// Record BTC received into a wallet
    Receive {
        /// Wallet ID or name
        wallet: String,
        /// Sender address
        from: String,
        /// Amount in BTC
        amount: f64,
        /// Free-form note stored with the transaction
        #[arg(short, long)]
        note: Option<String>,
    },
    /// Show transaction history
    History {
        /// Wallet ID or name
        wallet: String,
        /// Number of transactions to show (0 shows all)
        #[arg(short, long, default_value = "10")]
        limit: i64,
    },
}

pub fn handle_transaction_command(cmd: TransactionCommands, service: &Service) -> anyhow::Result<()> {
    match cmd {
        TransactionCommands::Send {
            wallet,
            address,
            amount,
            fee,
            note,
        } => {
            let wallet = resolve_wallet(service, &wallet)?;

            println!(
                "Sending {:.8} BTC (fee {:.8}) from '{}' to {}...",
                amount, fee, wallet.name, address
            );
            let receipt = service.send(&wallet.id, &address, amount, fee, note)?;

            println!("Transaction recorded successfully!");
            println!("Transaction ID: {}", receipt.transaction.id);
            match receipt.mirror {
                MirrorStatus::NotLocal => {}
                MirrorStatus::Credited { wallet_id } => {
                    println!("Credited local wallet {}", short_id(&wallet_id));
                }
                MirrorStatus::Failed { wallet_id, reason } => {
                    println!(
                        "Warning: local wallet {} was not credited: {}",
                        short_id(&wallet_id),
                        reason
                    );
                }
            }
            println!("New balance: {:.8} BTC", service.get_balance(&wallet.id)?);
        }

        TransactionCommands::Receive {
            wallet,
            from,
            amount,
            note,
        } => {
            let wallet = resolve_wallet(service, &wallet)?;
            let transaction = service.receive(&wallet.id, &from, amount, note)?;

            println!("Received {:.8} BTC into '{}'", amount, wallet.name);
            println!("Transaction ID: {}", transaction.id);
            println!("New balance: {:.8} BTC", service.get_balance(&wallet.id)?);
        }

        TransactionCommands::History { wallet, limit } => {
            let wallet = resolve_wallet(service, &wallet)?;
            let history = service.transaction_history(&wallet.id, limit)?;

            if history.is_empty() {
                println!("No transactions found for '{}'.", wallet.name);
                return Ok(());
            }

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Time", "Type", "Amount (BTC)", "Fee", "Counterparty", "Note"]);

            for tx in history {
                let (kind, counterparty) = match tx.kind {
                    TransactionKind::Send => ("Send", tx.to),
                    TransactionKind::Receive => ("Receive", tx.from),
                };
                table.add_row(vec![
                    tx.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                    kind.to_string(),
                    format!("{:.8}", tx.amount),
                    format!("{:.8}", tx.fee),
                    counterparty,
                    tx.note.unwrap_or_default(),
                ]);
            }

            println!("{}", table);
        }
    }

    Ok(())
}
