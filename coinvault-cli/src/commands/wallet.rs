use super::{confirm, resolve_wallet, short_id, Service};
use anyhow::Context;
use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Table};
use dialoguer::Password;

#[derive(Subcommand)]
pub enum WalletCommands {
    /// Create a new wallet with a fresh key
    Create {
        /// Wallet name
        name: String,
    },
    /// Import a wallet from a hex private key
    Import {
        /// Wallet name
        name: String,
        /// Private key in hex (will prompt if not provided)
        #[arg(short, long)]
        private_key: Option<String>,
    },
    /// List all wallets
    List,
    /// Export a wallet's private key
    Export {
        /// Wallet ID or name
        wallet: String,
        /// Print Wallet Import Format instead of hex
        #[arg(long)]
        wif: bool,
        /// Mark the WIF key as compressed
        #[arg(long, requires = "wif")]
        compressed: bool,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Delete a wallet
    Delete {
        /// Wallet ID or name
        wallet: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

pub fn handle_wallet_command(cmd: WalletCommands, service: &Service) -> anyhow::Result<()> {
    match cmd {
        WalletCommands::Create { name } => {
            println!("Creating wallet '{}'...", name);
            let wallet = service.create_wallet(&name)?;

            println!("Wallet created successfully!");
            println!("  Name: {}", wallet.name);
            println!("  ID: {}", wallet.id);
            println!("  Address: {}", wallet.address);
        }

        WalletCommands::Import { name, private_key } => {
            let private_key = match private_key {
                Some(key) => key,
                None => Password::new()
                    .with_prompt("Enter private key (hex)")
                    .interact()
                    .context("Failed to read private key")?,
            };

            println!("Importing wallet '{}'...", name);
            let wallet = service.import_wallet(&name, &private_key)?;

            println!("Wallet imported successfully!");
            println!("  Name: {}", wallet.name);
            println!("  ID: {}", wallet.id);
            println!("  Address: {}", wallet.address);
        }

        WalletCommands::List => {
            let wallets = service.list_wallets()?;

            if wallets.is_empty() {
                println!("No wallets found.");
                println!("Create a new wallet with: coinvault create <name>");
                return Ok(());
            }

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["ID", "Name", "Address", "Balance (BTC)", "Txs", "Created"]);

            for wallet in wallets {
                table.add_row(vec![
                    short_id(&wallet.id).to_string(),
                    wallet.name,
                    wallet.address,
                    format!("{:.8}", wallet.balance),
                    wallet.transaction_count.to_string(),
                    wallet.created_at.format("%Y-%m-%d %H:%M").to_string(),
                ]);
            }

            println!("{}", table);
        }

        WalletCommands::Export {
            wallet,
            wif,
            compressed,
            force,
        } => {
            let wallet = resolve_wallet(service, &wallet)?;

            if !force
                && !confirm(format!(
                    "Print the private key of wallet '{}' to the terminal?",
                    wallet.name
                ))?
            {
                println!("Export cancelled.");
                return Ok(());
            }

            let secret = if wif {
                service.export_wif(&wallet.id, compressed)?
            } else {
                service.export_private_key(&wallet.id)?
            };

            println!("WARNING: Anyone with this key controls the wallet's funds.");
            println!("{}", secret);
        }

        WalletCommands::Delete { wallet, force } => {
            let wallet = resolve_wallet(service, &wallet)?;

            if !force
                && !confirm(format!(
                    "Are you sure you want to delete wallet '{}'? This action cannot be undone.",
                    wallet.name
                ))?
            {
                println!("Deletion cancelled.");
                return Ok(());
            }

            service.delete_wallet(&wallet.id)?;
            println!("Wallet '{}' deleted successfully.", wallet.name);
        }
    }

    Ok(())
}
