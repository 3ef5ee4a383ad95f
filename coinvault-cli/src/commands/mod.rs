pub mod balance;
pub mod transaction;
pub mod wallet;

pub use balance::{handle_balance_command, BalanceCommands};
pub use transaction::{handle_transaction_command, TransactionCommands};
pub use wallet::{handle_wallet_command, WalletCommands};

use coinvault_core::{JsonWalletStore, Result, VaultError, Wallet, WalletService};
use dialoguer::Confirm;

pub type Service = WalletService<JsonWalletStore>;

/// Look a wallet up by id, falling back to an unambiguous name.
pub fn resolve_wallet(service: &Service, key: &str) -> Result<Wallet> {
    match service.get_wallet(key) {
        Err(VaultError::WalletNotFound { .. }) => {}
        other => return other,
    }

    let mut matches = service
        .list_wallets()?
        .into_iter()
        .filter(|info| info.name == key);

    match (matches.next(), matches.next()) {
        (Some(info), None) => service.get_wallet(&info.id),
        (Some(_), Some(_)) => Err(VaultError::invalid_input(format!(
            "Several wallets are named '{}', use the wallet ID instead",
            key
        ))),
        _ => Err(VaultError::wallet_not_found(key)),
    }
}

pub fn confirm(prompt: String) -> anyhow::Result<bool> {
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}
