pub mod wallet_store;

pub use wallet_store::JsonWalletStore;

use crate::error::Result;
use crate::types::Wallet;

/// Wallet persistence as seen by the orchestration layer.
///
/// Lookups hand out owned copies; callers mutate their copy and write it back
/// with [`update`](WalletRepository::update).
pub trait WalletRepository: Send + Sync {
    /// Insert a new wallet. Fails with `WalletExists` on a duplicate id.
    fn save(&self, wallet: &Wallet) -> Result<()>;

    fn find_by_id(&self, id: &str) -> Result<Wallet>;

    fn find_by_address(&self, address: &str) -> Result<Wallet>;

    fn find_all(&self) -> Result<Vec<Wallet>>;

    /// Replace an existing wallet. Fails with `WalletNotFound` if absent.
    fn update(&self, wallet: &Wallet) -> Result<()>;

    fn delete(&self, id: &str) -> Result<()>;
}
