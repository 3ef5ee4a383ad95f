//! CoinVault core - custodial wallet engine
//!
//! Key generation and address derivation, local transaction fingerprints and
//! signatures, and a JSON-backed wallet ledger with a send/receive service on
//! top. Transfers are recorded locally only; nothing is broadcast.

pub mod codec;
pub mod crypto;
pub mod error;
pub mod explorer;
pub mod storage;
pub mod types;
pub mod wallet;

pub use crypto::{AddressFormat, KeyPair};
pub use error::{ErrorKind, Result, VaultError};
pub use explorer::{BalanceSource, EsploraExplorer};
pub use storage::{JsonWalletStore, WalletRepository};
pub use types::{Transaction, TransactionKind, TransactionStatus, Wallet, WalletInfo};
pub use wallet::{MirrorStatus, SendReceipt, WalletConfig, WalletService};

pub use ::bitcoin::Network;
