pub mod config;
pub mod service;

pub use config::WalletConfig;
pub use service::{MirrorStatus, SendReceipt, WalletService};
