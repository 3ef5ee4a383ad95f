use crate::crypto::AddressFormat;
use crate::error::{Result, VaultError};
use bitcoin::Network;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const MAINNET_ESPLORA_URL: &str = "https://blockstream.info/api";
pub const TESTNET_ESPLORA_URL: &str = "https://blockstream.info/testnet/api";
pub const SIGNET_ESPLORA_URL: &str = "https://mempool.space/signet/api";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    pub network: Network,
    pub address_format: AddressFormat,
    pub esplora_url: String,
    pub request_timeout: Duration,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            network: Network::Bitcoin,
            address_format: AddressFormat::Segwit,
            esplora_url: MAINNET_ESPLORA_URL.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl WalletConfig {
    pub fn new(network: Network) -> Self {
        let mut config = Self::default();
        config.network = network;

        match network {
            Network::Testnet => {
                config.esplora_url = TESTNET_ESPLORA_URL.to_string();
            }
            Network::Signet => {
                config.esplora_url = SIGNET_ESPLORA_URL.to_string();
            }
            Network::Regtest => {
                config.esplora_url = "http://localhost:3000".to_string();
            }
            _ => {
                // keep mainnet defaults
            }
        }

        config
    }

    pub fn with_address_format(mut self, address_format: AddressFormat) -> Self {
        self.address_format = address_format;
        self
    }

    /// Whether keys should be exported with test-network version bytes.
    pub fn is_test_network(&self) -> bool {
        self.network != Network::Bitcoin
    }

    pub fn validate(&self) -> Result<()> {
        if self.esplora_url.is_empty() {
            return Err(VaultError::config("Esplora URL cannot be empty"));
        }

        if !self.esplora_url.starts_with("http://") && !self.esplora_url.starts_with("https://") {
            return Err(VaultError::config(format!(
                "Esplora URL must be http(s): {}",
                self.esplora_url
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(VaultError::config("Request timeout must be greater than 0"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_defaults() {
        let config = WalletConfig::default();
        assert_eq!(config.network, Network::Bitcoin);
        assert_eq!(config.address_format, AddressFormat::Segwit);
        assert_eq!(config.esplora_url, MAINNET_ESPLORA_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(!config.is_test_network());

        let testnet = WalletConfig::new(Network::Testnet);
        assert_eq!(testnet.esplora_url, TESTNET_ESPLORA_URL);
        assert!(testnet.is_test_network());

        let signet = WalletConfig::new(Network::Signet);
        assert_eq!(signet.esplora_url, SIGNET_ESPLORA_URL);
    }

    #[test]
    fn test_validate() {
        assert!(WalletConfig::default().validate().is_ok());

        let mut config = WalletConfig::default();
        config.esplora_url = String::new();
        assert!(config.validate().is_err());

        config.esplora_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = WalletConfig::default();
        config.request_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }
}
