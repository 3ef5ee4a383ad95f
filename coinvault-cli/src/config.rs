use coinvault_core::{AddressFormat, Network, Result, VaultError, WalletConfig};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub data_file: PathBuf,
    pub network: Network,
    pub address_format: AddressFormat,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            network: Network::Bitcoin,
            address_format: AddressFormat::Segwit,
        }
    }
}

impl CliConfig {
    pub fn from_args(
        data_file: Option<PathBuf>,
        network: &str,
        format: Option<&str>,
    ) -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            data_file: data_file.unwrap_or(defaults.data_file),
            network: parse_network(network)?,
            address_format: match format {
                Some(format) => format.parse()?,
                None => defaults.address_format,
            },
        })
    }

    pub fn wallet_config(&self) -> WalletConfig {
        WalletConfig::new(self.network).with_address_format(self.address_format)
    }
}

/// `<home>/.coinvault/wallets.json`, or the working directory without a home.
pub fn default_data_file() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".coinvault")
        .join("wallets.json")
}

pub fn parse_network(network: &str) -> Result<Network> {
    match network.to_lowercase().as_str() {
        "bitcoin" | "mainnet" => Ok(Network::Bitcoin),
        "testnet" => Ok(Network::Testnet),
        "signet" => Ok(Network::Signet),
        "regtest" => Ok(Network::Regtest),
        _ => Err(VaultError::config(format!(
            "Invalid network: {}. Supported networks: bitcoin, testnet, signet, regtest",
            network
        ))),
    }
}
