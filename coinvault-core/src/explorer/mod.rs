//! Remote balance lookups against an Esplora-compatible block explorer.

use crate::error::{Result, VaultError};
use crate::types::sats_to_btc;
use crate::wallet::WalletConfig;

use async_trait::async_trait;
use serde::Deserialize;

/// Source of an address's on-chain balance, in BTC.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn fetch_balance(&self, address: &str) -> Result<f64>;
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressStats {
    #[serde(default)]
    pub funded_txo_count: u64,
    pub funded_txo_sum: i64,
    #[serde(default)]
    pub spent_txo_count: u64,
    pub spent_txo_sum: i64,
    #[serde(default)]
    pub tx_count: u64,
}

impl AddressStats {
    fn net_sats(&self) -> Option<i64> {
        self.funded_txo_sum.checked_sub(self.spent_txo_sum)
    }
}

/// Body of `GET /address/{address}`.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressInfo {
    pub address: String,
    pub chain_stats: AddressStats,
    pub mempool_stats: AddressStats,
}

impl AddressInfo {
    /// Confirmed plus unconfirmed net balance.
    ///
    /// Sums that leave the `i64` range are reported as a malformed response.
    pub fn balance_sats(&self) -> Result<i64> {
        self.chain_stats
            .net_sats()
            .zip(self.mempool_stats.net_sats())
            .and_then(|(chain, mempool)| chain.checked_add(mempool))
            .ok_or_else(|| {
                VaultError::network(format!(
                    "Malformed explorer response: balance of {} out of range",
                    self.address
                ))
            })
    }

    pub fn balance_btc(&self) -> Result<f64> {
        self.balance_sats().map(sats_to_btc)
    }
}

pub struct EsploraExplorer {
    base_url: String,
    client: reqwest::Client,
}

impl EsploraExplorer {
    pub fn new(config: &WalletConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| VaultError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.esplora_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn address_info(&self, address: &str) -> Result<AddressInfo> {
        let url = format!("{}/address/{}", self.base_url, address);
        tracing::debug!("Querying {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| VaultError::network(format!("Failed to query explorer: {}", e)))?;

        if !response.status().is_success() {
            return Err(VaultError::network(format!(
                "Explorer returned HTTP {} for {}",
                response.status(),
                address
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| VaultError::network(format!("Failed to read explorer response: {}", e)))?;

        serde_json::from_slice(&body)
            .map_err(|e| VaultError::network(format!("Malformed explorer response: {}", e)))
    }
}

#[async_trait]
impl BalanceSource for EsploraExplorer {
    async fn fetch_balance(&self, address: &str) -> Result<f64> {
        self.address_info(address).await?.balance_btc()
    }
}
