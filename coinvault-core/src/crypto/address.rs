use crate::codec::{base58, bech32};
use crate::error::{Result, VaultError};

use bitcoin::Network;
use ripemd::Ripemd160;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

pub const HASH160_LEN: usize = 20;

const P2PKH_VERSION: u8 = 0x00;
const WITNESS_VERSION_0: u8 = 0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFormat {
    /// Base58Check pay-to-pubkey-hash (`1...`).
    Legacy,
    /// Bech32 witness v0 pay-to-witness-pubkey-hash (`bc1q...` / `tb1q...`).
    #[default]
    Segwit,
}

impl fmt::Display for AddressFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFormat::Legacy => write!(f, "legacy"),
            AddressFormat::Segwit => write!(f, "segwit"),
        }
    }
}

impl FromStr for AddressFormat {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "legacy" | "p2pkh" => Ok(AddressFormat::Legacy),
            "segwit" | "bech32" | "p2wpkh" => Ok(AddressFormat::Segwit),
            _ => Err(VaultError::config(format!(
                "Invalid address format: {}. Supported formats: legacy, segwit",
                s
            ))),
        }
    }
}

/// `RIPEMD160(SHA256(data))`.
pub fn hash160(data: &[u8]) -> [u8; HASH160_LEN] {
    let sha = Sha256::digest(data);
    let ripe = Ripemd160::digest(sha);

    let mut hash = [0u8; HASH160_LEN];
    hash.copy_from_slice(&ripe);
    hash
}

pub fn legacy_address(public_key: &[u8]) -> String {
    base58::checksum_encode(P2PKH_VERSION, &hash160(public_key))
}

pub fn segwit_address(public_key: &[u8], hrp: &str) -> Result<String> {
    if hrp != "bc" && hrp != "tb" {
        return Err(VaultError::invalid_input(format!(
            "unsupported segwit prefix: {}",
            hrp
        )));
    }
    bech32::encode(hrp, WITNESS_VERSION_0, &hash160(public_key))
}

/// Human-readable part for native segwit addresses on `network`.
pub fn segwit_hrp(network: Network) -> &'static str {
    match network {
        Network::Bitcoin => "bc",
        _ => "tb",
    }
}

/// Derive the address a wallet records for `public_key`.
pub fn derive_address(public_key: &[u8], format: AddressFormat, network: Network) -> Result<String> {
    match format {
        AddressFormat::Legacy => Ok(legacy_address(public_key)),
        AddressFormat::Segwit => segwit_address(public_key, segwit_hrp(network)),
    }
}
