use crate::codec::base58;
use crate::error::{Result, VaultError};

use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::SecretKey;
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

pub const PRIVATE_KEY_LEN: usize = 32;
/// SEC1 uncompressed point: `0x04 ‖ X ‖ Y`.
pub const PUBLIC_KEY_LEN: usize = 65;

const WIF_MAINNET: u8 = 0x80;
const WIF_TESTNET: u8 = 0xef;
const WIF_COMPRESSED_FLAG: u8 = 0x01;

/// A P-256 key pair as raw bytes.
///
/// Keys live on NIST P-256 rather than secp256k1, so addresses and signatures
/// are self-consistent inside this wallet but not spendable on the real network.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    #[serde(with = "hex::serde")]
    private_key: Vec<u8>,
    #[serde(with = "hex::serde")]
    public_key: Vec<u8>,
}

impl KeyPair {
    /// Draw a fresh private scalar from the OS random source.
    pub fn generate() -> Result<Self> {
        let mut candidate = [0u8; PRIVATE_KEY_LEN];
        loop {
            OsRng
                .try_fill_bytes(&mut candidate)
                .map_err(|e| VaultError::KeyGeneration(format!("entropy source failed: {}", e)))?;

            // Zero and values >= the group order are redrawn.
            if let Ok(secret) = SecretKey::from_slice(&candidate) {
                candidate.zeroize();
                return Ok(Self::from_secret(&secret));
            }
        }
    }

    /// Rebuild a key pair from a hex private key by recomputing `d·G`.
    ///
    /// Keys shorter than 32 bytes are left-padded, so hex exported without
    /// leading zero bytes still imports to the same scalar.
    pub fn from_private_key_hex(private_key_hex: &str) -> Result<Self> {
        let secret = parse_secret_key(private_key_hex)?;
        Ok(Self::from_secret(&secret))
    }

    fn from_secret(secret: &SecretKey) -> Self {
        let public_key = secret
            .public_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec();

        Self {
            private_key: secret.to_bytes().to_vec(),
            public_key,
        }
    }

    pub fn private_key(&self) -> &[u8] {
        &self.private_key
    }

    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    pub fn private_key_hex(&self) -> String {
        hex::encode(&self.private_key)
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(&self.public_key)
    }

    pub fn to_wif(&self, compressed: bool, testnet: bool) -> String {
        encode_wif(&self.private_key, compressed, testnet)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("private_key", &"<redacted>")
            .field("public_key", &self.public_key_hex())
            .finish()
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}

/// Wallet Import Format: Base58Check over `version ‖ key ‖ [0x01]`.
pub fn private_key_to_wif(private_key_hex: &str, compressed: bool, testnet: bool) -> Result<String> {
    let secret = parse_secret_key(private_key_hex)?;
    Ok(encode_wif(&secret.to_bytes(), compressed, testnet))
}

fn encode_wif(private_key: &[u8], compressed: bool, testnet: bool) -> String {
    let version = if testnet { WIF_TESTNET } else { WIF_MAINNET };

    let mut payload = Vec::with_capacity(PRIVATE_KEY_LEN + 1);
    payload.extend_from_slice(private_key);
    if compressed {
        payload.push(WIF_COMPRESSED_FLAG);
    }

    let wif = base58::checksum_encode(version, &payload);
    payload.zeroize();
    wif
}

pub(crate) fn parse_secret_key(private_key_hex: &str) -> Result<SecretKey> {
    let trimmed = private_key_hex.trim();
    let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Err(VaultError::InvalidPrivateKey("empty key".to_string()));
    }

    let mut raw = hex::decode(trimmed)
        .map_err(|e| VaultError::InvalidPrivateKey(format!("malformed hex: {}", e)))?;
    if raw.len() > PRIVATE_KEY_LEN {
        let len = raw.len();
        raw.zeroize();
        return Err(VaultError::InvalidPrivateKey(format!(
            "expected at most {} bytes, got {}",
            PRIVATE_KEY_LEN, len
        )));
    }

    let mut padded = [0u8; PRIVATE_KEY_LEN];
    padded[PRIVATE_KEY_LEN - raw.len()..].copy_from_slice(&raw);
    raw.zeroize();

    let secret = SecretKey::from_slice(&padded)
        .map_err(|_| VaultError::InvalidPrivateKey("scalar is zero or out of range".to_string()));
    padded.zeroize();
    secret
}
