//! Bech32 (BIP-173) for segwit witness programs.
//!
//! Only the original Bech32 constant is implemented; Bech32m (witness v1+)
//! is not needed for version-0 pay-to-witness-pubkey-hash addresses.

use crate::error::{Result, VaultError};

const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

const GENERATORS: [u32; 5] = [0x3b6a57b2, 0x26508e6d, 0x1ea119fa, 0x3d4233dd, 0x2a1462b3];

const SEPARATOR: char = '1';
const CHECKSUM_LEN: usize = 6;
const MAX_LEN: usize = 90;

/// A decoded segwit address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WitnessProgram {
    pub hrp: String,
    pub version: u8,
    pub program: Vec<u8>,
}

/// Encode `program` under `hrp` with the given witness version.
pub fn encode(hrp: &str, version: u8, program: &[u8]) -> Result<String> {
    validate_hrp(hrp)?;

    let mut data = Vec::with_capacity(1 + (program.len() * 8 + 4) / 5 + CHECKSUM_LEN);
    data.push(version);
    data.extend(convert_bits(program, 8, 5, true)?);

    let checksum = create_checksum(hrp, &data);
    data.extend_from_slice(&checksum);

    let mut encoded = String::with_capacity(hrp.len() + 1 + data.len());
    encoded.push_str(hrp);
    encoded.push(SEPARATOR);
    for value in data {
        let symbol = CHARSET.get(value as usize).ok_or_else(|| {
            VaultError::encoding(format!("5-bit value out of range: {}", value))
        })?;
        encoded.push(*symbol as char);
    }

    Ok(encoded)
}

/// Decode and verify a segwit address.
pub fn decode(address: &str) -> Result<WitnessProgram> {
    if address.len() > MAX_LEN {
        return Err(VaultError::decode(format!(
            "bech32 string longer than {} characters",
            MAX_LEN
        )));
    }

    let has_lower = address.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = address.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        return Err(VaultError::decode("bech32 string uses mixed case"));
    }
    let address = address.to_ascii_lowercase();

    let separator = address
        .rfind(SEPARATOR)
        .ok_or_else(|| VaultError::decode("missing bech32 separator"))?;
    if separator == 0 || separator + 1 + CHECKSUM_LEN > address.len() {
        return Err(VaultError::decode("bech32 separator misplaced"));
    }

    let hrp = &address[..separator];
    validate_hrp(hrp)?;

    let mut data = Vec::with_capacity(address.len() - separator - 1);
    for (offset, character) in address[separator + 1..].chars().enumerate() {
        let value = CHARSET
            .iter()
            .position(|&c| c as char == character)
            .ok_or(VaultError::InvalidCharacter {
                character,
                position: separator + 1 + offset,
            })?;
        data.push(value as u8);
    }

    if !verify_checksum(hrp, &data) {
        return Err(VaultError::InvalidChecksum);
    }

    let payload = &data[..data.len() - CHECKSUM_LEN];
    let (&version, rest) = payload
        .split_first()
        .ok_or_else(|| VaultError::decode("missing witness version"))?;
    if version > 16 {
        return Err(VaultError::decode(format!(
            "invalid witness version: {}",
            version
        )));
    }

    let program = convert_bits(rest, 5, 8, false)?;
    if !(2..=40).contains(&program.len()) {
        return Err(VaultError::decode(format!(
            "invalid witness program length: {}",
            program.len()
        )));
    }
    if version == 0 && program.len() != 20 && program.len() != 32 {
        return Err(VaultError::decode(format!(
            "invalid v0 witness program length: {}",
            program.len()
        )));
    }

    Ok(WitnessProgram {
        hrp: hrp.to_string(),
        version,
        program,
    })
}

fn validate_hrp(hrp: &str) -> Result<()> {
    if hrp.is_empty() || hrp.len() > 83 {
        return Err(VaultError::encoding(format!(
            "invalid human-readable part length: {}",
            hrp.len()
        )));
    }
    if let Some(bad) = hrp.chars().find(|c| !(33..=126).contains(&(*c as u32))) {
        return Err(VaultError::encoding(format!(
            "invalid human-readable part character: {:?}",
            bad
        )));
    }
    Ok(())
}

/// Regroup `data` from `from`-bit to `to`-bit values.
fn convert_bits(data: &[u8], from: u32, to: u32, pad: bool) -> Result<Vec<u8>> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let max_value: u32 = (1 << to) - 1;
    let max_acc: u32 = (1 << (from + to - 1)) - 1;
    let mut converted = Vec::with_capacity(data.len() * from as usize / to as usize + 1);

    for &value in data {
        if (value as u32) >> from != 0 {
            return Err(VaultError::encoding(format!(
                "value {} does not fit in {} bits",
                value, from
            )));
        }
        acc = ((acc << from) | value as u32) & max_acc;
        bits += from;
        while bits >= to {
            bits -= to;
            converted.push(((acc >> bits) & max_value) as u8);
        }
    }

    if pad {
        if bits > 0 {
            converted.push(((acc << (to - bits)) & max_value) as u8);
        }
    } else if bits >= from || ((acc << (to - bits)) & max_value) != 0 {
        return Err(VaultError::decode("invalid padding in witness program"));
    }

    Ok(converted)
}

fn polymod(values: &[u8]) -> u32 {
    let mut chk: u32 = 1;
    for &value in values {
        let top = chk >> 25;
        chk = ((chk & 0x1ff_ffff) << 5) ^ value as u32;
        for (i, generator) in GENERATORS.iter().enumerate() {
            if (top >> i) & 1 == 1 {
                chk ^= generator;
            }
        }
    }
    chk
}

fn hrp_expand(hrp: &str) -> Vec<u8> {
    let bytes = hrp.as_bytes();
    let mut expanded = Vec::with_capacity(bytes.len() * 2 + 1);
    expanded.extend(bytes.iter().map(|b| b >> 5));
    expanded.push(0);
    expanded.extend(bytes.iter().map(|b| b & 31));
    expanded
}

fn create_checksum(hrp: &str, data: &[u8]) -> [u8; CHECKSUM_LEN] {
    let mut values = hrp_expand(hrp);
    values.extend_from_slice(data);
    values.extend_from_slice(&[0u8; CHECKSUM_LEN]);

    let modulus = polymod(&values) ^ 1;
    let mut checksum = [0u8; CHECKSUM_LEN];
    for (i, slot) in checksum.iter_mut().enumerate() {
        *slot = ((modulus >> (5 * (5 - i))) & 31) as u8;
    }
    checksum
}

fn verify_checksum(hrp: &str, data: &[u8]) -> bool {
    let mut values = hrp_expand(hrp);
    values.extend_from_slice(data);
    polymod(&values) == 1
}
