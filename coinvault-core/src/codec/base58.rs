use crate::error::{Result, VaultError};
use sha2::{Digest, Sha256};

const ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

const CHECKSUM_LEN: usize = 4;

// Reverse lookup, -1 marks characters outside the alphabet (0 O I l).
const DECODE_MAP: [i8; 128] = {
    let mut map = [-1i8; 128];
    let mut i = 0;
    while i < ALPHABET.len() {
        map[ALPHABET[i] as usize] = i as i8;
        i += 1;
    }
    map
};

/// Encode `payload` as a big-endian base-58 number, one `'1'` per leading zero byte.
pub fn encode(payload: &[u8]) -> String {
    let zeros = payload.iter().take_while(|&&b| b == 0).count();

    // Base-58 digits, least significant first.
    let mut digits: Vec<u8> = Vec::with_capacity(payload.len() * 138 / 100 + 1);
    for &byte in &payload[zeros..] {
        let mut carry = byte as u32;
        for digit in digits.iter_mut() {
            carry += (*digit as u32) << 8;
            *digit = (carry % 58) as u8;
            carry /= 58;
        }
        while carry > 0 {
            digits.push((carry % 58) as u8);
            carry /= 58;
        }
    }

    let mut encoded = String::with_capacity(zeros + digits.len());
    encoded.extend(std::iter::repeat('1').take(zeros));
    encoded.extend(digits.iter().rev().map(|&d| ALPHABET[d as usize] as char));
    encoded
}

/// Decode a base-58 string. Leading `'1'`s map back to leading zero bytes.
pub fn decode(input: &str) -> Result<Vec<u8>> {
    let mut zeros = 0;
    let mut leading = true;
    // Base-256 bytes, least significant first.
    let mut bytes: Vec<u8> = Vec::with_capacity(input.len() * 733 / 1000 + 1);

    for (position, character) in input.chars().enumerate() {
        let value = digit_value(character)
            .ok_or(VaultError::InvalidCharacter { character, position })?;

        if leading && value == 0 {
            zeros += 1;
            continue;
        }
        leading = false;

        let mut carry = value as u32;
        for byte in bytes.iter_mut() {
            carry += (*byte as u32) * 58;
            *byte = (carry & 0xff) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.push((carry & 0xff) as u8);
            carry >>= 8;
        }
    }

    let mut decoded = vec![0u8; zeros];
    decoded.extend(bytes.iter().rev());
    Ok(decoded)
}

/// Base58Check: `version ‖ payload ‖ sha256d(version ‖ payload)[..4]`.
pub fn checksum_encode(version: u8, payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(1 + payload.len() + CHECKSUM_LEN);
    data.push(version);
    data.extend_from_slice(payload);
    let check = checksum(&data);
    data.extend_from_slice(&check);
    encode(&data)
}

/// Inverse of [`checksum_encode`], returning the version byte and payload.
pub fn checksum_decode(input: &str) -> Result<(u8, Vec<u8>)> {
    let mut data = decode(input)?;
    if data.len() < 1 + CHECKSUM_LEN {
        return Err(VaultError::decode(format!(
            "Base58Check string too short: {} bytes",
            data.len()
        )));
    }

    let split = data.len() - CHECKSUM_LEN;
    if checksum(&data[..split]) != data[split..] {
        return Err(VaultError::InvalidChecksum);
    }

    data.truncate(split);
    let payload = data.split_off(1);
    Ok((data[0], payload))
}

fn checksum(data: &[u8]) -> [u8; CHECKSUM_LEN] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    let mut check = [0u8; CHECKSUM_LEN];
    check.copy_from_slice(&second[..CHECKSUM_LEN]);
    check
}

fn digit_value(character: char) -> Option<u8> {
    let index = character as usize;
    if index >= DECODE_MAP.len() {
        return None;
    }
    match DECODE_MAP[index] {
        -1 => None,
        value => Some(value as u8),
    }
}
