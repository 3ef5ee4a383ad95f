//! Transaction fingerprints and ECDSA signatures over them.
//!
//! Signatures are encoded as `len(r) ‖ r ‖ len(s) ‖ s` with each scalar in
//! minimal big-endian form, so components of different byte length survive
//! the round trip.

use crate::crypto::keys::parse_secret_key;
use crate::error::{Result, VaultError};

use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use sha2::{Digest, Sha256};

const SCALAR_LEN: usize = 32;

/// Local bookkeeping id: `SHA256(from ‖ to ‖ amount ‖ timestamp)` as hex.
///
/// The amount is rendered with six decimals. This is not a network
/// transaction hash.
pub fn fingerprint(from: &str, to: &str, amount: f64, timestamp_secs: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(from.as_bytes());
    hasher.update(to.as_bytes());
    hasher.update(format!("{:.6}", amount).as_bytes());
    hasher.update(timestamp_secs.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Sign the raw fingerprint bytes with a hex private key.
pub fn sign(fingerprint_hex: &str, private_key_hex: &str) -> Result<String> {
    let digest = hex::decode(fingerprint_hex)
        .map_err(|e| VaultError::Signing(format!("invalid fingerprint hex: {}", e)))?;
    let secret = parse_secret_key(private_key_hex)
        .map_err(|e| VaultError::Signing(e.to_string()))?;

    let signing_key = SigningKey::from(secret);
    let signature: Signature = signing_key
        .sign_prehash(&digest)
        .map_err(|e| VaultError::Signing(e.to_string()))?;

    Ok(hex::encode(encode_signature(&signature)))
}

/// Check a signature produced by [`sign`] against an uncompressed public key.
pub fn verify(fingerprint_hex: &str, signature_hex: &str, public_key_hex: &str) -> Result<bool> {
    let digest = hex::decode(fingerprint_hex)
        .map_err(|e| VaultError::decode(format!("invalid fingerprint hex: {}", e)))?;
    let signature_bytes = hex::decode(signature_hex)
        .map_err(|e| VaultError::decode(format!("invalid signature hex: {}", e)))?;
    let public_key = hex::decode(public_key_hex)
        .map_err(|e| VaultError::decode(format!("invalid public key hex: {}", e)))?;

    let verifying_key = VerifyingKey::from_sec1_bytes(&public_key)
        .map_err(|_| VaultError::decode("public key is not a valid P-256 point"))?;

    let (r, s) = split_signature(&signature_bytes)?;
    let signature = match Signature::from_scalars(r, s) {
        Ok(signature) => signature,
        // Zero or out-of-range scalars can never verify.
        Err(_) => return Ok(false),
    };

    Ok(verifying_key.verify_prehash(&digest, &signature).is_ok())
}

fn encode_signature(signature: &Signature) -> Vec<u8> {
    let (r, s) = signature.split_bytes();
    let mut encoded = Vec::with_capacity(2 + 2 * SCALAR_LEN);
    for component in [r.as_slice(), s.as_slice()] {
        let first = component
            .iter()
            .position(|&b| b != 0)
            .unwrap_or(component.len() - 1);
        let trimmed = &component[first..];
        encoded.push(trimmed.len() as u8);
        encoded.extend_from_slice(trimmed);
    }
    encoded
}

fn split_signature(bytes: &[u8]) -> Result<([u8; SCALAR_LEN], [u8; SCALAR_LEN])> {
    let (r, rest) = read_component(bytes)?;
    let (s, rest) = read_component(rest)?;
    if !rest.is_empty() {
        return Err(VaultError::decode(format!(
            "{} trailing bytes after signature",
            rest.len()
        )));
    }
    Ok((r, s))
}

fn read_component(bytes: &[u8]) -> Result<([u8; SCALAR_LEN], &[u8])> {
    let (&len, rest) = bytes
        .split_first()
        .ok_or_else(|| VaultError::decode("truncated signature"))?;
    let len = len as usize;
    if len == 0 || len > SCALAR_LEN || rest.len() < len {
        return Err(VaultError::decode(format!(
            "invalid signature component length: {}",
            len
        )));
    }

    let mut scalar = [0u8; SCALAR_LEN];
    scalar[SCALAR_LEN - len..].copy_from_slice(&rest[..len]);
    Ok((scalar, &rest[len..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    #[test]
    fn test_fingerprint_known_vector() {
        let id = fingerprint(
            "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH",
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4",
            0.5,
            1_700_000_000,
        );
        assert_eq!(
            id,
            "8c75e089566fa4b91799ed0c3290fe593e30fb9612e434b52bd191e02a857b36"
        );
    }

    #[test]
    fn test_fingerprint_is_content_addressed() {
        let base = fingerprint("a", "b", 1.0, 100);
        assert_eq!(base, fingerprint("a", "b", 1.0, 100));
        assert_ne!(base, fingerprint("a", "b", 1.0, 101));
        assert_ne!(base, fingerprint("a", "c", 1.0, 100));
        assert_ne!(base, fingerprint("a", "b", 1.5, 100));
        assert_eq!(base.len(), 64);
    }

    #[test]
    fn test_sign_and_verify() {
        let key_pair = KeyPair::generate().unwrap();
        let id = fingerprint("from", "to", 0.25, 1_700_000_000);

        let signature = sign(&id, &key_pair.private_key_hex()).unwrap();
        assert!(verify(&id, &signature, &key_pair.public_key_hex()).unwrap());

        let other_id = fingerprint("from", "to", 0.26, 1_700_000_000);
        assert!(!verify(&other_id, &signature, &key_pair.public_key_hex()).unwrap());

        let stranger = KeyPair::generate().unwrap();
        assert!(!verify(&id, &signature, &stranger.public_key_hex()).unwrap());
    }

    #[test]
    fn test_unequal_component_lengths_round_trip() {
        let mut r = [0u8; SCALAR_LEN];
        r[SCALAR_LEN - 1] = 0x07;
        let mut s = [0x11u8; SCALAR_LEN];
        s[0] = 0x00;
        s[1] = 0x00;

        let signature = Signature::from_scalars(r, s).unwrap();
        let encoded = encode_signature(&signature);
        assert_eq!(encoded[0], 1);
        assert_eq!(encoded[2], (SCALAR_LEN - 2) as u8);
        assert_eq!(encoded.len(), 2 + 1 + SCALAR_LEN - 2);

        let (decoded_r, decoded_s) = split_signature(&encoded).unwrap();
        assert_eq!(decoded_r, r);
        assert_eq!(decoded_s, s);
    }

    #[test]
    fn test_tampered_signature_fails() {
        let key_pair = KeyPair::generate().unwrap();
        let id = fingerprint("from", "to", 1.0, 42);
        let signature = sign(&id, &key_pair.private_key_hex()).unwrap();

        let mut bytes = hex::decode(&signature).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let tampered = hex::encode(bytes);

        assert!(!verify(&id, &tampered, &key_pair.public_key_hex()).unwrap());
    }

    #[test]
    fn test_malformed_inputs() {
        let key_pair = KeyPair::generate().unwrap();
        let id = fingerprint("from", "to", 1.0, 42);
        let signature = sign(&id, &key_pair.private_key_hex()).unwrap();
        let public_key = key_pair.public_key_hex();

        assert!(matches!(sign("zz", &key_pair.private_key_hex()), Err(VaultError::Signing(_))));
        assert!(matches!(sign(&id, "not-hex"), Err(VaultError::Signing(_))));

        assert!(matches!(verify("zz", &signature, &public_key), Err(VaultError::Decode(_))));
        assert!(matches!(verify(&id, "zz", &public_key), Err(VaultError::Decode(_))));
        assert!(matches!(verify(&id, &signature, "zz"), Err(VaultError::Decode(_))));
        assert!(matches!(verify(&id, &signature, "0400"), Err(VaultError::Decode(_))));
        assert!(matches!(verify(&id, "", &public_key), Err(VaultError::Decode(_))));
        assert!(matches!(
            verify(&id, &format!("{}00", signature), &public_key),
            Err(VaultError::Decode(_))
        ));
    }
}
