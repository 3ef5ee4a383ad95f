//! Text encodings for keys and addresses.
//!
//! Both codecs operate on raw byte sequences and know nothing about keys;
//! the address engine in [`crate::crypto`] feeds them hash160 payloads.

pub mod base58;
pub mod bech32;

pub use self::bech32::WitnessProgram;
