pub mod address;
pub mod keys;
pub mod signing;

pub use address::{derive_address, hash160, legacy_address, segwit_address, AddressFormat};
pub use keys::{private_key_to_wif, KeyPair};
pub use signing::{fingerprint, sign, verify};
