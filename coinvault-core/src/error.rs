use thiserror::Error;

pub type Result<T> = std::result::Result<T, VaultError>;

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Wallet not found: {id}")]
    WalletNotFound { id: String },

    #[error("No wallet holds address: {address}")]
    AddressNotFound { address: String },

    #[error("Wallet already exists: {id}")]
    WalletExists { id: String },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient balance: need {need:.8} BTC, have {available:.8} BTC")]
    InsufficientBalance { need: f64, available: f64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid character '{character}' at position {position}")]
    InvalidCharacter { character: char, position: usize },

    #[error("Checksum mismatch")]
    InvalidChecksum,

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Coarse classification callers can branch on without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    InvalidInput,
    CryptoFailure,
    StorageFailure,
    RemoteFailure,
}

impl VaultError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::WalletNotFound { .. } | Self::AddressNotFound { .. } => ErrorKind::NotFound,
            Self::WalletExists { .. } => ErrorKind::AlreadyExists,
            Self::InvalidAmount(_)
            | Self::InsufficientBalance { .. }
            | Self::InvalidInput(_)
            | Self::InvalidPrivateKey(_)
            | Self::Config(_) => ErrorKind::InvalidInput,
            Self::InvalidCharacter { .. }
            | Self::InvalidChecksum
            | Self::Encoding(_)
            | Self::KeyGeneration(_)
            | Self::Signing(_)
            | Self::Decode(_) => ErrorKind::CryptoFailure,
            Self::Storage(_) | Self::Io(_) | Self::Serialization(_) => ErrorKind::StorageFailure,
            Self::Network(_) => ErrorKind::RemoteFailure,
        }
    }

    pub fn wallet_not_found(id: impl Into<String>) -> Self {
        Self::WalletNotFound { id: id.into() }
    }

    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::InvalidAmount(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<hex::FromHexError> for VaultError {
    fn from(err: hex::FromHexError) -> Self {
        VaultError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            VaultError::wallet_not_found("abc").kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            VaultError::WalletExists { id: "abc".into() }.kind(),
            ErrorKind::AlreadyExists
        );
        assert_eq!(VaultError::invalid_amount("0").kind(), ErrorKind::InvalidInput);
        assert_eq!(VaultError::InvalidChecksum.kind(), ErrorKind::CryptoFailure);
        assert_eq!(VaultError::storage("disk").kind(), ErrorKind::StorageFailure);
    }
}
