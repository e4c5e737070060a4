//! Error types for HashLedger

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("Invalid node address: {0}")]
    InvalidNodeAddress(String),
    #[error("Invalid transaction signature")]
    InvalidTransactionSignature,
    #[error("Invalid chain: {0}")]
    InvalidChain(String),
    #[error("Peer unreachable: {0}")]
    PeerUnreachable(String),
    #[error("Malformed peer response: {0}")]
    PeerMalformedResponse(String),
    #[error("Cryptographic error: {0}")]
    CryptoError(String),
    #[error("Stale proof: {0}")]
    StaleProof(String),
    #[error("Proof search exhausted after {0} attempts")]
    ProofSearchExhausted(u64),
    #[error("Mining cancelled")]
    MiningCancelled,
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::IoError(err.to_string())
    }
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        ChainError::ConfigError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
