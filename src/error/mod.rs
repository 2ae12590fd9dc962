//! Error handling for the ledger
//!
//! Every fallible operation in the crate reports one of these variants.
//! Admission paths collapse them into a plain `false` at the public boundary.

use std::fmt;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Missing or malformed transaction fields
    Validation(String),
    /// Signature is malformed or does not verify
    Signature(String),
    /// Sender's mined balance does not cover the transfer
    InsufficientFunds { required: u64, available: i128 },
    /// Transaction already pending or already mined
    Duplicate(String),
    /// Chain failed integrity validation
    Consensus(String),
    /// Keypair could not be generated or restored
    KeyGeneration(String),
    /// Address is not valid Base58Check or does not match its key
    InvalidAddress(String),
    /// Serialization/deserialization errors
    Serialization(String),
    /// Configuration errors
    Config(String),
    /// File I/O errors
    Io(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::Validation(msg) => write!(f, "Validation error: {msg}"),
            LedgerError::Signature(msg) => write!(f, "Signature error: {msg}"),
            LedgerError::InsufficientFunds {
                required,
                available,
            } => {
                write!(
                    f,
                    "Insufficient funds: required {required}, available {available}"
                )
            }
            LedgerError::Duplicate(msg) => write!(f, "Duplicate transaction: {msg}"),
            LedgerError::Consensus(msg) => write!(f, "Consensus error: {msg}"),
            LedgerError::KeyGeneration(msg) => write!(f, "Key generation error: {msg}"),
            LedgerError::InvalidAddress(addr) => write!(f, "Invalid address: {addr}"),
            LedgerError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            LedgerError::Config(msg) => write!(f, "Configuration error: {msg}"),
            LedgerError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Io(err.to_string())
    }
}

impl From<bincode::error::EncodeError> for LedgerError {
    fn from(err: bincode::error::EncodeError) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for LedgerError {
    fn from(err: toml::de::Error) -> Self {
        LedgerError::Config(err.to_string())
    }
}
