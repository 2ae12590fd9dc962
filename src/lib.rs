//! # pow-ledger
//!
//! A single-node ledger engine: an append-only chain of proof-of-work blocks,
//! a pool of signed transfers waiting to be mined, and wallets whose ECDSA
//! P-256 keys authorize those transfers.
//!
//! ## Layout
//! - `core/`: blocks, transactions, proof-of-work, the `Ledger` and its mining timer
//! - `wallet/`: keypairs, Base58Check addresses, signatures
//! - `storage/`: the pending transaction pool
//! - `config/`: node settings from TOML and the environment
//! - `utils/`: hashing, ECDSA primitives, canonical encoding
//! - `cli/`: command-line front end
//!
//! A node owns one `Ledger` (usually behind an `Arc`) and hands it to
//! whatever transport serves it. Balances are derived by replaying the
//! chain; nothing is persisted.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod storage;
pub mod utils;
pub mod wallet;

#[cfg(test)]
pub mod testnet;

pub use cli::{Command, Opt};
pub use config::NodeConfig;
pub use core::{
    validate_blocks, Block, ChainSnapshot, Ledger, LedgerConfig, MiningTimer, ProofOfWork,
    Transaction, TransactionRequest, MINING_SENDER,
};
pub use error::{LedgerError, Result};
pub use storage::TransactionPool;
pub use wallet::{
    address_from_public_key, validate_address, PrivateKey, PublicKey, Signature, Wallet,
    WalletInfo,
};
