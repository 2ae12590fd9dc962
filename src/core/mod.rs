//! Core ledger functionality
//!
//! Blocks, transactions, proof-of-work, the ledger itself and the timer that
//! drives mining.

pub mod block;
pub mod blockchain;
pub mod mining;
pub mod monetary;
pub mod proof_of_work;
pub mod transaction;

pub use block::Block;
pub use blockchain::{validate_blocks, ChainSnapshot, Ledger, LedgerConfig};
pub use mining::{MiningTimer, DEFAULT_MINING_INTERVAL_SECS};
pub use monetary::{DEFAULT_MINING_REWARD, MINING_SENDER, ZERO_HASH};
pub use proof_of_work::{ProofOfWork, DEFAULT_DIFFICULTY, MAX_DIFFICULTY, MIN_DIFFICULTY};
pub use transaction::{Transaction, TransactionRequest};
