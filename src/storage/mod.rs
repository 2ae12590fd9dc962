//! Pending transaction storage
//!
//! Holds validated transfers until a mining cycle moves them into a block.

pub mod transaction_pool;

pub use transaction_pool::TransactionPool;
