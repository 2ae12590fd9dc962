use crate::core::{ProofOfWork, Transaction, ZERO_HASH};
use crate::error::Result;
use crate::utils::{current_timestamp, serialize, sha256_digest};
use data_encoding::HEXLOWER;
use log::info;
use serde::{Deserialize, Serialize};

/// Field order here is the JSON order. The hash covers the bincode encoding
/// built by `header_prefix` plus the nonce, which follows the same order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    index: u64,
    timestamp: i64,
    previous_hash: String,
    transactions: Vec<Transaction>,
    nonce: u64,
    hash: String,
}

impl Block {
    /// Builds a candidate on top of `previous_hash` and runs proof-of-work on it.
    pub fn new_block(
        index: u64,
        previous_hash: String,
        transactions: Vec<Transaction>,
        difficulty: u32,
    ) -> Result<Block> {
        let mut block = Block {
            index,
            timestamp: current_timestamp()?,
            previous_hash,
            transactions,
            nonce: 0,
            hash: String::new(),
        };

        info!(
            "Starting proof-of-work for block {index} with {} transactions (difficulty: {difficulty})",
            block.transactions.len()
        );
        let pow = ProofOfWork::new_proof_of_work(&block, difficulty)?;
        let (nonce, hash) = pow.run()?;
        block.nonce = nonce;
        block.hash = hash;
        info!("Proof-of-work completed for block {index}: {}", block.hash);

        Ok(block)
    }

    /// The fixed first block. Built directly, never mined.
    pub fn genesis() -> Result<Block> {
        let mut block = Block {
            index: 0,
            timestamp: 0,
            previous_hash: ZERO_HASH.to_string(),
            transactions: vec![],
            nonce: 0,
            hash: String::new(),
        };
        block.hash = block.calculate_hash()?;
        Ok(block)
    }

    /// Canonical encoding of every field up to, but excluding, the nonce.
    pub(crate) fn header_prefix(&self) -> Result<Vec<u8>> {
        serialize(&(
            self.index,
            self.timestamp,
            self.previous_hash.as_str(),
            self.transactions.as_slice(),
        ))
    }

    /// Canonical encoding of the block without its hash.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = self.header_prefix()?;
        bytes.extend(serialize(&self.nonce)?);
        Ok(bytes)
    }

    pub fn calculate_hash(&self) -> Result<String> {
        let bytes = self.canonical_bytes()?;
        Ok(HEXLOWER.encode(sha256_digest(bytes.as_slice()).as_slice()))
    }

    pub fn get_index(&self) -> u64 {
        self.index
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_pre_block_hash(&self) -> &str {
        self.previous_hash.as_str()
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }

    pub fn get_nonce(&self) -> u64 {
        self.nonce
    }

    pub fn get_hash(&self) -> &str {
        self.hash.as_str()
    }

    #[cfg(test)]
    pub(crate) fn transactions_mut(&mut self) -> &mut Vec<Transaction> {
        &mut self.transactions
    }
}
