use crate::core::Transaction;
use crate::error::{LedgerError, Result};

/// Pending transactions in arrival order.
///
/// No locking here: the ledger wraps the pool in a `RwLock` and holds the
/// write guard across each compound admit/commit step.
#[derive(Debug, Default, Clone)]
pub struct TransactionPool {
    inner: Vec<Transaction>,
}

impl TransactionPool {
    pub fn new() -> TransactionPool {
        TransactionPool { inner: Vec::new() }
    }

    /// Appends `tx`, refusing one identical to an entry already pending.
    pub fn add(&mut self, tx: Transaction) -> Result<()> {
        if self.contains(&tx) {
            return Err(LedgerError::Duplicate(format!(
                "{} -> {} ({}) is already pending",
                tx.get_sender(),
                tx.get_recipient(),
                tx.get_value()
            )));
        }
        self.inner.push(tx);
        Ok(())
    }

    /// Rewards carry no signature; they bypass the duplicate check.
    pub fn add_reward(&mut self, reward: Transaction) {
        self.inner.push(reward);
    }

    pub fn contains(&self, tx: &Transaction) -> bool {
        self.inner.iter().any(|pending| pending.is_duplicate_of(tx))
    }

    /// Removes one pending entry per mined transaction, leaving later arrivals in place.
    pub fn remove_mined(&mut self, mined: &[Transaction]) {
        for tx in mined {
            if let Some(idx) = self.inner.iter().position(|pending| pending == tx) {
                self.inner.remove(idx);
            }
        }
    }

    /// Total value `address` is already sending in pending transactions.
    pub fn pending_outgoing(&self, address: &str) -> u128 {
        self.inner
            .iter()
            .filter(|tx| tx.get_sender() == address)
            .map(|tx| u128::from(tx.get_value()))
            .sum()
    }

    pub fn get_all(&self) -> Vec<Transaction> {
        self.inner.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }
}
