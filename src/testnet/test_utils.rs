//! Test utilities for ledger testing

use crate::core::{Ledger, LedgerConfig};
use crate::wallet::Wallet;
use std::time::Duration;

/// Reward per mined block in test ledgers
pub const TEST_REWARD: u64 = 10;

/// Cheap proof-of-work and a large reward so balances move quickly.
pub fn test_config() -> LedgerConfig {
    LedgerConfig {
        difficulty: 2,
        mining_reward: TEST_REWARD,
        mining_interval: Duration::from_millis(50),
        reserve_pending_spends: false,
    }
}

/// Fresh ledger whose miner is the returned wallet.
pub fn test_ledger() -> (Ledger, Wallet) {
    let miner = Wallet::new().unwrap();
    let ledger = Ledger::new(
        miner.get_address(),
        miner.get_public_key().clone(),
        test_config(),
    )
    .unwrap();
    (ledger, miner)
}

/// Mines until the miner holds `balance` (a multiple of the reward). The
/// next reward is left pending in the pool.
pub fn funded_ledger(balance: u64) -> (Ledger, Wallet) {
    let (ledger, miner) = test_ledger();
    let cycles = balance / TEST_REWARD + 1;
    for _ in 0..cycles {
        assert!(ledger.mining());
    }
    (ledger, miner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_funded_ledger_balance() {
        let (ledger, miner) = funded_ledger(30);
        assert_eq!(ledger.calculate_total_amount(miner.get_address()), 30);
        assert_eq!(ledger.transaction_pool().len(), 1);
    }
}
