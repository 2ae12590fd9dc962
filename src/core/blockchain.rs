// The ledger: one authoritative in-memory chain plus the pool of transfers
// waiting for the next block. Everything a node serves goes through here.
//
// Lock order is always pool -> chain. Admission holds the pool write lock
// across its duplicate and balance checks; the mining commit holds it while
// the block is appended and the mined snapshot removed.

use crate::core::{
    Block, MiningTimer, ProofOfWork, Transaction, TransactionRequest, DEFAULT_DIFFICULTY,
    DEFAULT_MINING_INTERVAL_SECS, DEFAULT_MINING_REWARD, MINING_SENDER,
};
use crate::error::{LedgerError, Result};
use crate::storage::TransactionPool;
use crate::wallet::{address_from_public_key, PublicKey, Signature};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Leading zero bits every mined block hash must carry
    pub difficulty: u32,
    /// Value of the reward queued after each mined block
    pub mining_reward: u64,
    /// Delay between scheduled mining attempts
    pub mining_interval: Duration,
    /// Count a sender's pending outgoing value against their mined balance
    pub reserve_pending_spends: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            difficulty: DEFAULT_DIFFICULTY,
            mining_reward: DEFAULT_MINING_REWARD,
            mining_interval: Duration::from_secs(DEFAULT_MINING_INTERVAL_SECS),
            reserve_pending_spends: false,
        }
    }
}

/// Serializable view of the whole chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub chain: Vec<Block>,
}

pub struct Ledger {
    chain: RwLock<Vec<Block>>,
    pool: RwLock<TransactionPool>,
    mining_lock: Mutex<()>,
    halted: AtomicBool,
    timer: Mutex<Option<MiningTimer>>,
    miner_address: String,
    miner_public_key: PublicKey,
    config: LedgerConfig,
}

impl Ledger {
    /// Starts a fresh chain holding only the genesis block. `miner_address`
    /// must be the address derived from `miner_public_key`.
    pub fn new(
        miner_address: &str,
        miner_public_key: PublicKey,
        config: LedgerConfig,
    ) -> Result<Ledger> {
        Self::restore(
            vec![Block::genesis()?],
            miner_address,
            miner_public_key,
            config,
        )
    }

    /// Rebuilds a ledger from a chain snapshot, refusing one that fails validation.
    pub fn restore(
        chain: Vec<Block>,
        miner_address: &str,
        miner_public_key: PublicKey,
        config: LedgerConfig,
    ) -> Result<Ledger> {
        if address_from_public_key(&miner_public_key) != miner_address {
            return Err(LedgerError::InvalidAddress(format!(
                "Miner address {miner_address} is not derived from the supplied public key"
            )));
        }
        validate_blocks(&chain, config.difficulty)?;

        info!(
            "Ledger ready with {} block(s), miner {miner_address}, difficulty {}",
            chain.len(),
            config.difficulty
        );
        Ok(Ledger {
            chain: RwLock::new(chain),
            pool: RwLock::new(TransactionPool::new()),
            mining_lock: Mutex::new(()),
            halted: AtomicBool::new(false),
            timer: Mutex::new(None),
            miner_address: miner_address.to_string(),
            miner_public_key,
            config,
        })
    }

    pub fn get_miner_address(&self) -> &str {
        self.miner_address.as_str()
    }

    pub fn get_miner_public_key(&self) -> &PublicKey {
        &self.miner_public_key
    }

    pub fn get_config(&self) -> &LedgerConfig {
        &self.config
    }

    // Admission

    /// Entry point for a fresh client submission.
    pub fn create_transaction(
        &self,
        sender: &str,
        recipient: &str,
        value: u64,
        public_key: Option<&PublicKey>,
        signature: Option<&Signature>,
    ) -> bool {
        let created = self.add_transaction(sender, recipient, value, public_key, signature);
        if created {
            info!("Created transaction {sender} -> {recipient} ({value})");
        }
        created
    }

    /// Admits a transfer into the pool. `false` means nothing changed.
    pub fn add_transaction(
        &self,
        sender: &str,
        recipient: &str,
        value: u64,
        public_key: Option<&PublicKey>,
        signature: Option<&Signature>,
    ) -> bool {
        let transaction = Transaction::from_parts(
            sender,
            recipient,
            value,
            public_key.cloned(),
            signature.cloned(),
        );
        self.admit(transaction)
    }

    /// Parses and admits a raw client request; malformed fields are a rejection.
    pub fn submit_request(&self, request: TransactionRequest) -> bool {
        match request.into_transaction() {
            Ok(transaction) => self.admit(transaction),
            Err(e) => {
                warn!("Rejected transaction request: {e}");
                false
            }
        }
    }

    fn admit(&self, transaction: Transaction) -> bool {
        match self.try_add_transaction(transaction) {
            Ok(()) => true,
            Err(e) => {
                warn!("Rejected transaction: {e}");
                false
            }
        }
    }

    /// Same checks as `add_transaction`, reporting why a transfer was refused.
    pub fn try_add_transaction(&self, transaction: Transaction) -> Result<()> {
        transaction.verify()?;

        let mut pool = write(&self.pool);
        let chain = read(&self.chain);

        if pool.contains(&transaction) || is_mined(&chain, &transaction) {
            return Err(LedgerError::Duplicate(format!(
                "{} -> {} ({}) was already submitted",
                transaction.get_sender(),
                transaction.get_recipient(),
                transaction.get_value()
            )));
        }

        if transaction.get_sender() != MINING_SENDER {
            let mut available = total_amount(&chain, transaction.get_sender());
            if self.config.reserve_pending_spends {
                available -= pool.pending_outgoing(transaction.get_sender()) as i128;
            }
            if available < i128::from(transaction.get_value()) {
                return Err(LedgerError::InsufficientFunds {
                    required: transaction.get_value(),
                    available,
                });
            }
        }
        drop(chain);

        pool.add(transaction)
    }

    /// Pending transactions in inclusion order.
    pub fn transaction_pool(&self) -> Vec<Transaction> {
        read(&self.pool).get_all()
    }

    pub fn clear_transaction_pool(&self) {
        write(&self.pool).clear();
        info!("Transaction pool cleared");
    }

    // Mining

    /// One proof-of-work cycle. `false` when the instance is halted or the
    /// chain failed validation.
    pub fn mining(&self) -> bool {
        match self.try_mining() {
            Ok(block) => {
                info!(
                    "Mined block {} with {} transaction(s): {}",
                    block.get_index(),
                    block.get_transactions().len(),
                    block.get_hash()
                );
                true
            }
            Err(e) => {
                error!("Mining failed: {e}");
                false
            }
        }
    }

    pub fn try_mining(&self) -> Result<Block> {
        let _mining = lock(&self.mining_lock);
        if self.is_halted() {
            return Err(LedgerError::Consensus(
                "Mining is halted on this instance".to_string(),
            ));
        }

        let (index, previous_hash) = {
            let chain = read(&self.chain);
            if let Err(e) = validate_blocks(&chain, self.config.difficulty) {
                self.halt(&e);
                return Err(e);
            }
            let top = chain
                .last()
                .ok_or_else(|| LedgerError::Consensus("Chain has no blocks".to_string()))?;
            (top.get_index() + 1, top.get_hash().to_string())
        };

        // Anything admitted after this point waits for the next cycle.
        let snapshot = read(&self.pool).get_all();
        let block = Block::new_block(
            index,
            previous_hash,
            snapshot.clone(),
            self.config.difficulty,
        )?;

        let mut pool = write(&self.pool);
        {
            let mut chain = write(&self.chain);
            let links = chain
                .last()
                .is_some_and(|top| top.get_hash() == block.get_pre_block_hash());
            if !links {
                let e = LedgerError::Consensus(format!(
                    "Block {} does not extend the current top block",
                    block.get_index()
                ));
                self.halt(&e);
                return Err(e);
            }
            chain.push(block.clone());
        }
        pool.remove_mined(&snapshot);
        pool.add_reward(Transaction::new_reward(
            &self.miner_address,
            self.config.mining_reward,
        ));

        Ok(block)
    }

    /// Schedules `mining` on the configured interval. A no-op if already scheduled.
    pub fn start_mining(self: &Arc<Self>) -> Result<()> {
        let mut timer = lock(&self.timer);
        if timer.is_some() {
            info!("Mining is already scheduled");
            return Ok(());
        }
        *timer = Some(MiningTimer::start(
            Arc::downgrade(self),
            self.config.mining_interval,
        )?);
        Ok(())
    }

    pub fn stop_mining(&self) {
        let timer = lock(&self.timer).take();
        if let Some(timer) = timer {
            timer.stop();
        }
    }

    pub fn is_mining_scheduled(&self) -> bool {
        lock(&self.timer).is_some()
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }

    fn halt(&self, cause: &LedgerError) {
        self.halted.store(true, Ordering::SeqCst);
        error!("Halting mining: {cause}");
    }

    // Queries

    /// Net mined balance of `address`; pending transactions are not counted.
    pub fn calculate_total_amount(&self, address: &str) -> i128 {
        total_amount(&read(&self.chain), address)
    }

    pub fn chain_snapshot(&self) -> ChainSnapshot {
        ChainSnapshot {
            chain: read(&self.chain).clone(),
        }
    }

    pub fn chain_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.chain_snapshot())?)
    }

    pub fn chain_len(&self) -> usize {
        read(&self.chain).len()
    }

    pub fn last_block(&self) -> Option<Block> {
        read(&self.chain).last().cloned()
    }

    /// Re-checks the whole chain; a failure halts mining.
    pub fn validate_chain(&self) -> Result<()> {
        let result = validate_blocks(&read(&self.chain), self.config.difficulty);
        if let Err(e) = &result {
            self.halt(e);
        }
        result
    }

    #[cfg(test)]
    pub(crate) fn chain_mut(&self) -> RwLockWriteGuard<'_, Vec<Block>> {
        write(&self.chain)
    }
}

impl Drop for Ledger {
    fn drop(&mut self) {
        self.stop_mining();
    }
}

/// Checks a chain end to end: fixed genesis, stored hashes, linkage and difficulty.
pub fn validate_blocks(chain: &[Block], difficulty: u32) -> Result<()> {
    let genesis = chain
        .first()
        .ok_or_else(|| LedgerError::Consensus("Chain has no blocks".to_string()))?;
    if *genesis != Block::genesis()? {
        return Err(LedgerError::Consensus(
            "First block is not the genesis block".to_string(),
        ));
    }

    for pair in chain.windows(2) {
        let (prev, block) = (&pair[0], &pair[1]);
        let prev_hash = prev.calculate_hash()?;
        if prev_hash != prev.get_hash() {
            return Err(LedgerError::Consensus(format!(
                "Block {} hash does not match its contents",
                prev.get_index()
            )));
        }
        if block.get_pre_block_hash() != prev_hash {
            return Err(LedgerError::Consensus(format!(
                "Block {} does not link to block {}",
                block.get_index(),
                prev.get_index()
            )));
        }
        if block.get_index() != prev.get_index() + 1 {
            return Err(LedgerError::Consensus(format!(
                "Block {} follows block {}",
                block.get_index(),
                prev.get_index()
            )));
        }
        if !ProofOfWork::validate(block, difficulty) {
            return Err(LedgerError::Consensus(format!(
                "Block {} fails proof-of-work",
                block.get_index()
            )));
        }
    }
    Ok(())
}

fn total_amount(chain: &[Block], address: &str) -> i128 {
    let mut total: i128 = 0;
    for block in chain {
        for tx in block.get_transactions() {
            let value = i128::from(tx.get_value());
            if tx.get_recipient() == address {
                total += value;
            }
            if tx.get_sender() == address {
                total -= value;
            }
        }
    }
    total
}

fn is_mined(chain: &[Block], transaction: &Transaction) -> bool {
    chain
        .iter()
        .flat_map(|block| block.get_transactions())
        .any(|mined| mined.is_duplicate_of(transaction))
}

// A panic while holding one of these locks cannot leave the chain or pool
// half-written (every mutation is a single push/retain), so poisoned guards
// are recovered.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| {
        error!("Recovered poisoned read lock");
        poisoned.into_inner()
    })
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| {
        error!("Recovered poisoned write lock");
        poisoned.into_inner()
    })
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        error!("Recovered poisoned mutex");
        poisoned.into_inner()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testnet::{funded_ledger, test_config, test_ledger};
    use crate::wallet::Wallet;

    #[test]
    fn test_new_ledger_holds_only_genesis() {
        let (ledger, _miner) = test_ledger();
        assert_eq!(ledger.chain_len(), 1);
        assert!(ledger.transaction_pool().is_empty());
        assert!(ledger.validate_chain().is_ok());
    }

    #[test]
    fn test_miner_identity_must_match_key() {
        let miner = Wallet::new().unwrap();
        let other = Wallet::new().unwrap();
        let result = Ledger::new(
            other.get_address(),
            miner.get_public_key().clone(),
            test_config(),
        );
        assert!(matches!(result, Err(LedgerError::InvalidAddress(_))));
    }

    #[test]
    fn test_mining_links_block_and_queues_reward() {
        let (ledger, miner) = test_ledger();
        let top = ledger.last_block().unwrap();

        let block = ledger.try_mining().unwrap();

        assert_eq!(ledger.chain_len(), 2);
        assert_eq!(block.get_pre_block_hash(), top.get_hash());
        assert!(ProofOfWork::validate(&block, ledger.get_config().difficulty));
        assert!(block.get_transactions().is_empty());
        let pool = ledger.transaction_pool();
        assert_eq!(pool, vec![Transaction::new_reward(miner.get_address(), 10)]);
    }

    #[test]
    fn test_reward_is_mined_one_cycle_later() {
        let (ledger, miner) = test_ledger();
        for _ in 0..3 {
            assert!(ledger.mining());
        }
        assert_eq!(ledger.calculate_total_amount(miner.get_address()), 20);
        assert_eq!(ledger.transaction_pool().len(), 1);
    }

    #[test]
    fn test_insufficient_funds_rejected_without_mutation() {
        let (ledger, miner) = funded_ledger(10);
        ledger.clear_transaction_pool();
        let recipient = Wallet::new().unwrap();
        let tx = miner.new_transaction(recipient.get_address(), 11).unwrap();

        let result = ledger.try_add_transaction(tx);
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientFunds {
                required: 11,
                available: 10
            })
        ));
        assert!(ledger.transaction_pool().is_empty());
    }

    #[test]
    fn test_pending_spends_counted_only_when_configured() {
        let recipient = Wallet::new().unwrap();

        let (ledger, miner) = funded_ledger(10);
        ledger.clear_transaction_pool();
        assert!(ledger
            .try_add_transaction(miner.new_transaction(recipient.get_address(), 8).unwrap())
            .is_ok());
        assert!(ledger
            .try_add_transaction(miner.new_transaction(recipient.get_address(), 8).unwrap())
            .is_ok());

        let config = LedgerConfig {
            reserve_pending_spends: true,
            ..test_config()
        };
        let miner = Wallet::new().unwrap();
        let strict = Ledger::new(miner.get_address(), miner.get_public_key().clone(), config)
            .unwrap();
        strict.mining();
        strict.mining();
        strict.clear_transaction_pool();
        assert!(strict
            .try_add_transaction(miner.new_transaction(recipient.get_address(), 8).unwrap())
            .is_ok());
        assert!(matches!(
            strict.try_add_transaction(miner.new_transaction(recipient.get_address(), 8).unwrap()),
            Err(LedgerError::InsufficientFunds { .. })
        ));
    }

    #[test]
    fn test_mined_transaction_cannot_be_replayed() {
        let (ledger, miner) = funded_ledger(10);
        let recipient = Wallet::new().unwrap();
        let tx = miner.new_transaction(recipient.get_address(), 2).unwrap();

        ledger.try_add_transaction(tx.clone()).unwrap();
        assert!(ledger.mining());
        assert!(matches!(
            ledger.try_add_transaction(tx),
            Err(LedgerError::Duplicate(_))
        ));
    }

    #[test]
    fn test_tampered_chain_halts_mining() {
        let (ledger, miner) = funded_ledger(10);
        ledger.mining();
        {
            let mut chain = ledger.chain_mut();
            let block = &mut chain[2];
            block.transactions_mut()[0] = Transaction::new_reward(miner.get_address(), 1_000);
        }

        assert!(!ledger.mining());
        assert!(ledger.is_halted());
        assert!(!ledger.mining());
    }

    #[test]
    fn test_late_arrival_survives_commit() {
        let (ledger, miner) = funded_ledger(10);
        let recipient = Wallet::new().unwrap();
        let late = miner.new_transaction(recipient.get_address(), 1).unwrap();
        let snapshot = ledger.transaction_pool();

        // Simulates a submission landing between snapshot and commit.
        ledger.try_add_transaction(late.clone()).unwrap();
        {
            let mut pool = write(&ledger.pool);
            pool.remove_mined(&snapshot);
        }
        assert_eq!(ledger.transaction_pool(), vec![late]);
    }

    #[test]
    fn test_restore_rejects_tampered_snapshot() {
        let (ledger, miner) = funded_ledger(10);
        let mut snapshot = ledger.chain_snapshot();
        snapshot.chain.swap(1, 2);

        let restored = Ledger::restore(
            snapshot.chain,
            miner.get_address(),
            miner.get_public_key().clone(),
            test_config(),
        );
        assert!(matches!(restored, Err(LedgerError::Consensus(_))));
    }

    #[test]
    fn test_timer_mines_and_stops() {
        let config = LedgerConfig {
            mining_interval: Duration::from_millis(20),
            ..test_config()
        };
        let miner = Wallet::new().unwrap();
        let ledger = Arc::new(
            Ledger::new(miner.get_address(), miner.get_public_key().clone(), config).unwrap(),
        );

        ledger.start_mining().unwrap();
        ledger.start_mining().unwrap();
        assert!(ledger.is_mining_scheduled());

        let deadline = std::time::Instant::now() + Duration::from_secs(10);
        while ledger.chain_len() < 3 && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        ledger.stop_mining();
        assert!(!ledger.is_mining_scheduled());

        let len = ledger.chain_len();
        assert!(len >= 3);
        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(ledger.chain_len(), len);
    }
}
