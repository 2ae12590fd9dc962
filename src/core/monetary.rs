/// Reserved sender of mining rewards; no key can ever derive this address.
pub const MINING_SENDER: &str = "THE BLOCKCHAIN";

/// Reward credited to the miner for each successful proof-of-work search.
pub const DEFAULT_MINING_REWARD: u64 = 1;

/// Previous hash carried by the genesis block.
pub const ZERO_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::validate_address;

    #[test]
    fn test_zero_hash_is_sha256_width() {
        assert_eq!(ZERO_HASH.len(), 64);
        assert!(ZERO_HASH.chars().all(|c| c == '0'));
    }

    #[test]
    fn test_mining_sender_is_not_an_address() {
        assert!(!validate_address(MINING_SENDER));
    }
}
