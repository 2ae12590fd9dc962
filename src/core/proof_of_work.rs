use crate::core::Block;
use crate::error::{LedgerError, Result};
use crate::utils::{serialize, sha256_digest};
use data_encoding::HEXLOWER;
use log::debug;
use num_bigint::{BigInt, Sign};
use std::ops::ShlAssign;

/// Leading zero bits required by default (three hex zeros).
pub const DEFAULT_DIFFICULTY: u32 = 12;
pub const MIN_DIFFICULTY: u32 = 1;
pub const MAX_DIFFICULTY: u32 = 255;

/// Nonce search over a candidate block.
///
/// The canonical encoding of everything except the nonce is computed once;
/// each attempt appends the encoded nonce and hashes.
pub struct ProofOfWork {
    prefix: Vec<u8>,
    target: BigInt,
    difficulty: u32,
}

impl ProofOfWork {
    pub fn new_proof_of_work(block: &Block, difficulty: u32) -> Result<ProofOfWork> {
        if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&difficulty) {
            return Err(LedgerError::Config(format!(
                "Difficulty must be between {MIN_DIFFICULTY} and {MAX_DIFFICULTY}, got {difficulty}"
            )));
        }
        Ok(ProofOfWork {
            prefix: block.header_prefix()?,
            target: target_for(difficulty),
            difficulty,
        })
    }

    /// True when `hash_hex` has at least `difficulty` leading zero bits.
    pub fn meets_difficulty(hash_hex: &str, difficulty: u32) -> bool {
        match HEXLOWER.decode(hash_hex.as_bytes()) {
            Ok(hash) => BigInt::from_bytes_be(Sign::Plus, hash.as_slice()) < target_for(difficulty),
            Err(_) => false,
        }
    }

    /// Validate proof-of-work for a mined block: stored hash is the real hash and meets the target
    pub fn validate(block: &Block, difficulty: u32) -> bool {
        match block.calculate_hash() {
            Ok(hash) => hash == block.get_hash() && Self::meets_difficulty(&hash, difficulty),
            Err(_) => false,
        }
    }

    fn prepare_data(&self, nonce: u64) -> Result<Vec<u8>> {
        let mut data_bytes = self.prefix.clone();
        data_bytes.extend(serialize(&nonce)?);
        Ok(data_bytes)
    }

    pub fn run(&self) -> Result<(u64, String)> {
        debug!("Searching nonce at difficulty {}", self.difficulty);
        for nonce in 0..=u64::MAX {
            let data = self.prepare_data(nonce)?;
            let hash = sha256_digest(data.as_slice());
            let hash_int = BigInt::from_bytes_be(Sign::Plus, hash.as_slice());

            if hash_int < self.target {
                let hash_hex = HEXLOWER.encode(hash.as_slice());
                debug!("Found nonce {nonce}: {hash_hex}");
                return Ok((nonce, hash_hex));
            }
        }
        Err(LedgerError::Consensus(
            "Nonce space exhausted without meeting difficulty".to_string(),
        ))
    }
}

// 2^(256 - difficulty): any hash below it has `difficulty` leading zero bits.
fn target_for(difficulty: u32) -> BigInt {
    let mut target = BigInt::from(1);
    target.shl_assign(256 - difficulty.min(256));
    target
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Transaction, ZERO_HASH};

    fn leading_zero_bits(hash_hex: &str) -> u32 {
        let bytes = HEXLOWER.decode(hash_hex.as_bytes()).unwrap();
        let mut bits = 0;
        for byte in bytes {
            if byte == 0 {
                bits += 8;
            } else {
                bits += byte.leading_zeros();
                break;
            }
        }
        bits
    }

    fn mined_block(difficulty: u32) -> Block {
        let reward = Transaction::new_reward("miner", 1);
        Block::new_block(1, ZERO_HASH.to_string(), vec![reward], difficulty).unwrap()
    }

    #[test]
    fn test_mined_block_has_required_zero_bits() {
        for difficulty in [1, 4, 8] {
            let block = mined_block(difficulty);
            assert!(leading_zero_bits(block.get_hash()) >= difficulty);
            assert!(ProofOfWork::validate(&block, difficulty));
        }
    }

    #[test]
    fn test_prepare_data_matches_full_canonical_encoding() {
        let block = mined_block(2);
        let pow = ProofOfWork::new_proof_of_work(&block, 2).unwrap();
        let data = pow.prepare_data(block.get_nonce()).unwrap();
        assert_eq!(data, block.canonical_bytes().unwrap());
    }

    #[test]
    fn test_higher_difficulty_has_smaller_target() {
        assert!(target_for(8) < target_for(2));
    }

    #[test]
    fn test_meets_difficulty_boundaries() {
        assert!(ProofOfWork::meets_difficulty(ZERO_HASH, 255));
        let hash = format!("1{}", &ZERO_HASH[1..]);
        assert!(ProofOfWork::meets_difficulty(&hash, 3));
        assert!(!ProofOfWork::meets_difficulty(&hash, 4));
        assert!(!ProofOfWork::meets_difficulty("not hex", 1));
    }

    #[test]
    fn test_out_of_range_difficulty_rejected() {
        let block = mined_block(1);
        assert!(ProofOfWork::new_proof_of_work(&block, 0).is_err());
        assert!(ProofOfWork::new_proof_of_work(&block, 256).is_err());
    }
}
