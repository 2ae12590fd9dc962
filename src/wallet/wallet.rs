use crate::core::Transaction;
use crate::error::{LedgerError, Result};
use crate::wallet::{PrivateKey, PublicKey, Signature};
use serde::{Deserialize, Serialize};

const VERSION: u8 = 0x00;
pub const ADDRESS_CHECK_SUM_LEN: usize = 4;

/// A keypair plus the address derived from it.
///
/// The private key only ever leaves through [`Wallet::get_private_key`];
/// anything that crosses a process boundary goes through [`WalletInfo`].
#[derive(Clone, Debug)]
pub struct Wallet {
    private_key: PrivateKey,
    public_key: PublicKey,
    address: String,
}

/// Public view of a wallet, safe to print or return to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletInfo {
    pub blockchain_address: String,
    pub public_key: PublicKey,
}

impl Wallet {
    pub fn new() -> Result<Wallet> {
        let pkcs8 = crate::utils::new_key_pair()?;
        Self::from_pkcs8(&pkcs8)
    }

    pub fn from_pkcs8(pkcs8: &[u8]) -> Result<Wallet> {
        let public_key = crate::utils::ecdsa_p256_public_key(pkcs8)?;
        let public_key = PublicKey::from_sec1_bytes(&public_key)
            .map_err(|e| LedgerError::KeyGeneration(e.to_string()))?;
        let address = address_from_public_key(&public_key);
        Ok(Wallet {
            private_key: PrivateKey::from_pkcs8(pkcs8.to_vec()),
            public_key,
            address,
        })
    }

    pub fn get_address(&self) -> &str {
        self.address.as_str()
    }

    pub fn get_public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn get_private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    pub fn info(&self) -> WalletInfo {
        WalletInfo {
            blockchain_address: self.address.clone(),
            public_key: self.public_key.clone(),
        }
    }

    /// Signs the canonical digest of `transaction` (sender, recipient, value).
    pub fn sign(&self, transaction: &Transaction) -> Result<Signature> {
        let payload = transaction.digest_payload()?;
        let raw = crate::utils::ecdsa_p256_sha256_sign_digest(self.private_key.pkcs8(), &payload)?;
        Signature::normalized(&raw)
    }

    /// Builds a transfer from this wallet's address and signs it.
    pub fn new_transaction(&self, recipient: &str, value: u64) -> Result<Transaction> {
        let transaction = Transaction::new(&self.address, recipient, value);
        let signature = self.sign(&transaction)?;
        Ok(transaction.with_signature(self.public_key.clone(), signature))
    }
}

pub fn hash_pub_key(pub_key: &[u8]) -> Vec<u8> {
    let pub_key_sha256 = crate::utils::sha256_digest(pub_key);
    crate::utils::ripemd160_digest(pub_key_sha256.as_slice())
}

fn checksum(payload: &[u8]) -> Vec<u8> {
    let first_sha = crate::utils::sha256_digest(payload);
    let second_sha = crate::utils::sha256_digest(first_sha.as_slice());
    second_sha[0..ADDRESS_CHECK_SUM_LEN].to_vec()
}

// version + pub_key_hash + checksum
pub fn convert_address(pub_hash_key: &[u8]) -> String {
    let mut payload: Vec<u8> = vec![VERSION];
    payload.extend(pub_hash_key);
    let checksum = checksum(payload.as_slice());
    payload.extend(checksum.as_slice());
    crate::utils::base58_encode(payload.as_slice())
}

pub fn address_from_public_key(public_key: &PublicKey) -> String {
    convert_address(hash_pub_key(public_key.as_bytes()).as_slice())
}

pub fn validate_address(address: &str) -> bool {
    let payload = match crate::utils::base58_decode(address) {
        Ok(payload) => payload,
        Err(_) => return false,
    };

    if payload.len() < ADDRESS_CHECK_SUM_LEN + 1 {
        return false;
    }

    let (body, actual_checksum) = payload.split_at(payload.len() - ADDRESS_CHECK_SUM_LEN);
    body[0] == VERSION && checksum(body) == actual_checksum
}
