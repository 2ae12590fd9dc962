// A transfer between two addresses. Value moves account-style: the ledger
// derives balances by replaying every mined transfer, so a transaction only
// needs the two addresses, the amount and the sender's proof of consent.

use crate::core::MINING_SENDER;
use crate::error::{LedgerError, Result};
use crate::utils::{ecdsa_p256_sha256_sign_verify, serialize};
use crate::wallet::{address_from_public_key, PublicKey, Signature};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode)]
pub struct Transaction {
    sender_blockchain_address: String,
    recipient_blockchain_address: String,
    value: u64,
    sender_public_key: Option<PublicKey>,
    signature: Option<Signature>,
}

impl Transaction {
    /// Unsigned transfer; sign it with `Wallet::sign` and attach via `with_signature`.
    pub fn new(sender: &str, recipient: &str, value: u64) -> Transaction {
        Transaction {
            sender_blockchain_address: sender.to_string(),
            recipient_blockchain_address: recipient.to_string(),
            value,
            sender_public_key: None,
            signature: None,
        }
    }

    pub fn from_parts(
        sender: &str,
        recipient: &str,
        value: u64,
        sender_public_key: Option<PublicKey>,
        signature: Option<Signature>,
    ) -> Transaction {
        Transaction {
            sender_public_key,
            signature,
            ..Transaction::new(sender, recipient, value)
        }
    }

    /// Synthetic transfer from the network authority to `miner`.
    pub fn new_reward(miner: &str, reward: u64) -> Transaction {
        Transaction::new(MINING_SENDER, miner, reward)
    }

    pub fn with_signature(mut self, public_key: PublicKey, signature: Signature) -> Transaction {
        self.sender_public_key = Some(public_key);
        self.signature = Some(signature);
        self
    }

    pub fn get_sender(&self) -> &str {
        self.sender_blockchain_address.as_str()
    }

    pub fn get_recipient(&self) -> &str {
        self.recipient_blockchain_address.as_str()
    }

    pub fn get_value(&self) -> u64 {
        self.value
    }

    pub fn get_public_key(&self) -> Option<&PublicKey> {
        self.sender_public_key.as_ref()
    }

    pub fn get_signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    pub fn is_reward(&self) -> bool {
        self.sender_blockchain_address == MINING_SENDER
    }

    /// The bytes a signature commits to: sender, recipient and value, in that order.
    pub fn digest_payload(&self) -> Result<Vec<u8>> {
        serialize(&(
            self.sender_blockchain_address.as_str(),
            self.recipient_blockchain_address.as_str(),
            self.value,
        ))
    }

    /// Identity used for duplicate detection.
    pub fn is_duplicate_of(&self, other: &Transaction) -> bool {
        self.sender_blockchain_address == other.sender_blockchain_address
            && self.recipient_blockchain_address == other.recipient_blockchain_address
            && self.value == other.value
            && self.signature == other.signature
    }

    /// Stateless admission checks, in order: presence, value, signature, ownership.
    ///
    /// Balance and duplicate checks need the chain and pool, so the ledger runs them.
    pub fn verify(&self) -> Result<()> {
        if self.sender_blockchain_address.is_empty() || self.recipient_blockchain_address.is_empty()
        {
            return Err(LedgerError::Validation(
                "Sender and recipient addresses are required".to_string(),
            ));
        }
        let (public_key, signature) = match (&self.sender_public_key, &self.signature) {
            (Some(public_key), Some(signature)) => (public_key, signature),
            _ => {
                return Err(LedgerError::Validation(
                    "Sender public key and signature are required".to_string(),
                ))
            }
        };
        if self.value == 0 {
            return Err(LedgerError::Validation(
                "Transaction value must be positive".to_string(),
            ));
        }

        let payload = self.digest_payload()?;
        if !ecdsa_p256_sha256_sign_verify(public_key.as_bytes(), signature.as_bytes(), &payload) {
            return Err(LedgerError::Signature(
                "Signature does not verify against sender public key".to_string(),
            ));
        }

        if address_from_public_key(public_key) != self.sender_blockchain_address {
            return Err(LedgerError::InvalidAddress(format!(
                "Public key does not own sender address {}",
                self.sender_blockchain_address
            )));
        }
        Ok(())
    }
}

/// Submission as it arrives from a client: every field optional, keys and
/// signatures still in their string forms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub sender_blockchain_address: Option<String>,
    pub recipient_blockchain_address: Option<String>,
    pub sender_public_key: Option<String>,
    pub value: Option<u64>,
    pub signature: Option<String>,
}

impl TransactionRequest {
    pub fn validate(&self) -> bool {
        self.sender_blockchain_address.is_some()
            && self.recipient_blockchain_address.is_some()
            && self.sender_public_key.is_some()
            && self.value.is_some()
            && self.signature.is_some()
    }

    pub fn from_transaction(transaction: &Transaction) -> TransactionRequest {
        TransactionRequest {
            sender_blockchain_address: Some(transaction.get_sender().to_string()),
            recipient_blockchain_address: Some(transaction.get_recipient().to_string()),
            sender_public_key: transaction.get_public_key().map(|k| k.to_string()),
            value: Some(transaction.get_value()),
            signature: transaction.get_signature().map(|s| s.to_string()),
        }
    }

    /// Parses the string fields. A malformed key or signature is a
    /// `Validation`/`Signature` error, never a panic.
    pub fn into_transaction(self) -> Result<Transaction> {
        match self {
            TransactionRequest {
                sender_blockchain_address: Some(sender),
                recipient_blockchain_address: Some(recipient),
                sender_public_key: Some(public_key),
                value: Some(value),
                signature: Some(signature),
            } => {
                let public_key: PublicKey = public_key.parse()?;
                let signature: Signature = signature.parse()?;
                Ok(Transaction::from_parts(
                    &sender,
                    &recipient,
                    value,
                    Some(public_key),
                    Some(signature),
                ))
            }
            _ => Err(LedgerError::Validation("Missing field(s)".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::Wallet;

    #[test]
    fn test_signed_transaction_verifies() {
        let sender = Wallet::new().unwrap();
        let recipient = Wallet::new().unwrap();
        let tx = sender.new_transaction(recipient.get_address(), 5).unwrap();

        assert!(tx.verify().is_ok());
        assert!(!tx.is_reward());
    }

    #[test]
    fn test_unsigned_transaction_is_validation_error() {
        let tx = Transaction::new("a", "b", 5);
        assert!(matches!(tx.verify(), Err(LedgerError::Validation(_))));
    }

    #[test]
    fn test_zero_value_rejected() {
        let sender = Wallet::new().unwrap();
        let tx = sender.new_transaction("recipient", 0).unwrap();
        assert!(matches!(tx.verify(), Err(LedgerError::Validation(_))));
    }

    #[test]
    fn test_tampered_value_fails_signature() {
        let sender = Wallet::new().unwrap();
        let tx = sender.new_transaction("recipient", 5).unwrap();
        let tampered = Transaction::from_parts(
            tx.get_sender(),
            tx.get_recipient(),
            500,
            tx.get_public_key().cloned(),
            tx.get_signature().cloned(),
        );
        assert!(matches!(tampered.verify(), Err(LedgerError::Signature(_))));
    }

    #[test]
    fn test_foreign_sender_address_rejected() {
        let signer = Wallet::new().unwrap();
        let victim = Wallet::new().unwrap();
        let tx = Transaction::new(victim.get_address(), signer.get_address(), 5);
        let signature = signer.sign(&tx).unwrap();
        let forged = tx.with_signature(signer.get_public_key().clone(), signature);

        assert!(matches!(forged.verify(), Err(LedgerError::InvalidAddress(_))));
    }

    #[test]
    fn test_reward_has_no_credentials() {
        let reward = Transaction::new_reward("miner", 10);
        assert!(reward.is_reward());
        assert!(reward.get_signature().is_none());
        assert!(reward.verify().is_err());
    }

    #[test]
    fn test_request_round_trip_preserves_transaction() {
        let sender = Wallet::new().unwrap();
        let tx = sender.new_transaction("recipient", 9).unwrap();
        let request = TransactionRequest::from_transaction(&tx);

        assert!(request.validate());
        assert_eq!(request.into_transaction().unwrap(), tx);
    }

    #[test]
    fn test_request_with_missing_or_malformed_fields() {
        let partial = TransactionRequest {
            sender_blockchain_address: Some("a".to_string()),
            ..Default::default()
        };
        assert!(!partial.validate());
        assert!(partial.into_transaction().is_err());

        let sender = Wallet::new().unwrap();
        let tx = sender.new_transaction("recipient", 9).unwrap();
        let mut request = TransactionRequest::from_transaction(&tx);
        request.signature = Some("not-a-signature".to_string());
        assert!(matches!(
            request.into_transaction(),
            Err(LedgerError::Signature(_))
        ));
    }

    #[test]
    fn test_digest_ignores_credentials() {
        let sender = Wallet::new().unwrap();
        let signed = sender.new_transaction("recipient", 3).unwrap();
        let unsigned = Transaction::new(sender.get_address(), "recipient", 3);
        assert_eq!(
            signed.digest_payload().unwrap(),
            unsigned.digest_payload().unwrap()
        );
    }
}
