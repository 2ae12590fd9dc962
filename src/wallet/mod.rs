//! Wallet management and cryptographic identities
//!
//! Keypair generation, Base58Check address derivation and transaction signing.

pub mod keys;
#[allow(clippy::module_inception)]
pub mod wallet;

pub use keys::{curve_order, PrivateKey, PublicKey, Signature, PUBLIC_KEY_LEN, SIGNATURE_LEN};
pub use wallet::{
    address_from_public_key, convert_address, hash_pub_key, validate_address, Wallet, WalletInfo,
    ADDRESS_CHECK_SUM_LEN,
};
