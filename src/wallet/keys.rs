//! Key material and signature encodings.
//!
//! `PublicKey` and `Signature` have stable string forms (lowercase hex) so they
//! can cross a transport boundary. `PrivateKey` has none: it is not
//! serializable and its `Debug` output is redacted.

use crate::error::{LedgerError, Result};
use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};
use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of an uncompressed SEC1 P-256 point, `0x04 ‖ X ‖ Y`
pub const PUBLIC_KEY_LEN: usize = 65;
/// Length of a fixed-size P-256 signature, `r ‖ s`
pub const SIGNATURE_LEN: usize = 64;
const SCALAR_LEN: usize = 32;
const SEC1_UNCOMPRESSED_TAG: u8 = 0x04;
/// Order `n` of the P-256 base point, big-endian.
const P256_ORDER: [u8; SCALAR_LEN] = [
    0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xbc, 0xe6, 0xfa, 0xad, 0xa7, 0x17, 0x9e, 0x84, 0xf3, 0xb9, 0xca, 0xc2, 0xfc, 0x63, 0x25, 0x51,
];

pub fn curve_order() -> BigUint {
    BigUint::from_bytes_be(&P256_ORDER)
}

#[derive(Clone, PartialEq, Eq, Hash, bincode::Encode)]
pub struct PublicKey(Vec<u8>);

impl PublicKey {
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<PublicKey> {
        if bytes.len() != PUBLIC_KEY_LEN || bytes[0] != SEC1_UNCOMPRESSED_TAG {
            return Err(LedgerError::Validation(format!(
                "Public key must be a {PUBLIC_KEY_LEN}-byte uncompressed point"
            )));
        }
        Ok(PublicKey(bytes.to_vec()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }
}

// X ‖ Y in hex; the SEC1 tag is implied.
impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&HEXLOWER.encode(&self.0[1..]))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({self})")
    }
}

impl FromStr for PublicKey {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<PublicKey> {
        let coordinates = HEXLOWER_PERMISSIVE
            .decode(s.as_bytes())
            .map_err(|e| LedgerError::Validation(format!("Invalid public key hex: {e}")))?;
        let mut bytes = Vec::with_capacity(PUBLIC_KEY_LEN);
        bytes.push(SEC1_UNCOMPRESSED_TAG);
        bytes.extend(coordinates);
        PublicKey::from_sec1_bytes(&bytes)
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// ECDSA signature: the integer pair `(r, s)` stored as two big-endian 32-byte halves.
///
/// Only the low-S form (`s <= n/2`) is accepted, so a signature and its
/// mirror `(r, n - s)` cannot both appear.
#[derive(Clone, PartialEq, Eq, Hash, bincode::Encode)]
pub struct Signature(Vec<u8>);

impl Signature {
    /// Accepts only canonical signatures: `0 < r < n` and `0 < s <= n/2`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Signature> {
        if bytes.len() != SIGNATURE_LEN {
            return Err(LedgerError::Signature(format!(
                "Signature must be {SIGNATURE_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let (r, s) = bytes.split_at(SCALAR_LEN);
        let (r, s) = (BigUint::from_bytes_be(r), BigUint::from_bytes_be(s));
        let zero = BigUint::from(0u8);
        if r == zero || s == zero {
            return Err(LedgerError::Signature(
                "Signature components must be non-zero".to_string(),
            ));
        }
        let n = curve_order();
        if r >= n {
            return Err(LedgerError::Signature(
                "Signature r is not below the curve order".to_string(),
            ));
        }
        if s > &n >> 1u8 {
            return Err(LedgerError::Signature(
                "Signature s is not in low-S form".to_string(),
            ));
        }
        Ok(Signature(bytes.to_vec()))
    }

    /// Wraps a freshly produced `r ‖ s`, folding a high `s` to `n - s`.
    pub fn normalized(bytes: &[u8]) -> Result<Signature> {
        if bytes.len() != SIGNATURE_LEN {
            return Signature::from_bytes(bytes);
        }
        let (r, s) = bytes.split_at(SCALAR_LEN);
        let n = curve_order();
        let s = BigUint::from_bytes_be(s);
        if s > &n >> 1u8 && s < n {
            return Signature::from_parts(&BigUint::from_bytes_be(r), &(n - s));
        }
        Signature::from_bytes(bytes)
    }

    pub fn from_parts(r: &BigUint, s: &BigUint) -> Result<Signature> {
        let mut bytes = Vec::with_capacity(SIGNATURE_LEN);
        for part in [r, s] {
            let be = part.to_bytes_be();
            if be.len() > SCALAR_LEN {
                return Err(LedgerError::Signature(
                    "Signature component exceeds 256 bits".to_string(),
                ));
            }
            bytes.extend(std::iter::repeat(0u8).take(SCALAR_LEN - be.len()));
            bytes.extend(be);
        }
        Signature::from_bytes(&bytes)
    }

    pub fn r(&self) -> BigUint {
        BigUint::from_bytes_be(&self.0[..SCALAR_LEN])
    }

    pub fn s(&self) -> BigUint {
        BigUint::from_bytes_be(&self.0[SCALAR_LEN..])
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:064x}{:064x}", self.r(), self.s())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({self})")
    }
}

impl FromStr for Signature {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Signature> {
        if s.len() != SIGNATURE_LEN * 2 {
            return Err(LedgerError::Signature(format!(
                "Signature must be {} hex digits",
                SIGNATURE_LEN * 2
            )));
        }
        let bytes = HEXLOWER_PERMISSIVE
            .decode(s.as_bytes())
            .map_err(|e| LedgerError::Signature(format!("Invalid signature hex: {e}")))?;
        Signature::from_bytes(&bytes)
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// PKCS#8 document for a P-256 key. Wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey {
    pkcs8: Vec<u8>,
}

impl PrivateKey {
    pub(crate) fn from_pkcs8(pkcs8: Vec<u8>) -> PrivateKey {
        PrivateKey { pkcs8 }
    }

    pub fn pkcs8(&self) -> &[u8] {
        self.pkcs8.as_slice()
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}
