//! HMAC-SHA3-256 commitment primitives.
//!
//! mac = HMAC-SHA3-256(key, encode(value))
//! where:
//!   key   = 32 fresh bytes from the OS random source, one per commitment
//!   value = the committed integer, encoded as ASCII decimal

use crate::protocol::ProtocolError;
use hmac::{Hmac, Mac as _};
use rand::{rngs::OsRng, CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha3::Sha3_256;
use std::fmt;
use std::str::FromStr;
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha3_256 = Hmac<Sha3_256>;

/// Length of a commitment key in bytes (256 bits)
pub const KEY_LEN: usize = 32;

/// Secret HMAC key, held only by the committing side until reveal
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; KEY_LEN]);

impl SecretKey {
    /// Create a new key from the operating system's CSPRNG
    pub fn random() -> Self {
        Self::from_rng(&mut OsRng)
    }

    /// Create a new key from a caller-supplied cryptographic RNG
    pub fn from_rng<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Compute the MAC binding this key to `value`
    pub fn mac(&self, value: i64) -> Result<Mac, ProtocolError> {
        Mac::compute(&self.0, value)
    }

    /// Publish the key. The secret copy is wiped when `self` drops.
    pub fn publish(self) -> RevealedKey {
        RevealedKey(self.0)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey(<redacted>)")
    }
}

/// A key that has been disclosed to the peer for verification
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RevealedKey(#[serde(with = "hex32")] [u8; KEY_LEN]);

impl RevealedKey {
    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the underlying bytes
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for RevealedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RevealedKey({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for RevealedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self.0))
    }
}

impl FromStr for RevealedKey {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex32(s, "key").map(Self)
    }
}

/// HMAC-SHA3-256 tag published before the peer contributes
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mac(#[serde(with = "hex32")] [u8; 32]);

impl Mac {
    /// Compute HMAC-SHA3-256(key, encode(value))
    pub fn compute(key: &[u8], value: i64) -> Result<Self, ProtocolError> {
        let mut hmac = new_hmac(key)?;
        hmac.update(&encode_value(value));
        Ok(Self(hmac.finalize().into_bytes().into()))
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the underlying bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Mac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mac({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for Mac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self.0))
    }
}

impl FromStr for Mac {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex32(s, "mac").map(Self)
    }
}

/// Message encoding covered by the MAC: the value as ASCII decimal
pub fn encode_value(value: i64) -> Vec<u8> {
    value.to_string().into_bytes()
}

/// Recompute the MAC from a revealed key and value and compare it, in
/// constant time, with the MAC published at commit time.
pub fn verify(key: &RevealedKey, value: i64, mac: &Mac) -> Result<(), ProtocolError> {
    let mut hmac = new_hmac(key.as_bytes())?;
    hmac.update(&encode_value(value));
    hmac.verify_slice(mac.as_bytes())
        .map_err(|_| ProtocolError::VerificationFailure {
            value,
            mac: mac.to_string(),
        })
}

fn new_hmac(key: &[u8]) -> Result<HmacSha3_256, ProtocolError> {
    HmacSha3_256::new_from_slice(key).map_err(|e| ProtocolError::CryptoUnavailable(e.to_string()))
}

fn parse_hex32(s: &str, what: &str) -> Result<[u8; 32], ProtocolError> {
    let bytes = hex::decode(s.trim())
        .map_err(|e| ProtocolError::InvalidEncoding(format!("{what}: {e}")))?;
    bytes.try_into().map_err(|b: Vec<u8>| {
        ProtocolError::InvalidEncoding(format!("{what}: expected 32 bytes, got {}", b.len()))
    })
}

mod hex32 {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 32], s: S) -> Result<S::Ok, S::Error> {
        hex::encode(bytes).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; 32], D::Error> {
        let hex_str = String::deserialize(d)?;
        let bytes = hex::decode(&hex_str).map_err(serde::de::Error::custom)?;
        if bytes.len() != 32 {
            return Err(serde::de::Error::custom("expected 32 bytes"));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(arr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmac::Mac as _;

    #[test]
    fn test_mac_verification() {
        let key = SecretKey::random();
        let mac = key.mac(4).unwrap();
        let revealed = key.publish();

        assert!(verify(&revealed, 4, &mac).is_ok());
    }

    #[test]
    fn test_different_values_different_macs() {
        let key = SecretKey::random();

        assert_ne!(key.mac(0).unwrap(), key.mac(1).unwrap());
    }

    #[test]
    fn test_different_keys_different_macs() {
        let key1 = SecretKey::random();
        let key2 = SecretKey::random();

        assert_ne!(key1.mac(3).unwrap(), key2.mac(3).unwrap());
    }

    #[test]
    fn test_wrong_value_fails_verification() {
        let key = SecretKey::random();
        let mac = key.mac(2).unwrap();
        let revealed = key.publish();

        assert!(matches!(
            verify(&revealed, 3, &mac),
            Err(ProtocolError::VerificationFailure { value: 3, .. })
        ));
    }

    #[test]
    fn test_flipped_key_bit_fails_verification() {
        let key = SecretKey::random();
        let mac = key.mac(5).unwrap();
        let mut bytes = *key.publish().as_bytes();
        bytes[17] ^= 0x01;

        assert!(verify(&RevealedKey::from_bytes(bytes), 5, &mac).is_err());
    }

    #[test]
    fn test_flipped_value_bit_fails_verification() {
        let key = SecretKey::random();
        let mac = key.mac(6).unwrap();
        let revealed = key.publish();

        assert!(verify(&revealed, 6 ^ 1, &mac).is_err());
    }

    #[test]
    fn test_known_answer_matches_independent_hmac() {
        // Independent recomputation with the raw hmac API over "42".
        let key_bytes = [7u8; KEY_LEN];
        let mut reference = HmacSha3_256::new_from_slice(&key_bytes).unwrap();
        reference.update(b"42");
        let expected: [u8; 32] = reference.finalize().into_bytes().into();

        let mac = SecretKey::from_bytes(key_bytes).mac(42).unwrap();
        assert_eq!(mac.as_bytes(), &expected);
    }

    #[test]
    fn test_encode_value_is_ascii_decimal() {
        assert_eq!(encode_value(0), b"0");
        assert_eq!(encode_value(-3), b"-3");
        assert_eq!(encode_value(1234), b"1234");
    }

    #[test]
    fn test_hex_parsing() {
        let key = RevealedKey::from_bytes([0xab; KEY_LEN]);
        let parsed: RevealedKey = key.to_string().parse().unwrap();
        assert_eq!(parsed, key);

        assert!(matches!(
            "abcd".parse::<Mac>(),
            Err(ProtocolError::InvalidEncoding(_))
        ));
        assert!("zz".parse::<RevealedKey>().is_err());
    }

    #[test]
    fn test_secret_key_debug_is_redacted() {
        let key = SecretKey::from_bytes([0x11; KEY_LEN]);
        assert_eq!(format!("{:?}", key), "SecretKey(<redacted>)");
    }
}
