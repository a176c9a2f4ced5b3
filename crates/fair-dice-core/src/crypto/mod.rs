//! Cryptographic primitives for the fair value protocol.
//!
//! This module provides:
//! - SecretKey for the per-commitment HMAC key (wiped on drop)
//! - RevealedKey for a key that has been published to the peer
//! - Mac for HMAC-SHA3-256 commitments over an encoded value

mod commitment;

pub use commitment::{encode_value, verify, Mac, RevealedKey, SecretKey, KEY_LEN};
