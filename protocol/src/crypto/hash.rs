//! # Hashing Utilities
//!
//! Every identifier in the protocol is a 32-byte digest of some
//! domain-tagged byte string:
//!
//! - **SHA-512/256**: the workhorse. Addresses, transaction ids, group ids,
//!   multisig addresses and program addresses all use it. Truncated SHA-512
//!   is faster than SHA-256 on 64-bit hardware and immune to length
//!   extension.
//! - **SHA-256** and **Keccak-256**: only exposed because hash-lock
//!   contracts let the funder pick either one for the hash image.
//!
//! ## Domain separation
//!
//! Callers never hash raw payloads. [`tagged_hash`] prepends a short ASCII
//! tag ("TX", "TG", "Program", ...) from [`crate::config`] so that a
//! transaction can never hash to the same value as a group or a program.

use sha2::{Digest, Sha256, Sha512_256};
use sha3::Keccak256;

/// Compute SHA-512/256 of the input and return a fixed-size digest.
///
/// # Example
///
/// ```
/// use algo_protocol::crypto::sha512_256;
///
/// let digest = sha512_256(b"algo");
/// assert_eq!(digest.len(), 32);
/// ```
pub fn sha512_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha512_256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute SHA-512/256 over a domain tag followed by the payload.
///
/// Feeding both parts into the same hasher gives exactly
/// `SHA-512/256(tag ‖ data)` without allocating the concatenation.
pub fn tagged_hash(tag: &[u8], data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha512_256::new();
    hasher.update(tag);
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute SHA-256 of the input.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute Keccak-256 (the pre-standard SHA-3 padding) of the input.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        let hash = sha256(b"");
        let expected =
            hex::decode("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
                .unwrap();
        assert_eq!(hash.to_vec(), expected);
    }

    #[test]
    fn sha512_256_known_vector() {
        // FIPS 180-4 test vector for "abc".
        let hash = sha512_256(b"abc");
        let expected =
            hex::decode("53048e2681941ef99b2e29b76b4c7dabe4c2d0c634fc6d46e0e2f13107e7af23")
                .unwrap();
        assert_eq!(hash.to_vec(), expected);
    }

    #[test]
    fn keccak256_known_vector() {
        let hash = keccak256(b"");
        let expected =
            hex::decode("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
                .unwrap();
        assert_eq!(hash.to_vec(), expected);
    }

    #[test]
    fn tagged_hash_equals_hash_of_concatenation() {
        let tagged = tagged_hash(b"TX", b"payload");
        let manual = sha512_256(b"TXpayload");
        assert_eq!(tagged, manual);
    }

    #[test]
    fn tag_changes_digest() {
        assert_ne!(tagged_hash(b"TX", b"data"), tagged_hash(b"TG", b"data"));
    }
}
