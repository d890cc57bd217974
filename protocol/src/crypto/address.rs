//! # Address Codec
//!
//! Maps a 32-byte public key to its 58-character textual address and back.
//!
//! ```text
//! address = base32_nopad( pubkey ‖ SHA-512/256(pubkey)[28..32] )
//! ```
//!
//! The 4-byte checksum catches typos: any single-character change in the
//! text form either fails base32 decoding or fails the checksum.

use data_encoding::BASE32_NOPAD;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::hash::sha512_256;
use crate::config::{ADDRESS_LENGTH, CHECKSUM_LENGTH, PUBLIC_KEY_LENGTH};

/// Reasons an address string can be rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address must be {ADDRESS_LENGTH} characters, got {0}")]
    InvalidLength(usize),

    #[error("address is not valid base32: {0}")]
    InvalidEncoding(String),

    #[error("address checksum mismatch")]
    InvalidChecksum,
}

/// A 32-byte account identity (an Ed25519 public key, or a hash standing in
/// for one in the case of multisig and program accounts).
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; PUBLIC_KEY_LENGTH]);

impl Address {
    /// The all-zero address. The encoder treats it as an empty field.
    pub const ZERO: Address = Address([0u8; PUBLIC_KEY_LENGTH]);

    pub const fn new(bytes: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn try_from_slice(slice: &[u8]) -> Result<Self, AddressError> {
        let bytes: [u8; PUBLIC_KEY_LENGTH] = slice
            .try_into()
            .map_err(|_| AddressError::InvalidLength(slice.len()))?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; PUBLIC_KEY_LENGTH]
    }

    /// Encode to the checksummed base32 text form.
    pub fn encode(&self) -> String {
        encode_address(&self.0)
    }

    /// Decode and verify a checksummed base32 address.
    pub fn decode(text: &str) -> Result<Self, AddressError> {
        decode_address(text).map(Self)
    }
}

fn checksum(pubkey: &[u8; PUBLIC_KEY_LENGTH]) -> [u8; CHECKSUM_LENGTH] {
    let digest = sha512_256(pubkey);
    let mut out = [0u8; CHECKSUM_LENGTH];
    out.copy_from_slice(&digest[32 - CHECKSUM_LENGTH..]);
    out
}

/// Encode a raw public key as an address string.
pub fn encode_address(pubkey: &[u8; PUBLIC_KEY_LENGTH]) -> String {
    let mut buf = Vec::with_capacity(PUBLIC_KEY_LENGTH + CHECKSUM_LENGTH);
    buf.extend_from_slice(pubkey);
    buf.extend_from_slice(&checksum(pubkey));
    BASE32_NOPAD.encode(&buf)
}

/// Decode an address string to the raw public key, rejecting tampering.
pub fn decode_address(text: &str) -> Result<[u8; PUBLIC_KEY_LENGTH], AddressError> {
    if text.len() != ADDRESS_LENGTH {
        return Err(AddressError::InvalidLength(text.len()));
    }
    let raw = BASE32_NOPAD
        .decode(text.as_bytes())
        .map_err(|e| AddressError::InvalidEncoding(e.to_string()))?;
    if raw.len() != PUBLIC_KEY_LENGTH + CHECKSUM_LENGTH {
        return Err(AddressError::InvalidLength(text.len()));
    }
    let mut pubkey = [0u8; PUBLIC_KEY_LENGTH];
    pubkey.copy_from_slice(&raw[..PUBLIC_KEY_LENGTH]);
    if raw[PUBLIC_KEY_LENGTH..] != checksum(&pubkey) {
        return Err(AddressError::InvalidChecksum);
    }
    Ok(pubkey)
}

/// Returns `true` if `text` decodes as a well-formed address.
pub fn is_valid_address(text: &str) -> bool {
    decode_address(text).is_ok()
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.encode())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl From<[u8; PUBLIC_KEY_LENGTH]> for Address {
    fn from(bytes: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let text = String::deserialize(d)?;
        Address::decode(&text).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZERO_ADDRESS: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAY5HFKQ";

    #[test]
    fn zero_address_golden() {
        assert_eq!(Address::ZERO.encode(), ZERO_ADDRESS);
        assert_eq!(Address::decode(ZERO_ADDRESS).unwrap(), Address::ZERO);
    }

    #[test]
    fn encoded_length_is_fixed() {
        for seed in 0u8..8 {
            let addr = Address::new([seed.wrapping_mul(37); 32]);
            assert_eq!(addr.encode().len(), ADDRESS_LENGTH);
        }
    }

    #[test]
    fn roundtrip() {
        let addr = Address::new([0xAB; 32]);
        assert_eq!(Address::decode(&addr.encode()).unwrap(), addr);
    }

    #[test]
    fn corrupted_checksum_rejected() {
        let text = Address::new([7u8; 32]).encode();
        // The final characters carry the checksum; flip one of them to a
        // different base32 symbol.
        let mut chars: Vec<char> = text.chars().collect();
        let idx = ADDRESS_LENGTH - 3;
        chars[idx] = if chars[idx] == 'A' { 'B' } else { 'A' };
        let tampered: String = chars.into_iter().collect();
        assert_eq!(
            Address::decode(&tampered),
            Err(AddressError::InvalidChecksum)
        );
    }

    #[test]
    fn corrupted_key_byte_rejected() {
        let text = Address::new([7u8; 32]).encode();
        let mut chars: Vec<char> = text.chars().collect();
        chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
        let tampered: String = chars.into_iter().collect();
        assert_eq!(
            Address::decode(&tampered),
            Err(AddressError::InvalidChecksum)
        );
    }

    #[test]
    fn wrong_length_rejected() {
        assert_eq!(
            Address::decode("AAAA"),
            Err(AddressError::InvalidLength(4))
        );
    }

    #[test]
    fn bad_alphabet_rejected() {
        let mut text = Address::ZERO.encode();
        text.replace_range(0..1, "1");
        assert!(matches!(
            Address::decode(&text),
            Err(AddressError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn serde_uses_text_form() {
        let addr = Address::new([9u8; 32]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr.encode()));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
