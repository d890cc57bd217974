//! # Key Management
//!
//! Ed25519 keypairs and signatures.
//!
//! An account's identity *is* its 32-byte Ed25519 public key; the
//! human-readable [`Address`] is just that key plus a checksum. There is no
//! separate public-key wrapper: anything that needs to verify a signature
//! takes an `Address`.
//!
//! ## Private key format
//!
//! Wallet tooling exchanges private keys as 64 bytes: the 32-byte seed
//! followed by the 32-byte public key, usually base64 encoded.
//! [`Keypair::from_private_key`] accepts that form and rejects it if the
//! trailing public key does not match the seed.
//!
//! Key bytes are never logged.

use base64::{engine::general_purpose::STANDARD, Engine};
use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::address::Address;
use crate::config::{PRIVATE_KEY_LENGTH, SIGNATURE_LENGTH};
use crate::error::CryptoError;

/// An Ed25519 signing keypair.
///
/// Intentionally not `Serialize`: exporting a private key goes through
/// [`Keypair::private_key`] so it is always a deliberate act.
pub struct Keypair {
    signing_key: SigningKey,
}

/// A 64-byte Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature(#[serde(with = "signature_bytes")] pub [u8; SIGNATURE_LENGTH]);

impl Keypair {
    /// Generate a fresh keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Construct a keypair deterministically from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Reconstruct a keypair from the 64-byte `seed ‖ public key` form.
    pub fn from_private_key(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != PRIVATE_KEY_LENGTH {
            return Err(CryptoError::InvalidSecretKey);
        }
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&bytes[..32]);
        let keypair = Self::from_seed(&seed);
        if keypair.address().as_bytes()[..] != bytes[32..] {
            return Err(CryptoError::KeypairMismatch);
        }
        Ok(keypair)
    }

    /// Parse a base64-encoded 64-byte private key.
    pub fn from_private_key_b64(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|_| CryptoError::InvalidSecretKey)?;
        Self::from_private_key(&bytes)
    }

    /// Export the 64-byte `seed ‖ public key` form.
    ///
    /// **Handle with care.** Whoever holds these bytes controls the account.
    pub fn private_key(&self) -> [u8; PRIVATE_KEY_LENGTH] {
        self.signing_key.to_keypair_bytes()
    }

    /// Export the private key as base64, the format wallets import.
    pub fn private_key_b64(&self) -> String {
        STANDARD.encode(self.private_key())
    }

    /// The account address (the public key).
    pub fn address(&self) -> Address {
        Address::new(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign raw bytes. Callers are responsible for domain tagging; see
    /// [`super::signatures::sign_tagged`].
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.signing_key.sign(message).to_bytes())
    }

    /// Verify a signature against this keypair's public key.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        self.address().verify(message, signature)
    }
}

impl Clone for Keypair {
    fn clone(&self) -> Self {
        Self::from_seed(&self.signing_key.to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair(addr={})", self.address())
    }
}

impl PartialEq for Keypair {
    /// Keypairs compare by public key; secret bytes are never compared.
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl Eq for Keypair {}

impl Address {
    /// Verify an Ed25519 signature against this address's public key.
    ///
    /// Returns `false` for anything that does not verify, including byte
    /// strings that are not valid curve points.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(self.as_bytes()) else {
            return false;
        };
        let sig = DalekSignature::from_bytes(&signature.0);
        verifying_key.verify(message, &sig).is_ok()
    }
}

impl Signature {
    /// Parse a signature from a byte slice of exactly 64 bytes.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; SIGNATURE_LENGTH] = slice
            .try_into()
            .map_err(|_| CryptoError::InvalidSignatureLength(slice.len()))?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    pub fn to_b64(&self) -> String {
        STANDARD.encode(self.0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = hex::encode(self.0);
        write!(f, "Signature({}...{})", &hex_str[..8], &hex_str[120..])
    }
}

/// Serde adapter for `[u8; 64]`, which serde does not support natively.
/// JSON views carry the signature as base64 text.
mod signature_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 64], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; 64], D::Error> {
        let text = String::deserialize(d)?;
        let raw = STANDARD.decode(text).map_err(D::Error::custom)?;
        raw.try_into()
            .map_err(|_| D::Error::custom("signature must be 64 bytes"))
    }
}
