//! # Threshold Multisignatures
//!
//! A multisig account is an ordered list of N public keys plus a threshold
//! M. Its address commits to the version, the threshold and the keys *in
//! order*; reordering the keys yields a different account.
//!
//! Partial signatures are collected independently (each signer sees only
//! the unsigned transaction and the metadata) and combined with
//! [`MultisigTransaction::merge`]. Every operation returns a new value;
//! nothing is mutated in place.

use rmpv::Value;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::builder::Transaction;
use super::signing::{Authorization, SignedTransaction};
use crate::config::{MULTISIG_ADDR_TAG, MULTISIG_VERSION};
use crate::crypto::{tagged_hash, Address, Keypair, Signature};
use crate::encoding::msgpack::{as_bin, type_error};
use crate::encoding::{CanonicalDecode, CanonicalEncode, MapBuilder, MapReader};
use crate::error::{CryptoError, EncodingError, MergeError, Result, ValidationError};

// ---------------------------------------------------------------------------
// Multisig metadata
// ---------------------------------------------------------------------------

/// Version, threshold and ordered keys of a multisig account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Multisig {
    version: u8,
    threshold: u8,
    keys: Vec<Address>,
}

impl Multisig {
    /// Validates `1 <= threshold <= keys.len() <= 255` and the version.
    pub fn new(version: u8, threshold: u8, keys: Vec<Address>) -> Result<Self, ValidationError> {
        let msig = Self {
            version,
            threshold,
            keys,
        };
        msig.validate()?;
        Ok(msig)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version != MULTISIG_VERSION {
            return Err(ValidationError::UnsupportedMultisigVersion(self.version));
        }
        let n = self.keys.len();
        if self.threshold == 0 || n > u8::MAX as usize || usize::from(self.threshold) > n {
            return Err(ValidationError::InvalidThreshold {
                threshold: self.threshold,
                keys: n,
            });
        }
        Ok(())
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn keys(&self) -> &[Address] {
        &self.keys
    }

    /// `SHA-512/256("MultisigAddr" ‖ version ‖ threshold ‖ pk₁ ‖ … ‖ pkₙ)`.
    pub fn address(&self) -> Address {
        let mut buf = Vec::with_capacity(2 + 32 * self.keys.len());
        buf.push(self.version);
        buf.push(self.threshold);
        for key in &self.keys {
            buf.extend_from_slice(key.as_bytes());
        }
        Address::new(tagged_hash(MULTISIG_ADDR_TAG, &buf))
    }

    /// Slot of `key`. A key listed twice answers with its first slot.
    pub fn index_of(&self, key: &Address) -> Option<usize> {
        self.keys.iter().position(|k| k == key)
    }

    /// A signature container with every slot empty.
    pub fn empty_signature(&self) -> MultisigSignature {
        MultisigSignature {
            version: self.version,
            threshold: self.threshold,
            subsigs: self
                .keys
                .iter()
                .map(|key| MultisigSubsig {
                    key: *key,
                    signature: None,
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Subsignatures
// ---------------------------------------------------------------------------

/// One slot: the member key and, once they have signed, their signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigSubsig {
    pub key: Address,
    pub signature: Option<Signature>,
}

/// The `msig` container carried by a signed transaction or logic signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigSignature {
    pub version: u8,
    pub threshold: u8,
    pub subsigs: Vec<MultisigSubsig>,
}

impl MultisigSignature {
    /// The metadata these slots were created from.
    pub fn metadata(&self) -> Result<Multisig, ValidationError> {
        Multisig::new(
            self.version,
            self.threshold,
            self.subsigs.iter().map(|s| s.key).collect(),
        )
    }

    pub fn address(&self) -> Result<Address, ValidationError> {
        Ok(self.metadata()?.address())
    }

    /// Number of populated slots.
    pub fn populated(&self) -> usize {
        self.subsigs.iter().filter(|s| s.signature.is_some()).count()
    }

    pub fn meets_threshold(&self) -> bool {
        self.populated() >= usize::from(self.threshold)
    }

    fn same_metadata(&self, other: &MultisigSignature) -> bool {
        self.version == other.version
            && self.threshold == other.threshold
            && self.subsigs.len() == other.subsigs.len()
            && self
                .subsigs
                .iter()
                .zip(&other.subsigs)
                .all(|(a, b)| a.key == b.key)
    }

    /// Sign `message` into the slot belonging to `keypair`.
    pub fn sign(&self, message: &[u8], keypair: &Keypair) -> Result<Self, ValidationError> {
        self.metadata()?;
        let index = self
            .subsigs
            .iter()
            .position(|s| s.key == keypair.address())
            .ok_or(ValidationError::NotMultisigMember)?;
        let mut out = self.clone();
        out.subsigs[index].signature = Some(keypair.sign(message));
        Ok(out)
    }

    /// Union of slot signatures. Equal signatures in the same slot are
    /// fine; different ones conflict.
    pub fn merge(parts: &[MultisigSignature]) -> Result<Self, MergeError> {
        let (first, rest) = parts.split_first().ok_or(MergeError::Empty)?;
        let mut merged = first.clone();
        for part in rest {
            if !merged.same_metadata(part) {
                return Err(MergeError::MismatchedMultisigMetadata);
            }
            for (index, (slot, incoming)) in
                merged.subsigs.iter_mut().zip(&part.subsigs).enumerate()
            {
                match (&slot.signature, &incoming.signature) {
                    (_, None) => {}
                    (None, Some(sig)) => slot.signature = Some(*sig),
                    (Some(have), Some(sig)) if have == sig => {}
                    (Some(_), Some(_)) => {
                        return Err(MergeError::DuplicateSignature { index });
                    }
                }
            }
        }
        Ok(merged)
    }

    /// Every populated slot verifies over `message`, and at least
    /// `threshold` slots are populated.
    pub fn verify(&self, message: &[u8]) -> bool {
        if self.metadata().is_err() || !self.meets_threshold() {
            return false;
        }
        self.subsigs.iter().all(|slot| match &slot.signature {
            Some(sig) => slot.key.verify(message, sig),
            None => true,
        })
    }
}

impl CanonicalEncode for MultisigSignature {
    fn to_msgpack(&self) -> Value {
        let subsigs = self
            .subsigs
            .iter()
            .map(|slot| {
                let map = MapBuilder::new().address("pk", &slot.key);
                match &slot.signature {
                    Some(sig) => map.bytes("s", sig.as_bytes()),
                    None => map,
                }
                .build()
            })
            .collect();
        MapBuilder::new()
            .value("subsig", Value::Array(subsigs))
            .uint("thr", u64::from(self.threshold))
            .uint("v", u64::from(self.version))
            .build()
    }
}

impl CanonicalDecode for MultisigSignature {
    fn from_msgpack(value: &Value) -> Result<Self, EncodingError> {
        let mut r = MapReader::new(value, "msig")?;
        let threshold = small_uint("thr", r.uint("thr")?)?;
        let version = small_uint("v", r.uint("v")?)?;
        let subsigs = match r.take("subsig") {
            None => Vec::new(),
            Some(v) => v
                .as_array()
                .ok_or_else(|| type_error("subsig", "array"))?
                .iter()
                .map(decode_subsig)
                .collect::<Result<_, _>>()?,
        };
        r.finish()?;
        Ok(Self {
            version,
            threshold,
            subsigs,
        })
    }
}

fn decode_subsig(value: &Value) -> Result<MultisigSubsig, EncodingError> {
    let mut r = MapReader::new(value, "subsig")?;
    let key = r.address("pk")?;
    let signature = match r.take("s") {
        None => None,
        Some(v) => {
            let raw = as_bin("s", v)?;
            Some(Signature::try_from_slice(raw).map_err(|_| EncodingError::InvalidLength {
                field: "s".to_string(),
                expected: 64,
                actual: raw.len(),
            })?)
        }
    };
    r.finish()?;
    Ok(MultisigSubsig { key, signature })
}

fn small_uint(field: &str, n: u64) -> Result<u8, EncodingError> {
    u8::try_from(n).map_err(|_| type_error(field, "integer below 256"))
}

// ---------------------------------------------------------------------------
// MultisigTransaction
// ---------------------------------------------------------------------------

/// A transaction collecting partial signatures from a multisig account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigTransaction {
    pub txn: Transaction,
    pub msig: MultisigSignature,
}

impl MultisigTransaction {
    /// Wraps `txn` with empty slots for every member of `msig`.
    pub fn new(txn: Transaction, msig: &Multisig) -> Result<Self, ValidationError> {
        msig.validate()?;
        Ok(Self {
            txn,
            msig: msig.empty_signature(),
        })
    }

    /// A copy with `keypair`'s slot signed.
    pub fn sign(&self, keypair: &Keypair) -> Result<Self, ValidationError> {
        let msig = self.msig.sign(&self.txn.bytes_to_sign(), keypair)?;
        debug!(
            txid = %self.txn.id_string(),
            signer = %keypair.address(),
            populated = msig.populated(),
            threshold = msig.threshold,
            "added multisig signature"
        );
        Ok(Self {
            txn: self.txn.clone(),
            msig,
        })
    }

    /// Combine partially signed copies of the same transaction.
    ///
    /// Order does not matter: merging is commutative and associative.
    pub fn merge(parts: &[MultisigTransaction]) -> Result<Self, MergeError> {
        let first = parts.first().ok_or(MergeError::Empty)?;
        let txid = first.txn.id();
        if parts.iter().any(|p| p.txn.id() != txid) {
            return Err(MergeError::MismatchedTransaction);
        }
        let sigs: Vec<MultisigSignature> = parts.iter().map(|p| p.msig.clone()).collect();
        let msig = MultisigSignature::merge(&sigs)?;
        debug!(
            txid = %first.txn.id_string(),
            parts = parts.len(),
            populated = msig.populated(),
            "merged multisig transaction"
        );
        Ok(Self {
            txn: first.txn.clone(),
            msig,
        })
    }

    /// Enough slots are populated to meet the threshold.
    pub fn is_broadcast_eligible(&self) -> bool {
        self.msig.meets_threshold()
    }

    /// Populated slots verify and the threshold is met.
    pub fn verify(&self) -> bool {
        self.msig.verify(&self.txn.bytes_to_sign())
    }

    /// The signed-transaction form, with the multisig address recorded as
    /// the authorizer when it differs from the sender.
    pub fn to_signed(&self) -> Result<SignedTransaction, ValidationError> {
        let authorizer = self.msig.address()?;
        Ok(SignedTransaction {
            txn: self.txn.clone(),
            auth: Authorization::Multisig(self.msig.clone()),
            auth_addr: (authorizer != *self.txn.sender()).then_some(authorizer),
        })
    }
}

impl CanonicalEncode for MultisigTransaction {
    fn to_msgpack(&self) -> Value {
        let authorizer = self.msig.address().ok();
        SignedTransaction {
            txn: self.txn.clone(),
            auth: Authorization::Multisig(self.msig.clone()),
            auth_addr: authorizer.filter(|a| a != self.txn.sender()),
        }
        .to_msgpack()
    }
}

impl CanonicalDecode for MultisigTransaction {
    fn from_msgpack(value: &Value) -> Result<Self, EncodingError> {
        let signed = SignedTransaction::from_msgpack(value)?;
        match signed.auth {
            Authorization::Multisig(msig) => Ok(Self {
                txn: signed.txn,
                msig,
            }),
            _ => Err(EncodingError::MissingField("msig")),
        }
    }
}

impl TryFrom<SignedTransaction> for MultisigTransaction {
    type Error = CryptoError;

    fn try_from(signed: SignedTransaction) -> std::result::Result<Self, Self::Error> {
        match signed.auth {
            Authorization::Multisig(msig) => Ok(Self {
                txn: signed.txn,
                msig,
            }),
            _ => Err(CryptoError::VerificationFailed),
        }
    }
}

/// Convenience wrapper: merge and hand back the signed form.
pub fn merge_multisig_transactions(parts: &[MultisigTransaction]) -> Result<SignedTransaction> {
    Ok(MultisigTransaction::merge(parts)?.to_signed()?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
