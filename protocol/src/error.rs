//! Error types for the protocol core.
//!
//! Each concern gets its own enum so call sites can match precisely;
//! [`Error`] aggregates them for callers that just want `?` to work.
//! Nothing in this crate aborts the process: every failure is returned.

use thiserror::Error;

use crate::crypto::AddressError;

/// Malformed or out-of-range construction parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("last valid round {last} is before first valid round {first}")]
    InvalidValidityWindow { first: u64, last: u64 },

    #[error("transaction needs a genesis hash or a genesis id")]
    MissingGenesis,

    #[error("note is {len} bytes, maximum is {max}")]
    NoteTooLong { len: usize, max: usize },

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("reconfiguring asset {index} would clear the {role} address")]
    EmptyAssetRole { index: u64, role: &'static str },

    #[error("multisig threshold {threshold} is invalid for {keys} keys")]
    InvalidThreshold { threshold: u8, keys: usize },

    #[error("unsupported multisig version {0}")]
    UnsupportedMultisigVersion(u8),

    #[error("signing key is not a member of the multisig")]
    NotMultisigMember,

    #[error("group must contain between 1 and {max} transactions, got {len}")]
    InvalidGroupSize { len: usize, max: usize },

    #[error("transaction {index} already belongs to a group")]
    AlreadyGrouped { index: usize },

    #[error("invalid program: {0}")]
    InvalidProgram(String),
}

/// Malformed bytes on decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("malformed encoding: {0}")]
    Malformed(String),

    #[error("unexpected end of input")]
    Truncated,

    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),

    #[error("field {field}: expected {expected}")]
    UnexpectedType {
        field: String,
        expected: &'static str,
    },

    #[error("field {field}: expected {expected} bytes, got {actual}")]
    InvalidLength {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("unknown field {0}")]
    UnknownField(String),

    #[error("missing field {0}")]
    MissingField(&'static str),

    #[error("invalid base64: {0}")]
    InvalidBase64(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Well-formed MessagePack that is not the one canonical encoding of
    /// its value.
    #[error("non-canonical encoding: {0}")]
    NonCanonical(String),
}

/// Signature and checksum failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("address checksum mismatch")]
    InvalidChecksum,

    #[error("signature verification failed")]
    VerificationFailed,

    #[error("invalid secret key bytes")]
    InvalidSecretKey,

    #[error("private key does not match its embedded public key")]
    KeypairMismatch,

    #[error("signature must be 64 bytes, got {0}")]
    InvalidSignatureLength(usize),
}

/// Failures turning a 25-word mnemonic back into key bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MnemonicError {
    #[error("mnemonic must have 25 words, got {0}")]
    WrongLength(usize),

    #[error("{0:?} is not in the word list")]
    UnknownWord(String),

    #[error("mnemonic encodes more than 32 bytes")]
    NonZeroPadding,

    #[error("checksum word does not match")]
    InvalidChecksum,

    #[error(transparent)]
    Key(#[from] CryptoError),
}

/// Reasons a multisig merge refuses its inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("nothing to merge")]
    Empty,

    #[error("partial signatures wrap different transactions")]
    MismatchedTransaction,

    #[error("partial signatures use different multisig metadata")]
    MismatchedMultisigMetadata,

    #[error("conflicting signatures for multisig slot {index}")]
    DuplicateSignature { index: usize },
}

/// Any failure from the protocol core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Mnemonic(#[from] MnemonicError),

    #[error(transparent)]
    Merge(#[from] MergeError),
}

impl From<AddressError> for Error {
    fn from(err: AddressError) -> Self {
        match err {
            AddressError::InvalidChecksum => Error::Crypto(CryptoError::InvalidChecksum),
            other => Error::Encoding(EncodingError::InvalidAddress(other.to_string())),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
