//! Signed-transaction verification: structural checks, then cryptography.
//!
//! [`verify_transaction`] orders its checks from cheapest to most expensive
//! (field comparisons before any Ed25519 work) so that obviously invalid
//! input fails fast.

use thiserror::Error;

use super::builder::Transaction;
use super::signing::{Authorization, SignedTransaction};
use crate::config::MAX_NOTE_LENGTH;
use crate::crypto::Address;
use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Why a signed transaction was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error(transparent)]
    Structure(#[from] ValidationError),

    /// The single signature does not verify for the authorizer.
    #[error("signature does not verify for {authorizer}")]
    InvalidSignature { authorizer: Address },

    /// The multisig metadata hashes to a different account.
    #[error("multisig account {found} is not the authorizer {expected}")]
    MultisigMismatch { expected: Address, found: Address },

    #[error("multisig carries {populated} of {threshold} required signatures")]
    BelowThreshold { populated: usize, threshold: u8 },

    /// At least one populated multisig slot does not verify.
    #[error("a multisig subsignature does not verify")]
    InvalidSubsignature,

    #[error("logic signature does not authorize {authorizer}")]
    InvalidLogicSig { authorizer: Address },

    /// `sgnr` is present but equal to the sender.
    #[error("authorizing address repeats the sender")]
    RedundantAuthAddress,
}

/// Structural checks that do not need a signature.
pub fn check_structure(txn: &Transaction) -> Result<(), ValidationError> {
    let h = &txn.header;
    if h.last_valid < h.first_valid {
        return Err(ValidationError::InvalidValidityWindow {
            first: h.first_valid,
            last: h.last_valid,
        });
    }
    if h.genesis_hash.is_none() && h.genesis_id.is_empty() {
        return Err(ValidationError::MissingGenesis);
    }
    if h.note.len() > MAX_NOTE_LENGTH {
        return Err(ValidationError::NoteTooLong {
            len: h.note.len(),
            max: MAX_NOTE_LENGTH,
        });
    }
    if h.sender.is_zero() {
        return Err(ValidationError::MissingField("sender"));
    }
    Ok(())
}

/// Full verification of a signed transaction.
pub fn verify_transaction(stx: &SignedTransaction) -> Result<(), VerificationError> {
    check_structure(&stx.txn)?;
    if stx.auth_addr.as_ref() == Some(stx.txn.sender()) {
        return Err(VerificationError::RedundantAuthAddress);
    }

    let authorizer = stx.authorizer();
    match &stx.auth {
        Authorization::Single(sig) => {
            if !authorizer.verify(&stx.txn.bytes_to_sign(), sig) {
                return Err(VerificationError::InvalidSignature { authorizer });
            }
        }
        Authorization::Multisig(msig) => {
            let found = msig.address()?;
            if found != authorizer {
                return Err(VerificationError::MultisigMismatch {
                    expected: authorizer,
                    found,
                });
            }
            if !msig.meets_threshold() {
                return Err(VerificationError::BelowThreshold {
                    populated: msig.populated(),
                    threshold: msig.threshold,
                });
            }
            if !msig.verify(&stx.txn.bytes_to_sign()) {
                return Err(VerificationError::InvalidSubsignature);
            }
        }
        Authorization::Logic(lsig) => {
            if !lsig.verify(&authorizer) {
                return Err(VerificationError::InvalidLogicSig { authorizer });
            }
        }
    }
    Ok(())
}

impl SignedTransaction {
    /// See [`verify_transaction`].
    pub fn verify(&self) -> Result<(), VerificationError> {
        verify_transaction(self)
    }

    /// Check a single signature against an explicit key, ignoring `sgnr`.
    pub fn verify_with(&self, key: &Address) -> bool {
        match &self.auth {
            Authorization::Single(sig) => key.verify(&self.txn.bytes_to_sign(), sig),
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
