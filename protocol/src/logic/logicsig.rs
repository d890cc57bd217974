//! Logic signatures: a program, its arguments and an optional delegation.
//!
//! Two modes:
//!
//! - **Escrow.** No signature. The program's own address
//!   (`SHA-512/256("Program" ‖ program)`) is the account, and the program
//!   alone decides what may leave it.
//! - **Delegated.** An account signs `"Program" ‖ program` (singly or as a
//!   multisig) and thereby lets anyone spend from it under the program's
//!   rules.
//!
//! Arguments are not covered by the delegation signature; they are supplied
//! at spend time.

use rmpv::Value;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::check::check_program;
use crate::config::PROGRAM_TAG;
use crate::crypto::{tagged_hash, tagged_message, Address, Keypair, Signature};
use crate::encoding::msgpack::{as_bin, type_error};
use crate::encoding::{CanonicalDecode, CanonicalEncode, MapBuilder, MapReader};
use crate::error::{CryptoError, EncodingError, ValidationError};
use crate::transaction::multisig::{Multisig, MultisigSignature};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicSig {
    program: Vec<u8>,
    args: Vec<Vec<u8>>,
    sig: Option<Signature>,
    msig: Option<MultisigSignature>,
}

impl LogicSig {
    /// An unsigned (escrow) logic signature. The program is checked first.
    pub fn new(program: Vec<u8>, args: Vec<Vec<u8>>) -> Result<Self, ValidationError> {
        check_program(&program, &args)?;
        Ok(Self {
            program,
            args,
            sig: None,
            msig: None,
        })
    }

    pub fn program(&self) -> &[u8] {
        &self.program
    }

    pub fn args(&self) -> &[Vec<u8>] {
        &self.args
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.sig.as_ref()
    }

    pub fn multisig(&self) -> Option<&MultisigSignature> {
        self.msig.as_ref()
    }

    /// A copy with different arguments. The delegation, if any, is kept.
    pub fn with_args(&self, args: Vec<Vec<u8>>) -> Result<Self, ValidationError> {
        check_program(&self.program, &args)?;
        Ok(Self {
            args,
            ..self.clone()
        })
    }

    /// The escrow account controlled by this program.
    pub fn address(&self) -> Address {
        program_address(&self.program)
    }

    pub fn bytes_to_sign(&self) -> Vec<u8> {
        tagged_message(PROGRAM_TAG, &self.program)
    }

    pub fn is_delegated(&self) -> bool {
        self.sig.is_some() || self.msig.is_some()
    }

    /// Delegate `keypair`'s account to this program.
    pub fn sign(&self, keypair: &Keypair) -> Self {
        debug!(program = %self.address(), signer = %keypair.address(), "delegated logic signature");
        Self {
            sig: Some(keypair.sign(&self.bytes_to_sign())),
            msig: None,
            ..self.clone()
        }
    }

    /// Start a multisig delegation with `keypair`'s slot filled.
    pub fn sign_multisig(&self, msig: &Multisig, keypair: &Keypair) -> Result<Self, ValidationError> {
        let slots = msig
            .empty_signature()
            .sign(&self.bytes_to_sign(), keypair)?;
        Ok(Self {
            sig: None,
            msig: Some(slots),
            ..self.clone()
        })
    }

    /// Add `keypair`'s signature to an existing multisig delegation.
    pub fn append_to_multisig(&self, keypair: &Keypair) -> Result<Self, ValidationError> {
        let slots = self
            .msig
            .as_ref()
            .ok_or(ValidationError::MissingField("msig"))?
            .sign(&self.bytes_to_sign(), keypair)?;
        Ok(Self {
            msig: Some(slots),
            ..self.clone()
        })
    }

    /// Whether this logic signature may authorize spends from `account`.
    pub fn verify(&self, account: &Address) -> bool {
        if check_program(&self.program, &self.args).is_err() {
            return false;
        }
        let message = self.bytes_to_sign();
        match (&self.sig, &self.msig) {
            (None, None) => *account == self.address(),
            (Some(sig), None) => account.verify(&message, sig),
            (None, Some(msig)) => {
                msig.address().map_or(false, |a| a == *account) && msig.verify(&message)
            }
            (Some(_), Some(_)) => false,
        }
    }

    /// The account that authorizes a transaction from `sender` with this
    /// logic signature.
    pub(crate) fn authorizer(&self, sender: &Address) -> Result<Address, CryptoError> {
        let account = match (&self.sig, &self.msig) {
            (None, None) => self.address(),
            (Some(_), None) => *sender,
            (None, Some(msig)) => msig.address().map_err(|_| CryptoError::VerificationFailed)?,
            (Some(_), Some(_)) => return Err(CryptoError::VerificationFailed),
        };
        if self.verify(&account) {
            Ok(account)
        } else {
            Err(CryptoError::VerificationFailed)
        }
    }
}

/// `SHA-512/256("Program" ‖ program)`.
pub fn program_address(program: &[u8]) -> Address {
    Address::new(tagged_hash(PROGRAM_TAG, program))
}

impl CanonicalEncode for LogicSig {
    fn to_msgpack(&self) -> Value {
        let args = self
            .args
            .iter()
            .map(|a| Value::Binary(a.clone()))
            .collect();
        let map = MapBuilder::new()
            .value("arg", Value::Array(args))
            .bytes("l", &self.program);
        let map = match &self.msig {
            Some(msig) => map.value("msig", msig.to_msgpack()),
            None => map,
        };
        match &self.sig {
            Some(sig) => map.bytes("sig", sig.as_bytes()),
            None => map,
        }
        .build()
    }
}

impl CanonicalDecode for LogicSig {
    fn from_msgpack(value: &Value) -> Result<Self, EncodingError> {
        let mut r = MapReader::new(value, "lsig")?;
        let program = r.bytes("l")?;
        if program.is_empty() {
            return Err(EncodingError::MissingField("l"));
        }
        let args = match r.take("arg") {
            None => Vec::new(),
            Some(v) => v
                .as_array()
                .ok_or_else(|| type_error("arg", "array"))?
                .iter()
                .map(|a| as_bin("arg", a).map(<[u8]>::to_vec))
                .collect::<Result<_, _>>()?,
        };
        let sig = match r.take("sig") {
            None => None,
            Some(v) => {
                let raw = as_bin("sig", v)?;
                Some(Signature::try_from_slice(raw).map_err(|_| EncodingError::InvalidLength {
                    field: "sig".to_string(),
                    expected: 64,
                    actual: raw.len(),
                })?)
            }
        };
        let msig = r
            .take("msig")
            .map(MultisigSignature::from_msgpack)
            .transpose()?;
        r.finish()?;
        Ok(Self {
            program,
            args,
            sig,
            msig,
        })
    }
}
