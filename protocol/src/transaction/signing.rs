//! Transaction signing.
//!
//! Signing is a separate step from building because the keypair may not
//! be available at construction time (a remote key store, a co-signer on
//! another machine). Every signature covers [`Transaction::bytes_to_sign`],
//! i.e. `"TX" ‖ canonical(txn)`.
//!
//! A [`SignedTransaction`] carries exactly one [`Authorization`]. When the
//! account that authorized it is not the sender (the sender was rekeyed),
//! the authorizing address travels alongside in `sgnr`.

use rmpv::Value;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::builder::Transaction;
use super::multisig::MultisigSignature;
use crate::crypto::{Address, Keypair, Signature};
use crate::encoding::msgpack::as_bin;
use crate::encoding::{CanonicalDecode, CanonicalEncode, MapBuilder, MapReader};
use crate::error::{CryptoError, EncodingError};
use crate::logic::LogicSig;

/// How a transaction is authorized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Authorization {
    Single(Signature),
    Multisig(MultisigSignature),
    Logic(LogicSig),
}

/// A transaction plus its authorization. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub txn: Transaction,
    pub auth: Authorization,
    /// Authorizing address, present only when it differs from the sender.
    pub auth_addr: Option<Address>,
}

impl Transaction {
    /// Sign with a single key. If the key does not belong to the sender,
    /// its address is recorded as the authorizer.
    pub fn sign(&self, keypair: &Keypair) -> SignedTransaction {
        let signature = keypair.sign(&self.bytes_to_sign());
        let signer = keypair.address();
        debug!(txid = %self.id_string(), signer = %signer, "signed transaction");
        SignedTransaction {
            txn: self.clone(),
            auth: Authorization::Single(signature),
            auth_addr: (signer != *self.sender()).then_some(signer),
        }
    }
}

/// Free-function form of [`Transaction::sign`].
pub fn sign_transaction(txn: &Transaction, keypair: &Keypair) -> SignedTransaction {
    txn.sign(keypair)
}

impl SignedTransaction {
    /// Authorize `txn` with a logic signature.
    ///
    /// Without a delegating signature the program itself is the authorizer
    /// (an escrow). With one, the signature must verify for the sender, or
    /// for the multisig it names.
    pub fn with_logic_sig(txn: Transaction, lsig: LogicSig) -> Result<Self, CryptoError> {
        let authorizer = lsig.authorizer(txn.sender())?;
        debug!(
            txid = %txn.id_string(),
            program = %lsig.address(),
            delegated = lsig.is_delegated(),
            "attached logic signature"
        );
        Ok(Self {
            auth_addr: (authorizer != *txn.sender()).then_some(authorizer),
            txn,
            auth: Authorization::Logic(lsig),
        })
    }

    pub fn id(&self) -> [u8; 32] {
        self.txn.id()
    }

    pub fn id_string(&self) -> String {
        self.txn.id_string()
    }

    /// The account whose authority this transaction carries.
    pub fn authorizer(&self) -> Address {
        self.auth_addr.unwrap_or(*self.txn.sender())
    }

    pub fn signature(&self) -> Option<&Signature> {
        match &self.auth {
            Authorization::Single(sig) => Some(sig),
            _ => None,
        }
    }
}

impl CanonicalEncode for SignedTransaction {
    fn to_msgpack(&self) -> Value {
        let map = match &self.auth {
            Authorization::Single(sig) => MapBuilder::new().bytes("sig", sig.as_bytes()),
            Authorization::Multisig(msig) => MapBuilder::new().value("msig", msig.to_msgpack()),
            Authorization::Logic(lsig) => MapBuilder::new().value("lsig", lsig.to_msgpack()),
        };
        map.opt_address("sgnr", self.auth_addr.as_ref())
            .value("txn", self.txn.to_msgpack())
            .build()
    }
}

impl CanonicalDecode for SignedTransaction {
    fn from_msgpack(value: &Value) -> Result<Self, EncodingError> {
        let mut r = MapReader::new(value, "stxn")?;
        let txn = r
            .take("txn")
            .ok_or(EncodingError::MissingField("txn"))
            .and_then(Transaction::from_msgpack)?;
        let auth_addr = r.opt_address("sgnr")?;

        let sig = r.take("sig");
        let msig = r.take("msig");
        let lsig = r.take("lsig");
        let auth = match (sig, msig, lsig) {
            (Some(v), None, None) => {
                let raw = as_bin("sig", v)?;
                Authorization::Single(Signature::try_from_slice(raw).map_err(|_| {
                    EncodingError::InvalidLength {
                        field: "sig".to_string(),
                        expected: 64,
                        actual: raw.len(),
                    }
                })?)
            }
            (None, Some(v), None) => Authorization::Multisig(MultisigSignature::from_msgpack(v)?),
            (None, None, Some(v)) => Authorization::Logic(LogicSig::from_msgpack(v)?),
            (None, None, None) => return Err(EncodingError::MissingField("sig")),
            _ => {
                return Err(EncodingError::Malformed(
                    "more than one authorization present".to_string(),
                ))
            }
        };
        r.finish()?;
        Ok(Self {
            txn,
            auth,
            auth_addr,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding;
    use crate::transaction::{PaymentFields, TransactionBuilder};

    fn txn_from(sender: Address) -> Transaction {
        TransactionBuilder::new(sender)
            .fee(1_000)
            .flat_fee(true)
            .validity(100, 1_100)
            .genesis_hash([3; 32])
            .payment(PaymentFields::new(Address::new([2; 32]), 5_000))
            .build()
            .unwrap()
    }

    #[test]
    fn sign_by_sender_has_no_authorizer() {
        let kp = Keypair::from_seed(&[1; 32]);
        let stx = txn_from(kp.address()).sign(&kp);
        assert_eq!(stx.auth_addr, None);
        assert_eq!(stx.authorizer(), kp.address());
        assert!(stx.signature().is_some());
    }

    #[test]
    fn sign_by_other_key_records_authorizer() {
        let kp = Keypair::from_seed(&[1; 32]);
        let sender = Address::new([5; 32]);
        let stx = sign_transaction(&txn_from(sender), &kp);
        assert_eq!(stx.auth_addr, Some(kp.address()));
        assert_eq!(stx.authorizer(), kp.address());
    }

    #[test]
    fn signing_does_not_change_id() {
        let kp = Keypair::from_seed(&[1; 32]);
        let txn = txn_from(kp.address());
        assert_eq!(txn.sign(&kp).id(), txn.id());
    }

    #[test]
    fn encoding_roundtrip() {
        let kp = Keypair::from_seed(&[1; 32]);
        let stx = txn_from(Address::new([5; 32])).sign(&kp);
        let bytes = encoding::encode(&stx);
        let back: SignedTransaction = encoding::decode(&bytes).unwrap();
        assert_eq!(back, stx);
        assert_eq!(encoding::encode(&back), bytes);
    }

    #[test]
    fn decode_requires_an_authorization() {
        let txn = txn_from(Address::new([5; 32]));
        let bare = MapBuilder::new().value("txn", txn.to_msgpack()).build();
        assert_eq!(
            SignedTransaction::from_msgpack(&bare),
            Err(EncodingError::MissingField("sig"))
        );
    }

    #[test]
    fn decode_rejects_two_authorizations() {
        let kp = Keypair::from_seed(&[1; 32]);
        let stx = txn_from(kp.address()).sign(&kp);
        let mut value = stx.to_msgpack();
        if let Value::Map(entries) = &mut value {
            entries.push((Value::from("lsig"), MapBuilder::new().bytes("l", &[1]).build()));
        }
        assert!(matches!(
            SignedTransaction::from_msgpack(&value),
            Err(EncodingError::Malformed(_))
        ));
    }

    #[test]
    fn decode_rejects_short_signature() {
        let txn = txn_from(Address::new([5; 32]));
        let value = MapBuilder::new()
            .bytes("sig", &[1; 10])
            .value("txn", txn.to_msgpack())
            .build();
        assert!(matches!(
            SignedTransaction::from_msgpack(&value),
            Err(EncodingError::InvalidLength { expected: 64, actual: 10, .. })
        ));
    }
}
