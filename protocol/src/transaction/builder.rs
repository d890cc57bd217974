//! Transaction construction via the builder pattern.
//!
//! The [`TransactionBuilder`] enforces a disciplined construction flow:
//! set the header, pick exactly one variant, call `.build()`, and get back
//! a validated, unsigned [`Transaction`] with its final fee.
//!
//! The builder does not sign; that happens in [`super::signing`]. This
//! separation keeps construction testable without key material.

use data_encoding::BASE32_NOPAD;
use rmpv::Value;
use serde::{Deserialize, Serialize};

use super::types::{
    AssetConfigFields, AssetFreezeFields, AssetTransferFields, Header, KeyRegFields,
    PaymentFields, TransactionType, TxnKind,
};
use crate::config::{MAX_NOTE_LENGTH, MIN_TXN_FEE, SIGNATURE_LENGTH, TRANSACTION_TAG};
use crate::crypto::{tagged_hash, tagged_message, Address};
use crate::encoding::{self, CanonicalDecode, CanonicalEncode, MapBuilder, MapReader};
use crate::error::{EncodingError, ValidationError};
use crate::network::SuggestedParams;

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// An unsigned transaction: the shared header plus one variant.
///
/// # Identity
///
/// `id = SHA-512/256("TX" ‖ canonical(txn))`. The id covers every field,
/// including the group id, so grouping must happen before signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub header: Header,
    pub kind: TxnKind,
}

impl Transaction {
    pub fn tx_type(&self) -> TransactionType {
        self.kind.tx_type()
    }

    pub fn sender(&self) -> &Address {
        &self.header.sender
    }

    pub fn fee(&self) -> u64 {
        self.header.fee
    }

    pub fn group(&self) -> Option<&[u8; 32]> {
        self.header.group.as_ref()
    }

    /// `"TX" ‖ canonical(txn)`: the exact bytes every signer signs.
    pub fn bytes_to_sign(&self) -> Vec<u8> {
        tagged_message(TRANSACTION_TAG, &encoding::encode(self))
    }

    /// Raw 32-byte transaction id.
    pub fn id(&self) -> [u8; 32] {
        tagged_hash(TRANSACTION_TAG, &encoding::encode(self))
    }

    /// Base32 (no padding) form of [`Transaction::id`], 52 characters.
    pub fn id_string(&self) -> String {
        BASE32_NOPAD.encode(&self.id())
    }

    /// Length of this transaction wrapped as a single-signature signed
    /// transaction. Fee-per-byte pricing is applied to this figure.
    pub fn estimate_size(&self) -> usize {
        let stub = MapBuilder::new()
            .value("sig", Value::Binary(vec![0u8; SIGNATURE_LENGTH]))
            .value("txn", self.to_msgpack())
            .build();
        let mut out = Vec::new();
        encoding::msgpack::write_canonical(&stub, &mut out);
        out.len()
    }

    /// A copy of this transaction stamped with `group`.
    pub fn with_group(&self, group: [u8; 32]) -> Transaction {
        let mut txn = self.clone();
        txn.header.group = Some(group);
        txn
    }
}

impl CanonicalEncode for Transaction {
    fn to_msgpack(&self) -> Value {
        self.kind.write(self.header.write(MapBuilder::new())).build()
    }
}

impl CanonicalDecode for Transaction {
    fn from_msgpack(value: &Value) -> Result<Self, EncodingError> {
        let mut r = MapReader::new(value, "txn")?;
        let header = Header::read(&mut r)?;
        let kind = TxnKind::read(&mut r)?;
        r.finish()?;
        Ok(Transaction { header, kind })
    }
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for unsigned [`Transaction`] instances.
///
/// # Usage
///
/// ```rust,no_run
/// use algo_protocol::crypto::Address;
/// use algo_protocol::transaction::{PaymentFields, TransactionBuilder};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let sender: Address = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAY5HFKQ".parse()?;
/// let txn = TransactionBuilder::new(sender)
///     .fee(1_000)
///     .flat_fee(true)
///     .validity(100, 1_100)
///     .genesis_id("testnet-v1.0")
///     .payment(PaymentFields::new(sender, 5_000))
///     .build()?;
/// # Ok(())
/// # }
/// ```
///
/// # Fees
///
/// With `flat_fee(false)` (the default) the value passed to `fee` is a
/// per-byte rate and the final fee is
/// `max(rate * estimated_size, MIN_TXN_FEE)`. With `flat_fee(true)` it is
/// used verbatim.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    header: Header,
    kind: Option<TxnKind>,
    flat_fee: bool,
    strict_empty_address_check: bool,
}

impl TransactionBuilder {
    /// Creates a builder for a transaction sent by `sender`.
    ///
    /// Defaults: per-byte fee of 0 (which prices at the minimum fee),
    /// strict empty-address checking on.
    pub fn new(sender: Address) -> Self {
        Self {
            header: Header {
                sender,
                ..Header::default()
            },
            kind: None,
            flat_fee: false,
            strict_empty_address_check: true,
        }
    }

    /// Seeds fee, validity window and genesis from a node's suggestion.
    pub fn from_params(sender: Address, params: &SuggestedParams) -> Self {
        let mut builder = Self::new(sender)
            .fee(params.fee)
            .flat_fee(params.flat_fee)
            .validity(params.first_valid, params.last_valid)
            .genesis_id(&params.genesis_id);
        builder.header.genesis_hash = params.genesis_hash;
        builder
    }

    /// Per-byte rate, or the exact fee when `flat_fee` is set.
    pub fn fee(mut self, fee: u64) -> Self {
        self.header.fee = fee;
        self
    }

    pub fn flat_fee(mut self, flat: bool) -> Self {
        self.flat_fee = flat;
        self
    }

    pub fn first_valid(mut self, round: u64) -> Self {
        self.header.first_valid = round;
        self
    }

    pub fn last_valid(mut self, round: u64) -> Self {
        self.header.last_valid = round;
        self
    }

    pub fn validity(self, first: u64, last: u64) -> Self {
        self.first_valid(first).last_valid(last)
    }

    pub fn genesis_id(mut self, id: &str) -> Self {
        self.header.genesis_id = id.to_string();
        self
    }

    pub fn genesis_hash(mut self, hash: [u8; 32]) -> Self {
        self.header.genesis_hash = Some(hash);
        self
    }

    pub fn note(mut self, note: Vec<u8>) -> Self {
        self.header.note = note;
        self
    }

    pub fn lease(mut self, lease: [u8; 32]) -> Self {
        self.header.lease = Some(lease);
        self
    }

    pub fn rekey_to(mut self, to: Address) -> Self {
        self.header.rekey_to = Some(to);
        self
    }

    /// Sets the group id directly. Prefer [`super::group::assign_group_id`].
    pub fn group(mut self, group: [u8; 32]) -> Self {
        self.header.group = Some(group);
        self
    }

    /// Reject asset reconfigurations that leave a role address empty.
    /// An empty role can never be set again once cleared.
    pub fn strict_empty_address_check(mut self, strict: bool) -> Self {
        self.strict_empty_address_check = strict;
        self
    }

    pub fn payment(mut self, fields: PaymentFields) -> Self {
        self.kind = Some(TxnKind::Payment(fields));
        self
    }

    pub fn key_registration(mut self, fields: KeyRegFields) -> Self {
        self.kind = Some(TxnKind::KeyRegistration(fields));
        self
    }

    pub fn asset_config(mut self, fields: AssetConfigFields) -> Self {
        self.kind = Some(TxnKind::AssetConfig(fields));
        self
    }

    pub fn asset_transfer(mut self, fields: AssetTransferFields) -> Self {
        self.kind = Some(TxnKind::AssetTransfer(fields));
        self
    }

    pub fn asset_freeze(mut self, fields: AssetFreezeFields) -> Self {
        self.kind = Some(TxnKind::AssetFreeze(fields));
        self
    }

    /// Validates the fields and computes the final fee.
    pub fn build(self) -> Result<Transaction, ValidationError> {
        let kind = self
            .kind
            .ok_or(ValidationError::MissingField("transaction type"))?;
        let header = self.header;

        if header.sender.is_zero() {
            return Err(ValidationError::MissingField("sender"));
        }
        if header.last_valid < header.first_valid {
            return Err(ValidationError::InvalidValidityWindow {
                first: header.first_valid,
                last: header.last_valid,
            });
        }
        if header.genesis_hash.is_none() && header.genesis_id.is_empty() {
            return Err(ValidationError::MissingGenesis);
        }
        if header.note.len() > MAX_NOTE_LENGTH {
            return Err(ValidationError::NoteTooLong {
                len: header.note.len(),
                max: MAX_NOTE_LENGTH,
            });
        }
        validate_kind(&kind, self.strict_empty_address_check)?;

        let mut txn = Transaction { header, kind };
        if !self.flat_fee {
            // The size estimate is taken with the rate in the fee field;
            // the network prices the same way.
            let rate = txn.header.fee;
            let size = txn.estimate_size() as u64;
            txn.header.fee = rate.saturating_mul(size).max(MIN_TXN_FEE);
        }
        Ok(txn)
    }
}

fn validate_kind(kind: &TxnKind, strict_empty_address_check: bool) -> Result<(), ValidationError> {
    match kind {
        TxnKind::Payment(f) => {
            if f.receiver.is_zero() && f.close_remainder_to.is_none() {
                return Err(ValidationError::MissingField("receiver"));
            }
        }
        TxnKind::KeyRegistration(f) => {
            if f.vote_first > f.vote_last {
                return Err(ValidationError::InvalidField {
                    field: "vote_last",
                    reason: format!("{} is before vote_first {}", f.vote_last, f.vote_first),
                });
            }
        }
        TxnKind::AssetConfig(f) => match &f.params {
            None if f.asset_index == 0 => {
                return Err(ValidationError::MissingField("asset parameters"));
            }
            Some(params) if f.asset_index != 0 && strict_empty_address_check => {
                if let Some(role) = params.first_empty_role() {
                    return Err(ValidationError::EmptyAssetRole {
                        index: f.asset_index,
                        role,
                    });
                }
            }
            _ => {}
        },
        TxnKind::AssetTransfer(f) => {
            if f.asset_index == 0 {
                return Err(ValidationError::InvalidField {
                    field: "asset_index",
                    reason: "asset transfers need a non-zero asset index".to_string(),
                });
            }
        }
        TxnKind::AssetFreeze(f) => {
            if f.asset_index == 0 {
                return Err(ValidationError::InvalidField {
                    field: "asset_index",
                    reason: "asset freezes need a non-zero asset index".to_string(),
                });
            }
            if f.target.is_zero() {
                return Err(ValidationError::MissingField("freeze target"));
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
