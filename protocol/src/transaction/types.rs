//! Core transaction value types: the type tag, the shared header and one
//! explicit field struct per transaction variant.
//!
//! Each struct knows how to write itself into a [`MapBuilder`] and read
//! itself back out of a [`MapReader`]; [`super::builder::Transaction`]
//! stitches the header and the variant together into one flat map.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::crypto::Address;
use crate::encoding::{MapBuilder, MapReader};
use crate::error::EncodingError;

// ---------------------------------------------------------------------------
// TransactionType
// ---------------------------------------------------------------------------

/// Discriminant carried in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Payment,
    KeyRegistration,
    AssetConfig,
    AssetTransfer,
    AssetFreeze,
}

impl TransactionType {
    /// Wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Payment => "pay",
            TransactionType::KeyRegistration => "keyreg",
            TransactionType::AssetConfig => "acfg",
            TransactionType::AssetTransfer => "axfer",
            TransactionType::AssetFreeze => "afrz",
        }
    }

    /// Numeric form exposed to logic programs through `TypeEnum`.
    pub fn type_enum(&self) -> u64 {
        match self {
            TransactionType::Payment => 1,
            TransactionType::KeyRegistration => 2,
            TransactionType::AssetConfig => 3,
            TransactionType::AssetTransfer => 4,
            TransactionType::AssetFreeze => 5,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pay" => Ok(TransactionType::Payment),
            "keyreg" => Ok(TransactionType::KeyRegistration),
            "acfg" => Ok(TransactionType::AssetConfig),
            "axfer" => Ok(TransactionType::AssetTransfer),
            "afrz" => Ok(TransactionType::AssetFreeze),
            other => Err(EncodingError::Malformed(format!(
                "unknown transaction type {other:?}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Fields common to every transaction type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub sender: Address,
    /// Final fee in micro-units.
    pub fee: u64,
    pub first_valid: u64,
    pub last_valid: u64,
    pub genesis_id: String,
    pub genesis_hash: Option<[u8; 32]>,
    pub note: Vec<u8>,
    /// Mutual exclusion token: two transactions from the same sender with
    /// the same lease cannot both be confirmed while either is valid.
    pub lease: Option<[u8; 32]>,
    pub group: Option<[u8; 32]>,
    pub rekey_to: Option<Address>,
}

impl Header {
    pub(crate) fn write(&self, map: MapBuilder) -> MapBuilder {
        map.uint("fee", self.fee)
            .uint("fv", self.first_valid)
            .string("gen", &self.genesis_id)
            .opt_digest("gh", self.genesis_hash.as_ref())
            .opt_digest("grp", self.group.as_ref())
            .uint("lv", self.last_valid)
            .opt_digest("lx", self.lease.as_ref())
            .bytes("note", &self.note)
            .opt_address("rekey", self.rekey_to.as_ref())
            .address("snd", &self.sender)
    }

    pub(crate) fn read(r: &mut MapReader<'_>) -> Result<Self, EncodingError> {
        Ok(Self {
            sender: r.address("snd")?,
            fee: r.uint("fee")?,
            first_valid: r.uint("fv")?,
            last_valid: r.uint("lv")?,
            genesis_id: r.string("gen")?,
            genesis_hash: r.digest("gh")?,
            note: r.bytes("note")?,
            lease: r.digest("lx")?,
            group: r.digest("grp")?,
            rekey_to: r.opt_address("rekey")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Variant fields
// ---------------------------------------------------------------------------

/// Moves micro-units from sender to receiver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentFields {
    pub receiver: Address,
    pub amount: u64,
    /// Closing sends the sender's entire remaining balance here and
    /// removes the sender account.
    pub close_remainder_to: Option<Address>,
}

impl PaymentFields {
    pub fn new(receiver: Address, amount: u64) -> Self {
        Self {
            receiver,
            amount,
            close_remainder_to: None,
        }
    }

    pub fn close_remainder_to(mut self, to: Address) -> Self {
        self.close_remainder_to = Some(to);
        self
    }

    fn write(&self, map: MapBuilder) -> MapBuilder {
        map.uint("amt", self.amount)
            .opt_address("close", self.close_remainder_to.as_ref())
            .address("rcv", &self.receiver)
    }

    fn read(r: &mut MapReader<'_>) -> Result<Self, EncodingError> {
        Ok(Self {
            receiver: r.address("rcv")?,
            amount: r.uint("amt")?,
            close_remainder_to: r.opt_address("close")?,
        })
    }
}

/// Registers (or, with `non_participation`, retires) participation keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRegFields {
    pub vote_pk: [u8; 32],
    pub selection_pk: [u8; 32],
    pub vote_first: u64,
    pub vote_last: u64,
    pub vote_key_dilution: u64,
    pub non_participation: bool,
}

impl KeyRegFields {
    fn write(&self, map: MapBuilder) -> MapBuilder {
        map.boolean("nonpart", self.non_participation)
            .digest("selkey", &self.selection_pk)
            .uint("votefst", self.vote_first)
            .digest("votekey", &self.vote_pk)
            .uint("votekd", self.vote_key_dilution)
            .uint("votelst", self.vote_last)
    }

    fn read(r: &mut MapReader<'_>) -> Result<Self, EncodingError> {
        Ok(Self {
            vote_pk: r.digest("votekey")?.unwrap_or_default(),
            selection_pk: r.digest("selkey")?.unwrap_or_default(),
            vote_first: r.uint("votefst")?,
            vote_last: r.uint("votelst")?,
            vote_key_dilution: r.uint("votekd")?,
            non_participation: r.boolean("nonpart")?,
        })
    }
}

/// Parameters of an asset, as set on creation or reconfiguration.
///
/// `default_frozen` is carried exactly as configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetParams {
    pub total: u64,
    pub decimals: u32,
    pub default_frozen: bool,
    pub unit_name: String,
    pub asset_name: String,
    pub url: String,
    pub metadata_hash: Option<[u8; 32]>,
    pub manager: Option<Address>,
    pub reserve: Option<Address>,
    pub freeze: Option<Address>,
    pub clawback: Option<Address>,
}

impl AssetParams {
    /// The first role address that is unset, if any.
    pub fn first_empty_role(&self) -> Option<&'static str> {
        [
            ("manager", &self.manager),
            ("reserve", &self.reserve),
            ("freeze", &self.freeze),
            ("clawback", &self.clawback),
        ]
        .into_iter()
        .find(|(_, addr)| addr.map_or(true, |a| a.is_zero()))
        .map(|(role, _)| role)
    }

    fn to_msgpack(&self) -> rmpv::Value {
        MapBuilder::new()
            .opt_digest("am", self.metadata_hash.as_ref())
            .string("an", &self.asset_name)
            .string("au", &self.url)
            .opt_address("c", self.clawback.as_ref())
            .uint("dc", u64::from(self.decimals))
            .boolean("df", self.default_frozen)
            .opt_address("f", self.freeze.as_ref())
            .opt_address("m", self.manager.as_ref())
            .opt_address("r", self.reserve.as_ref())
            .uint("t", self.total)
            .string("un", &self.unit_name)
            .build()
    }

    fn from_msgpack(value: &rmpv::Value) -> Result<Self, EncodingError> {
        let mut r = MapReader::new(value, "apar")?;
        let decimals = r.uint("dc")?;
        let params = Self {
            total: r.uint("t")?,
            decimals: u32::try_from(decimals).map_err(|_| {
                EncodingError::Malformed(format!("decimals {decimals} out of range"))
            })?,
            default_frozen: r.boolean("df")?,
            unit_name: r.string("un")?,
            asset_name: r.string("an")?,
            url: r.string("au")?,
            metadata_hash: r.digest("am")?,
            manager: r.opt_address("m")?,
            reserve: r.opt_address("r")?,
            freeze: r.opt_address("f")?,
            clawback: r.opt_address("c")?,
        };
        r.finish()?;
        Ok(params)
    }
}

/// Creates (index 0), reconfigures, or destroys (no params) an asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetConfigFields {
    pub asset_index: u64,
    pub params: Option<AssetParams>,
}

impl AssetConfigFields {
    pub fn create(params: AssetParams) -> Self {
        Self {
            asset_index: 0,
            params: Some(params),
        }
    }

    pub fn reconfigure(asset_index: u64, params: AssetParams) -> Self {
        Self {
            asset_index,
            params: Some(params),
        }
    }

    pub fn destroy(asset_index: u64) -> Self {
        Self {
            asset_index,
            params: None,
        }
    }

    fn write(&self, map: MapBuilder) -> MapBuilder {
        let map = map.uint("caid", self.asset_index);
        match &self.params {
            Some(p) => map.value("apar", p.to_msgpack()),
            None => map,
        }
    }

    fn read(r: &mut MapReader<'_>) -> Result<Self, EncodingError> {
        Ok(Self {
            asset_index: r.uint("caid")?,
            params: r.take("apar").map(AssetParams::from_msgpack).transpose()?,
        })
    }
}

/// Moves asset units. A zero-amount transfer to oneself is an opt-in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetTransferFields {
    pub asset_index: u64,
    pub amount: u64,
    pub receiver: Address,
    pub close_to: Option<Address>,
    /// Set only by the clawback account: the holder the units are taken from.
    pub revocation_target: Option<Address>,
}

impl AssetTransferFields {
    pub fn new(asset_index: u64, receiver: Address, amount: u64) -> Self {
        Self {
            asset_index,
            amount,
            receiver,
            ..Self::default()
        }
    }

    pub fn close_to(mut self, to: Address) -> Self {
        self.close_to = Some(to);
        self
    }

    pub fn revocation_target(mut self, target: Address) -> Self {
        self.revocation_target = Some(target);
        self
    }

    fn write(&self, map: MapBuilder) -> MapBuilder {
        map.uint("aamt", self.amount)
            .opt_address("aclose", self.close_to.as_ref())
            .address("arcv", &self.receiver)
            .opt_address("asnd", self.revocation_target.as_ref())
            .uint("xaid", self.asset_index)
    }

    fn read(r: &mut MapReader<'_>) -> Result<Self, EncodingError> {
        Ok(Self {
            asset_index: r.uint("xaid")?,
            amount: r.uint("aamt")?,
            receiver: r.address("arcv")?,
            close_to: r.opt_address("aclose")?,
            revocation_target: r.opt_address("asnd")?,
        })
    }
}

/// Freezes or unfreezes one account's holding of an asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFreezeFields {
    pub asset_index: u64,
    pub target: Address,
    pub frozen: bool,
}

impl AssetFreezeFields {
    fn write(&self, map: MapBuilder) -> MapBuilder {
        map.address("fadd", &self.target)
            .uint("faid", self.asset_index)
            .boolean("afrz", self.frozen)
    }

    fn read(r: &mut MapReader<'_>) -> Result<Self, EncodingError> {
        Ok(Self {
            asset_index: r.uint("faid")?,
            target: r.address("fadd")?,
            frozen: r.boolean("afrz")?,
        })
    }
}

// ---------------------------------------------------------------------------
// TxnKind
// ---------------------------------------------------------------------------

/// The variant-specific half of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TxnKind {
    Payment(PaymentFields),
    KeyRegistration(KeyRegFields),
    AssetConfig(AssetConfigFields),
    AssetTransfer(AssetTransferFields),
    AssetFreeze(AssetFreezeFields),
}

impl TxnKind {
    pub fn tx_type(&self) -> TransactionType {
        match self {
            TxnKind::Payment(_) => TransactionType::Payment,
            TxnKind::KeyRegistration(_) => TransactionType::KeyRegistration,
            TxnKind::AssetConfig(_) => TransactionType::AssetConfig,
            TxnKind::AssetTransfer(_) => TransactionType::AssetTransfer,
            TxnKind::AssetFreeze(_) => TransactionType::AssetFreeze,
        }
    }

    pub(crate) fn write(&self, map: MapBuilder) -> MapBuilder {
        let map = map.string("type", self.tx_type().as_str());
        match self {
            TxnKind::Payment(f) => f.write(map),
            TxnKind::KeyRegistration(f) => f.write(map),
            TxnKind::AssetConfig(f) => f.write(map),
            TxnKind::AssetTransfer(f) => f.write(map),
            TxnKind::AssetFreeze(f) => f.write(map),
        }
    }

    pub(crate) fn read(r: &mut MapReader<'_>) -> Result<Self, EncodingError> {
        let tag = r.string("type")?;
        if tag.is_empty() {
            return Err(EncodingError::MissingField("type"));
        }
        Ok(match tag.parse::<TransactionType>()? {
            TransactionType::Payment => TxnKind::Payment(PaymentFields::read(r)?),
            TransactionType::KeyRegistration => TxnKind::KeyRegistration(KeyRegFields::read(r)?),
            TransactionType::AssetConfig => TxnKind::AssetConfig(AssetConfigFields::read(r)?),
            TransactionType::AssetTransfer => {
                TxnKind::AssetTransfer(AssetTransferFields::read(r)?)
            }
            TransactionType::AssetFreeze => TxnKind::AssetFreeze(AssetFreezeFields::read(r)?),
        })
    }
}
