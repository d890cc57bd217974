//! Atomic transaction groups.
//!
//! A group id commits to the ids of its member transactions, in order:
//!
//! ```text
//! group = SHA-512/256("TG" ‖ canonical({"txlist": [id₁, …, idₖ]}))
//! ```
//!
//! Member ids are computed *without* a group field, then every member is
//! stamped with the result. Since the group field feeds the transaction
//! id, grouping must happen before signing.

use rmpv::Value;
use tracing::debug;

use super::builder::Transaction;
use crate::config::{MAX_GROUP_SIZE, TX_GROUP_TAG};
use crate::crypto::{tagged_hash, Address};
use crate::encoding::{self, CanonicalEncode, MapBuilder};
use crate::error::ValidationError;

struct TxGroup<'a>(&'a [[u8; 32]]);

impl CanonicalEncode for TxGroup<'_> {
    fn to_msgpack(&self) -> Value {
        let ids = self.0.iter().map(|id| Value::Binary(id.to_vec())).collect();
        MapBuilder::new().value("txlist", Value::Array(ids)).build()
    }
}

fn check_members(txns: &[Transaction]) -> Result<(), ValidationError> {
    if txns.is_empty() || txns.len() > MAX_GROUP_SIZE {
        return Err(ValidationError::InvalidGroupSize {
            len: txns.len(),
            max: MAX_GROUP_SIZE,
        });
    }
    if let Some(index) = txns.iter().position(|t| t.group().is_some()) {
        return Err(ValidationError::AlreadyGrouped { index });
    }
    Ok(())
}

/// Group id for `txns`, which must not already carry one.
pub fn compute_group_id(txns: &[Transaction]) -> Result<[u8; 32], ValidationError> {
    check_members(txns)?;
    let ids: Vec<[u8; 32]> = txns.iter().map(Transaction::id).collect();
    Ok(tagged_hash(TX_GROUP_TAG, &encoding::encode(&TxGroup(&ids))))
}

/// Copies of `txns`, each stamped with their common group id.
pub fn assign_group_id(txns: &[Transaction]) -> Result<Vec<Transaction>, ValidationError> {
    let gid = compute_group_id(txns)?;
    debug!(members = txns.len(), group = %hex::encode(gid), "assigned group id");
    Ok(txns.iter().map(|t| t.with_group(gid)).collect())
}

/// Like [`assign_group_id`], but only returns the members sent by `sender`.
/// The id is still computed over the whole list.
pub fn assign_group_id_for(
    txns: &[Transaction],
    sender: &Address,
) -> Result<Vec<Transaction>, ValidationError> {
    Ok(assign_group_id(txns)?
        .into_iter()
        .filter(|t| t.sender() == sender)
        .collect())
}
