//! Pieces every template shares: the [`Template`] trait, parameter checks
//! and the round-window guards helpers apply before building anything.

use algo_protocol::config::MIN_TXN_FEE;
use algo_protocol::crypto::Address;
use algo_protocol::logic::{program_address, LogicSig};
use algo_protocol::transaction::{SignedTransaction, Transaction};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{Result, TemplateError};

/// Program version every template is assembled for.
pub(crate) const TEMPLATE_VERSION: u64 = 2;

/// `TypeEnum` values as the programs compare them.
pub(crate) const PAY_TYPE: u64 = 1;
pub(crate) const AXFER_TYPE: u64 = 4;

/// A compiled predicate and the account it controls.
pub trait Template {
    /// The assembled program bytes.
    fn program(&self) -> &[u8];

    /// The escrow account: `SHA-512/256("Program" ‖ program)`.
    fn address(&self) -> Address {
        program_address(self.program())
    }

    /// An unsigned logic signature over this template's program.
    fn logic_sig(&self, args: Vec<Vec<u8>>) -> Result<LogicSig> {
        Ok(LogicSig::new(self.program().to_vec(), args)?)
    }
}

/// A fresh random lease, for templates that bind one.
pub fn random_lease() -> [u8; 32] {
    let mut lease = [0u8; 32];
    OsRng.fill_bytes(&mut lease);
    lease
}

pub(crate) fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

pub(crate) fn constraint(msg: impl Into<String>) -> TemplateError {
    TemplateError::Constraint(msg.into())
}

pub(crate) fn invalid(msg: impl Into<String>) -> TemplateError {
    TemplateError::InvalidParameter(msg.into())
}

pub(crate) fn require_address(role: &str, addr: &Address) -> Result<()> {
    if addr.is_zero() {
        return Err(invalid(format!("{role} address is empty")));
    }
    Ok(())
}

pub(crate) fn require_positive(name: &str, n: u64) -> Result<()> {
    if n == 0 {
        return Err(invalid(format!("{name} must be positive")));
    }
    Ok(())
}

/// A cap below the network minimum would reject every transaction.
pub(crate) fn require_max_fee(max_fee: u64) -> Result<()> {
    if max_fee < MIN_TXN_FEE {
        return Err(invalid(format!(
            "max fee {max_fee} is below the minimum fee {MIN_TXN_FEE}"
        )));
    }
    Ok(())
}

pub(crate) fn require_lease(lease: &[u8; 32]) -> Result<()> {
    if lease.iter().all(|b| *b == 0) {
        return Err(invalid("lease must not be all zeros"));
    }
    Ok(())
}

/// The transaction must stop being valid at or before `expiry`.
pub(crate) fn require_before_expiry(last_valid: u64, expiry: u64) -> Result<()> {
    if last_valid > expiry {
        return Err(constraint(format!(
            "last valid round {last_valid} is past expiry round {expiry}"
        )));
    }
    Ok(())
}

/// The transaction must only become valid after `expiry`.
pub(crate) fn require_after_expiry(first_valid: u64, expiry: u64) -> Result<()> {
    if first_valid <= expiry {
        return Err(constraint(format!(
            "first valid round {first_valid} is not after expiry round {expiry}"
        )));
    }
    Ok(())
}

pub(crate) fn require_fee_within(txn: &Transaction, max_fee: u64) -> Result<()> {
    if txn.fee() > max_fee {
        return Err(constraint(format!(
            "fee {} exceeds the template's max fee {max_fee}",
            txn.fee()
        )));
    }
    Ok(())
}

/// Authorize `txn` from the escrow with the template's own program.
pub(crate) fn escrow_spend(
    template: &impl Template,
    txn: Transaction,
    args: Vec<Vec<u8>>,
) -> Result<SignedTransaction> {
    Ok(SignedTransaction::with_logic_sig(txn, template.logic_sig(args)?)?)
}
