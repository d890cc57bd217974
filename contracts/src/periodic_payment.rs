//! # Periodic Payment
//!
//! An escrow the receiver can draw a fixed `amount` from once per `period`
//! rounds. A withdrawal must start on a period boundary
//! (`first_valid % period == 0`), last exactly `withdrawal_window` rounds,
//! and carry the template's lease. The lease is what stops a second
//! withdrawal in the same window: the network rejects two transactions from
//! one sender with the same lease while their windows overlap.
//!
//! After the expiry round the receiver may close out the remainder.

use algo_protocol::crypto::Address;
use algo_protocol::logic::{GlobalField, Op, ProgramBuilder, TxnField};
use algo_protocol::network::SuggestedParams;
use algo_protocol::transaction::{PaymentFields, SignedTransaction, TransactionBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::{
    constraint, escrow_spend, invalid, require_address, require_after_expiry,
    require_before_expiry, require_fee_within, require_lease, require_max_fee, require_positive,
    Template, PAY_TYPE, TEMPLATE_VERSION,
};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodicPaymentParams {
    pub receiver: Address,
    pub amount: u64,
    /// Rounds each withdrawal stays valid for. At most `period`.
    pub withdrawal_window: u64,
    pub period: u64,
    pub expiry_round: u64,
    pub max_fee: u64,
    pub lease: [u8; 32],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodicPayment {
    params: PeriodicPaymentParams,
    program: Vec<u8>,
}

impl PeriodicPayment {
    pub fn new(params: PeriodicPaymentParams) -> Result<Self> {
        require_address("receiver", &params.receiver)?;
        require_positive("amount", params.amount)?;
        require_positive("period", params.period)?;
        require_positive("withdrawal window", params.withdrawal_window)?;
        if params.withdrawal_window > params.period {
            return Err(invalid(format!(
                "withdrawal window {} is longer than the period {}",
                params.withdrawal_window, params.period
            )));
        }
        require_positive("expiry round", params.expiry_round)?;
        require_max_fee(params.max_fee)?;
        require_lease(&params.lease)?;

        let program = compile(&params)?;
        let template = Self { params, program };
        debug!(
            escrow = %template.address(),
            period = template.params.period,
            window = template.params.withdrawal_window,
            "built periodic payment template"
        );
        Ok(template)
    }

    pub fn params(&self) -> &PeriodicPaymentParams {
        &self.params
    }

    /// The withdrawal for the `period_index`-th period:
    /// `first = index · period`, `last = first + window`.
    ///
    /// Fee and genesis come from `params`; its round window is ignored.
    pub fn withdrawal_transaction(
        &self,
        period_index: u64,
        params: &SuggestedParams,
    ) -> Result<SignedTransaction> {
        let first = period_index
            .checked_mul(self.params.period)
            .ok_or_else(|| constraint(format!("period index {period_index} is out of range")))?;
        self.withdrawal_transaction_at(first, params)
    }

    /// The withdrawal whose window starts at `first_valid`, which must be a
    /// period boundary.
    pub fn withdrawal_transaction_at(
        &self,
        first_valid: u64,
        params: &SuggestedParams,
    ) -> Result<SignedTransaction> {
        if first_valid % self.params.period != 0 {
            return Err(constraint(format!(
                "round {first_valid} is not a multiple of the period {}",
                self.params.period
            )));
        }
        let last_valid = first_valid
            .checked_add(self.params.withdrawal_window)
            .ok_or_else(|| constraint(format!("window from {first_valid} overflows")))?;
        require_before_expiry(last_valid, self.params.expiry_round)?;

        let txn = TransactionBuilder::from_params(self.address(), params)
            .validity(first_valid, last_valid)
            .lease(self.params.lease)
            .payment(PaymentFields::new(self.params.receiver, self.params.amount))
            .build()?;
        require_fee_within(&txn, self.params.max_fee)?;
        debug!(escrow = %self.address(), first_valid, last_valid, "built periodic withdrawal");
        escrow_spend(self, txn, Vec::new())
    }

    /// Close the remainder to the receiver after expiry.
    pub fn close_transaction(&self, params: &SuggestedParams) -> Result<SignedTransaction> {
        require_after_expiry(params.first_valid, self.params.expiry_round)?;
        let txn = TransactionBuilder::from_params(self.address(), params)
            .payment(PaymentFields::new(Address::ZERO, 0).close_remainder_to(self.params.receiver))
            .build()?;
        require_fee_within(&txn, self.params.max_fee)?;
        escrow_spend(self, txn, Vec::new())
    }
}

impl Template for PeriodicPayment {
    fn program(&self) -> &[u8] {
        &self.program
    }
}

fn compile(p: &PeriodicPaymentParams) -> Result<Vec<u8>> {
    let program = ProgramBuilder::new(TEMPLATE_VERSION)
        .txn_eq_int(TxnField::TypeEnum, PAY_TYPE)
        .txn(TxnField::Fee)
        .int(p.max_fee)
        .op(Op::Le)
        .op(Op::And)
        .txn_is_zero_address(TxnField::RekeyTo)
        .op(Op::And)
        .global(GlobalField::GroupSize)
        .int(1)
        .op(Op::Eq)
        .op(Op::And)
        .txn(TxnField::CloseRemainderTo)
        .global(GlobalField::ZeroAddress)
        .op(Op::Eq)
        .bz("close")
        .txn(TxnField::FirstValid)
        .int(p.period)
        .op(Op::Mod)
        .int(0)
        .op(Op::Eq)
        .op(Op::And)
        .txn(TxnField::LastValid)
        .int(p.withdrawal_window)
        .txn(TxnField::FirstValid)
        .op(Op::Add)
        .op(Op::Eq)
        .op(Op::And)
        .txn(TxnField::Lease)
        .byte(&p.lease)
        .op(Op::Eq)
        .op(Op::And)
        .txn_eq_addr(TxnField::Receiver, &p.receiver)
        .op(Op::And)
        .txn_eq_int(TxnField::Amount, p.amount)
        .op(Op::And)
        .txn(TxnField::LastValid)
        .int(p.expiry_round)
        .op(Op::Le)
        .op(Op::And)
        .b("done")
        .label("close")
        .txn_eq_addr(TxnField::CloseRemainderTo, &p.receiver)
        .op(Op::And)
        .txn(TxnField::Receiver)
        .global(GlobalField::ZeroAddress)
        .op(Op::Eq)
        .op(Op::And)
        .txn_eq_int(TxnField::Amount, 0)
        .op(Op::And)
        .txn(TxnField::FirstValid)
        .int(p.expiry_round)
        .op(Op::Gt)
        .op(Op::And)
        .label("done")
        .assemble()?;
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> PeriodicPaymentParams {
        PeriodicPaymentParams {
            receiver: Address::new([4; 32]),
            amount: 500_000,
            withdrawal_window: 100,
            period: 1_000,
            expiry_round: 100_000,
            max_fee: 2_000,
            lease: [9; 32],
        }
    }

    #[test]
    fn window_longer_than_period_rejected() {
        let bad = PeriodicPaymentParams {
            withdrawal_window: 1_001,
            ..params()
        };
        assert!(matches!(
            PeriodicPayment::new(bad),
            Err(crate::TemplateError::InvalidParameter(_))
        ));
    }

    #[test]
    fn zero_lease_rejected() {
        let bad = PeriodicPaymentParams {
            lease: [0; 32],
            ..params()
        };
        assert!(PeriodicPayment::new(bad).is_err());
    }

    #[test]
    fn lease_is_part_of_the_address() {
        let a = PeriodicPayment::new(params()).unwrap();
        let b = PeriodicPayment::new(PeriodicPaymentParams {
            lease: [8; 32],
            ..params()
        })
        .unwrap();
        assert_ne!(a.address(), b.address());
    }
}
