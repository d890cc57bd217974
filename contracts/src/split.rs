//! # Ratio Split
//!
//! An escrow that pays out in pairs: every spend is an atomic group of two
//! payments from the escrow, the first to `receiver_1` and the second to
//! `receiver_2`, whose amounts stand exactly in the ratio
//! `ratio_n : ratio_d` and each reach `min_pay`. After the expiry round
//! the owner may close the escrow instead.
//!
//! The program checks `a · d == b · n` on the two amounts, so a total is
//! only splittable when it is a multiple of `(n + d) / gcd(n, d)`.
//! [`Split::split_transactions`] refuses anything else;
//! [`Split::split_transactions_rounded`] spends the largest splittable
//! amount below the total and leaves the rest in the escrow.

use algo_protocol::crypto::Address;
use algo_protocol::logic::{GlobalField, Op, ProgramBuilder, TxnField};
use algo_protocol::network::SuggestedParams;
use algo_protocol::transaction::{
    assign_group_id, PaymentFields, SignedTransaction, Transaction, TransactionBuilder,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::{
    constraint, escrow_spend, gcd, invalid, require_address, require_after_expiry,
    require_before_expiry, require_fee_within, require_max_fee, require_positive, Template,
    PAY_TYPE, TEMPLATE_VERSION,
};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitParams {
    /// Receives the remainder after expiry.
    pub owner: Address,
    pub receiver_1: Address,
    pub receiver_2: Address,
    pub ratio_n: u64,
    pub ratio_d: u64,
    /// Floor for each of the two payments.
    pub min_pay: u64,
    pub expiry_round: u64,
    pub max_fee: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    params: SplitParams,
    program: Vec<u8>,
}

impl Split {
    pub fn new(params: SplitParams) -> Result<Self> {
        require_address("owner", &params.owner)?;
        require_address("receiver_1", &params.receiver_1)?;
        require_address("receiver_2", &params.receiver_2)?;
        require_positive("ratio numerator", params.ratio_n)?;
        require_positive("ratio denominator", params.ratio_d)?;
        require_positive("expiry round", params.expiry_round)?;
        require_max_fee(params.max_fee)?;
        if params.ratio_n.checked_add(params.ratio_d).is_none() {
            return Err(invalid("ratio terms overflow when summed"));
        }

        let program = compile(&params)?;
        let split = Self { params, program };
        debug!(
            escrow = %split.address(),
            ratio = %format!("{}:{}", split.params.ratio_n, split.params.ratio_d),
            "built split template"
        );
        Ok(split)
    }

    pub fn params(&self) -> &SplitParams {
        &self.params
    }

    /// The two amounts `total` splits into, or why it can't be split.
    pub fn split_amounts(&self, total: u64) -> Result<(u64, u64)> {
        let min_pay = self.params.min_pay;
        let (n, d) = self.reduced_ratio();
        let parts = n + d;
        if total % parts != 0 {
            return Err(constraint(format!(
                "total {total} is not a multiple of {parts} and cannot be split {}:{} exactly",
                self.params.ratio_n, self.params.ratio_d
            )));
        }
        let unit = total / parts;
        let (a, b) = (unit * n, unit * d);
        if a < min_pay || b < min_pay {
            return Err(constraint(format!(
                "split {a} + {b} leaves a payment below the minimum {min_pay}"
            )));
        }
        // The program multiplies each amount by the other ratio term.
        if a.checked_mul(self.params.ratio_d).is_none()
            || b.checked_mul(self.params.ratio_n).is_none()
        {
            return Err(constraint(format!("total {total} overflows the ratio check")));
        }
        Ok((a, b))
    }

    /// The largest amount not above `total` that splits exactly.
    pub fn largest_splittable(&self, total: u64) -> u64 {
        let (n, d) = self.reduced_ratio();
        total - total % (n + d)
    }

    fn reduced_ratio(&self) -> (u64, u64) {
        let g = gcd(self.params.ratio_n, self.params.ratio_d);
        // The sum was checked at construction; reduced terms only get smaller.
        (self.params.ratio_n / g, self.params.ratio_d / g)
    }

    /// The grouped pair of payments that moves `total` out of the escrow.
    pub fn split_transactions(
        &self,
        total: u64,
        params: &SuggestedParams,
    ) -> Result<Vec<SignedTransaction>> {
        let (a, b) = self.split_amounts(total)?;
        require_before_expiry(params.last_valid, self.params.expiry_round)?;

        let pay = |to: Address, amount: u64| -> Result<Transaction> {
            let txn = TransactionBuilder::from_params(self.address(), params)
                .payment(PaymentFields::new(to, amount))
                .build()?;
            require_fee_within(&txn, self.params.max_fee)?;
            Ok(txn)
        };
        let txns = [pay(self.params.receiver_1, a)?, pay(self.params.receiver_2, b)?];

        let grouped = assign_group_id(&txns)?;
        debug!(escrow = %self.address(), total, a, b, "built split group");
        grouped
            .into_iter()
            .map(|txn| escrow_spend(self, txn, Vec::new()))
            .collect()
    }

    /// Like [`Split::split_transactions`], but rounds `total` down to the
    /// nearest exact split. Returns the group and the amount left behind.
    pub fn split_transactions_rounded(
        &self,
        total: u64,
        params: &SuggestedParams,
    ) -> Result<(Vec<SignedTransaction>, u64)> {
        let spent = self.largest_splittable(total);
        let group = self.split_transactions(spent, params)?;
        Ok((group, total - spent))
    }

    /// Close the escrow to the owner after expiry.
    pub fn close_transaction(&self, params: &SuggestedParams) -> Result<SignedTransaction> {
        require_after_expiry(params.first_valid, self.params.expiry_round)?;
        let txn = TransactionBuilder::from_params(self.address(), params)
            .payment(PaymentFields::new(Address::ZERO, 0).close_remainder_to(self.params.owner))
            .build()?;
        require_fee_within(&txn, self.params.max_fee)?;
        escrow_spend(self, txn, Vec::new())
    }
}

impl Template for Split {
    fn program(&self) -> &[u8] {
        &self.program
    }
}

fn compile(p: &SplitParams) -> Result<Vec<u8>> {
    let program = ProgramBuilder::new(TEMPLATE_VERSION)
        .txn_eq_int(TxnField::TypeEnum, PAY_TYPE)
        .txn(TxnField::Fee)
        .int(p.max_fee)
        .op(Op::Le)
        .op(Op::And)
        .txn_is_zero_address(TxnField::RekeyTo)
        .op(Op::And)
        .global(GlobalField::GroupSize)
        .int(2)
        .op(Op::Eq)
        .bnz("split")
        // single transaction: close to the owner after expiry
        .txn_eq_addr(TxnField::CloseRemainderTo, &p.owner)
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
        .b("done")
        .label("split")
        .gtxn(0, TxnField::Sender)
        .gtxn(1, TxnField::Sender)
        .op(Op::Eq)
        .op(Op::And)
        .txn(TxnField::CloseRemainderTo)
        .global(GlobalField::ZeroAddress)
        .op(Op::Eq)
        .op(Op::And)
        .gtxn(0, TxnField::Receiver)
        .addr(&p.receiver_1)
        .op(Op::Eq)
        .op(Op::And)
        .gtxn(1, TxnField::Receiver)
        .addr(&p.receiver_2)
        .op(Op::Eq)
        .op(Op::And)
        .gtxn(0, TxnField::Amount)
        .int(p.ratio_d)
        .op(Op::Mul)
        .gtxn(1, TxnField::Amount)
        .int(p.ratio_n)
        .op(Op::Mul)
        .op(Op::Eq)
        .op(Op::And)
        .gtxn(0, TxnField::Amount)
        .int(p.min_pay)
        .op(Op::Ge)
        .op(Op::And)
        .gtxn(1, TxnField::Amount)
        .int(p.min_pay)
        .op(Op::Ge)
        .op(Op::And)
        .txn(TxnField::LastValid)
        .int(p.expiry_round)
        .op(Op::Le)
        .op(Op::And)
        .label("done")
        .assemble()?;
    Ok(program)
}
