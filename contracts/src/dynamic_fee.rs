//! # Dynamic Fee
//!
//! Lets an account sign a payment now and have someone else pay its fee
//! later. The account delegates to a program that pins everything about
//! the payment except its fee: receiver, amount, close-to, exact round
//! window and lease. The program also insists on a group of two where the
//! first transaction reimburses the sender exactly the second's fee.
//!
//! Flow:
//!
//! 1. The sender calls [`DynamicFee::sign_dynamic_fee`] and hands the
//!    unsigned payment and delegated logic signature to the fee payer.
//! 2. The fee payer calls [`DynamicFee::fee_transactions`], which reprices
//!    the payment, builds the reimbursement, groups the two and signs their
//!    own leg.

use algo_protocol::crypto::{Address, Keypair};
use algo_protocol::logic::{GlobalField, LogicSig, Op, ProgramBuilder, TxnField};
use algo_protocol::transaction::{
    assign_group_id, PaymentFields, SignedTransaction, Transaction, TransactionBuilder, TxnKind,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::{
    constraint, invalid, require_address, require_lease, Template, PAY_TYPE, TEMPLATE_VERSION,
};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicFeeParams {
    pub receiver: Address,
    pub amount: u64,
    pub close_remainder_to: Option<Address>,
    pub first_valid: u64,
    pub last_valid: u64,
    pub lease: [u8; 32],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicFee {
    params: DynamicFeeParams,
    program: Vec<u8>,
}

impl DynamicFee {
    pub fn new(params: DynamicFeeParams) -> Result<Self> {
        require_address("receiver", &params.receiver)?;
        if params.last_valid < params.first_valid {
            return Err(invalid(format!(
                "last valid round {} is before first valid round {}",
                params.last_valid, params.first_valid
            )));
        }
        require_lease(&params.lease)?;

        let program = compile(&params)?;
        let template = Self { params, program };
        debug!(program = %template.address(), "built dynamic fee template");
        Ok(template)
    }

    pub fn params(&self) -> &DynamicFeeParams {
        &self.params
    }

    fn payment_fields(&self) -> PaymentFields {
        PaymentFields {
            receiver: self.params.receiver,
            amount: self.params.amount,
            close_remainder_to: self.params.close_remainder_to,
        }
    }

    /// The sender's half: the payment (fee still at the minimum) and the
    /// logic signature delegating `sender`'s account to this program.
    pub fn sign_dynamic_fee(
        &self,
        sender: &Keypair,
        genesis_hash: [u8; 32],
    ) -> Result<(Transaction, LogicSig)> {
        let txn = TransactionBuilder::new(sender.address())
            .validity(self.params.first_valid, self.params.last_valid)
            .genesis_hash(genesis_hash)
            .lease(self.params.lease)
            .payment(self.payment_fields())
            .build()?;
        let lsig = self.logic_sig(Vec::new())?.sign(sender);
        debug!(txid = %txn.id_string(), sender = %sender.address(), "signed dynamic fee delegation");
        Ok((txn, lsig))
    }

    /// The fee payer's half: `[payer reimburses sender, delegated payment]`.
    ///
    /// `fee` is a per-byte rate applied to both transactions. The round
    /// window and genesis hash must match the ones the sender signed for.
    #[allow(clippy::too_many_arguments)]
    pub fn fee_transactions(
        &self,
        txn: &Transaction,
        lsig: &LogicSig,
        payer: &Keypair,
        fee: u64,
        first_valid: u64,
        last_valid: u64,
        genesis_hash: [u8; 32],
    ) -> Result<Vec<SignedTransaction>> {
        let header = &txn.header;
        if (header.first_valid, header.last_valid) != (first_valid, last_valid)
            || (first_valid, last_valid) != (self.params.first_valid, self.params.last_valid)
        {
            return Err(constraint(format!(
                "window {first_valid}..={last_valid} does not match the delegated payment's {}..={}",
                header.first_valid, header.last_valid
            )));
        }
        if header.genesis_hash != Some(genesis_hash) {
            return Err(constraint("genesis hash does not match the delegated payment"));
        }
        if header.lease != Some(self.params.lease) {
            return Err(constraint("lease does not match the template"));
        }
        match &txn.kind {
            TxnKind::Payment(fields) if *fields == self.payment_fields() => {}
            _ => return Err(constraint("transaction is not this template's payment")),
        }
        if lsig.program() != self.program() || !lsig.is_delegated() {
            return Err(constraint("logic signature is not a delegation of this template"));
        }

        let delegated = TransactionBuilder::new(*txn.sender())
            .fee(fee)
            .validity(first_valid, last_valid)
            .genesis_id(&header.genesis_id)
            .genesis_hash(genesis_hash)
            .note(header.note.clone())
            .lease(self.params.lease)
            .payment(self.payment_fields())
            .build()?;
        let reimbursement = TransactionBuilder::new(payer.address())
            .fee(fee)
            .validity(first_valid, last_valid)
            .genesis_id(&header.genesis_id)
            .genesis_hash(genesis_hash)
            .payment(PaymentFields::new(*txn.sender(), delegated.fee()))
            .build()?;

        let grouped = assign_group_id(&[reimbursement, delegated])?;
        debug!(
            payer = %payer.address(),
            sender = %txn.sender(),
            fee = grouped[1].fee(),
            "built dynamic fee group"
        );
        Ok(vec![
            grouped[0].sign(payer),
            SignedTransaction::with_logic_sig(grouped[1].clone(), lsig.clone())?,
        ])
    }
}

impl Template for DynamicFee {
    fn program(&self) -> &[u8] {
        &self.program
    }
}

fn compile(p: &DynamicFeeParams) -> Result<Vec<u8>> {
    let builder = ProgramBuilder::new(TEMPLATE_VERSION)
        .global(GlobalField::GroupSize)
        .int(2)
        .op(Op::Eq)
        .gtxn(0, TxnField::TypeEnum)
        .int(PAY_TYPE)
        .op(Op::Eq)
        .op(Op::And)
        .gtxn(0, TxnField::Receiver)
        .txn(TxnField::Sender)
        .op(Op::Eq)
        .op(Op::And)
        .gtxn(0, TxnField::Amount)
        .txn(TxnField::Fee)
        .op(Op::Eq)
        .op(Op::And)
        .txn_eq_int(TxnField::GroupIndex, 1)
        .op(Op::And)
        .txn_is_zero_address(TxnField::RekeyTo)
        .op(Op::And)
        .txn_eq_int(TxnField::TypeEnum, PAY_TYPE)
        .op(Op::And)
        .txn_eq_addr(TxnField::Receiver, &p.receiver)
        .op(Op::And)
        .txn_eq_int(TxnField::Amount, p.amount)
        .op(Op::And)
        .txn(TxnField::CloseRemainderTo);
    let builder = match &p.close_remainder_to {
        Some(close) => builder.addr(close),
        None => builder.global(GlobalField::ZeroAddress),
    };
    let program = builder
        .op(Op::Eq)
        .op(Op::And)
        .txn_eq_int(TxnField::FirstValid, p.first_valid)
        .op(Op::And)
        .txn_eq_int(TxnField::LastValid, p.last_valid)
        .op(Op::And)
        .txn(TxnField::Lease)
        .byte(&p.lease)
        .op(Op::Eq)
        .op(Op::And)
        .assemble()?;
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> DynamicFeeParams {
        DynamicFeeParams {
            receiver: Address::new([5; 32]),
            amount: 12_345,
            close_remainder_to: None,
            first_valid: 100,
            last_valid: 1_100,
            lease: [6; 32],
        }
    }

    #[test]
    fn close_to_changes_the_program() {
        let plain = DynamicFee::new(params()).unwrap();
        let closing = DynamicFee::new(DynamicFeeParams {
            close_remainder_to: Some(Address::new([7; 32])),
            ..params()
        })
        .unwrap();
        assert_ne!(plain.program(), closing.program());
    }

    #[test]
    fn inverted_window_rejected() {
        let bad = DynamicFeeParams {
            first_valid: 10,
            last_valid: 9,
            ..params()
        };
        assert!(DynamicFee::new(bad).is_err());
    }

    #[test]
    fn delegation_is_signed_by_the_sender() {
        let template = DynamicFee::new(params()).unwrap();
        let sender = Keypair::from_seed(&[1; 32]);
        let (txn, lsig) = template.sign_dynamic_fee(&sender, [3; 32]).unwrap();
        assert_eq!(txn.sender(), &sender.address());
        assert!(lsig.is_delegated());
        assert!(lsig.verify(&sender.address()));
    }
}
