//! # Hash Time-Locked Contract
//!
//! An escrow that pays out its whole balance in one of two ways:
//!
//! 1. **Claim**: the receiver closes the account to themselves by revealing
//!    a preimage of the hash image as argument 0, in a transaction that
//!    stops being valid at or before the expiry round.
//! 2. **Refund**: once the expiry round has passed, the owner closes the
//!    account back to themselves. No preimage needed.
//!
//! Either way the transaction is a zero-amount payment to the zero address
//! with a close-to, and its fee is capped by the template.

use algo_protocol::crypto::{keccak256, sha256, Address};
use algo_protocol::logic::{GlobalField, Op, ProgramBuilder, TxnField};
use algo_protocol::network::SuggestedParams;
use algo_protocol::transaction::{PaymentFields, SignedTransaction, TransactionBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::{
    constraint, escrow_spend, invalid, require_address, require_after_expiry,
    require_before_expiry, require_fee_within, require_max_fee, require_positive, Template,
    PAY_TYPE, TEMPLATE_VERSION,
};
use crate::error::Result;

/// Hash function applied to the revealed preimage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashFunction {
    Sha256,
    Keccak256,
}

impl HashFunction {
    pub fn digest(self, preimage: &[u8]) -> [u8; 32] {
        match self {
            HashFunction::Sha256 => sha256(preimage),
            HashFunction::Keccak256 => keccak256(preimage),
        }
    }

    fn op(self) -> Op {
        match self {
            HashFunction::Sha256 => Op::Sha256,
            HashFunction::Keccak256 => Op::Keccak256,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtlcParams {
    /// Refunded after expiry.
    pub owner: Address,
    /// Paid on a valid preimage.
    pub receiver: Address,
    pub hash_function: HashFunction,
    pub hash_image: [u8; 32],
    pub expiry_round: u64,
    pub max_fee: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Htlc {
    params: HtlcParams,
    program: Vec<u8>,
}

impl Htlc {
    pub fn new(params: HtlcParams) -> Result<Self> {
        require_address("owner", &params.owner)?;
        require_address("receiver", &params.receiver)?;
        if params.owner == params.receiver {
            return Err(invalid("owner and receiver must differ"));
        }
        require_positive("expiry round", params.expiry_round)?;
        require_max_fee(params.max_fee)?;

        let program = compile(&params)?;
        let htlc = Self { params, program };
        debug!(escrow = %htlc.address(), expiry = htlc.params.expiry_round, "built htlc template");
        Ok(htlc)
    }

    pub fn params(&self) -> &HtlcParams {
        &self.params
    }

    /// Close the escrow to the receiver, revealing `preimage`.
    pub fn claim_transaction(
        &self,
        preimage: &[u8],
        params: &SuggestedParams,
    ) -> Result<SignedTransaction> {
        if self.params.hash_function.digest(preimage) != self.params.hash_image {
            return Err(constraint("preimage does not hash to the image"));
        }
        require_before_expiry(params.last_valid, self.params.expiry_round)?;
        self.close_to(self.params.receiver, params, vec![preimage.to_vec()])
    }

    /// Close the escrow back to the owner after expiry.
    pub fn refund_transaction(&self, params: &SuggestedParams) -> Result<SignedTransaction> {
        require_after_expiry(params.first_valid, self.params.expiry_round)?;
        self.close_to(self.params.owner, params, Vec::new())
    }

    fn close_to(
        &self,
        to: Address,
        params: &SuggestedParams,
        args: Vec<Vec<u8>>,
    ) -> Result<SignedTransaction> {
        let txn = TransactionBuilder::from_params(self.address(), params)
            .payment(PaymentFields::new(Address::ZERO, 0).close_remainder_to(to))
            .build()?;
        require_fee_within(&txn, self.params.max_fee)?;
        escrow_spend(self, txn, args)
    }
}

impl Template for Htlc {
    fn program(&self) -> &[u8] {
        &self.program
    }
}

fn compile(p: &HtlcParams) -> Result<Vec<u8>> {
    let program = ProgramBuilder::new(TEMPLATE_VERSION)
        .txn(TxnField::Fee)
        .int(p.max_fee)
        .op(Op::Le)
        .txn_eq_int(TxnField::TypeEnum, PAY_TYPE)
        .op(Op::And)
        .txn_is_zero_address(TxnField::RekeyTo)
        .op(Op::And)
        .txn(TxnField::Receiver)
        .global(GlobalField::ZeroAddress)
        .op(Op::Eq)
        .op(Op::And)
        .txn_eq_int(TxnField::Amount, 0)
        .op(Op::And)
        // Closing to the owner selects the refund branch; anything else
        // has to be a claim.
        .txn_eq_addr(TxnField::CloseRemainderTo, &p.owner)
        .bnz("refund")
        .txn_eq_addr(TxnField::CloseRemainderTo, &p.receiver)
        .op(Op::And)
        .arg(0)
        .op(p.hash_function.op())
        .byte(&p.hash_image)
        .op(Op::Eq)
        .op(Op::And)
        .txn(TxnField::LastValid)
        .int(p.expiry_round)
        .op(Op::Le)
        .op(Op::And)
        .b("done")
        .label("refund")
        .txn(TxnField::FirstValid)
        .int(p.expiry_round)
        .op(Op::Gt)
        .op(Op::And)
        .label("done")
        .assemble()?;
    Ok(program)
}
