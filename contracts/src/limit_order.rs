//! # Limit Order
//!
//! An escrow holding units of one asset, selling them for the native
//! currency at no less than `ratio_n / ratio_d` micro-units per asset unit.
//!
//! Every escrow leg is a transfer of the order's asset that neither rekeys
//! the escrow nor claws back from another account. On top of that the
//! program accepts three shapes:
//!
//! - **Swap**: a group of two, `[buyer pays owner, escrow sends asset to
//!   buyer]`, with `payment · d ≥ assets · n`, at least `min_trade` units,
//!   and the escrow's leg valid no later than the expiry round.
//! - **Opt-in**: a group of two led by any transaction from the owner,
//!   followed by a zero-amount transfer of the asset to the escrow itself.
//!   Requiring the owner's signature keeps third parties from replaying it.
//! - **Reclaim**: after expiry, a lone zero-amount transfer to the owner
//!   that closes the asset holding out to the owner.

use algo_protocol::crypto::{Address, Keypair};
use algo_protocol::logic::{GlobalField, Op, ProgramBuilder, TxnField};
use algo_protocol::network::SuggestedParams;
use algo_protocol::transaction::{
    assign_group_id, AssetTransferFields, PaymentFields, SignedTransaction, TransactionBuilder,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::{
    constraint, escrow_spend, invalid, require_address, require_after_expiry, require_before_expiry,
    require_fee_within, require_max_fee, require_positive, Template, AXFER_TYPE, PAY_TYPE,
    TEMPLATE_VERSION,
};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrderParams {
    /// Receives the payments and, after expiry, the unsold asset.
    pub owner: Address,
    pub asset_id: u64,
    pub ratio_n: u64,
    pub ratio_d: u64,
    /// Smallest number of asset units a single swap may move.
    pub min_trade: u64,
    pub expiry_round: u64,
    pub max_fee: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitOrder {
    params: LimitOrderParams,
    program: Vec<u8>,
}

impl LimitOrder {
    pub fn new(params: LimitOrderParams) -> Result<Self> {
        require_address("owner", &params.owner)?;
        require_positive("asset id", params.asset_id)?;
        require_positive("ratio numerator", params.ratio_n)?;
        require_positive("ratio denominator", params.ratio_d)?;
        require_positive("expiry round", params.expiry_round)?;
        require_max_fee(params.max_fee)?;

        let program = compile(&params)?;
        let order = Self { params, program };
        debug!(
            escrow = %order.address(),
            asset = order.params.asset_id,
            "built limit order template"
        );
        Ok(order)
    }

    pub fn params(&self) -> &LimitOrderParams {
        &self.params
    }

    /// Whether `payment_amount` for `asset_amount` units meets the
    /// template's price and size bounds.
    pub fn check_trade(&self, asset_amount: u64, payment_amount: u64) -> Result<()> {
        let LimitOrderParams {
            ratio_n: n,
            ratio_d: d,
            min_trade,
            ..
        } = self.params;
        if asset_amount == 0 || asset_amount < min_trade {
            return Err(constraint(format!(
                "trade of {asset_amount} units is below the minimum {min_trade}"
            )));
        }
        let (paid, owed) = match (payment_amount.checked_mul(d), asset_amount.checked_mul(n)) {
            (Some(paid), Some(owed)) => (paid, owed),
            _ => return Err(constraint("trade amounts overflow the price check")),
        };
        if paid < owed {
            return Err(constraint(format!(
                "{payment_amount} for {asset_amount} units is worse than {n}/{d} per unit"
            )));
        }
        Ok(())
    }

    /// The swap group: `buyer` pays the owner, the escrow sends the asset.
    ///
    /// Only the buyer's leg is signed with `buyer`; the escrow's leg carries
    /// the template's logic signature.
    pub fn swap_transactions(
        &self,
        asset_amount: u64,
        payment_amount: u64,
        buyer: &Keypair,
        params: &SuggestedParams,
    ) -> Result<Vec<SignedTransaction>> {
        self.check_trade(asset_amount, payment_amount)?;
        require_before_expiry(params.last_valid, self.params.expiry_round)?;

        let payment = TransactionBuilder::from_params(buyer.address(), params)
            .payment(PaymentFields::new(self.params.owner, payment_amount))
            .build()?;
        let transfer = TransactionBuilder::from_params(self.address(), params)
            .asset_transfer(AssetTransferFields::new(
                self.params.asset_id,
                buyer.address(),
                asset_amount,
            ))
            .build()?;
        require_fee_within(&transfer, self.params.max_fee)?;

        let grouped = assign_group_id(&[payment, transfer])?;
        debug!(
            escrow = %self.address(),
            buyer = %buyer.address(),
            asset_amount,
            payment_amount,
            "built limit order swap"
        );
        Ok(vec![
            grouped[0].sign(buyer),
            escrow_spend(self, grouped[1].clone(), Vec::new())?,
        ])
    }

    /// Opt the escrow into the asset, grouped behind a payment from the
    /// owner so nobody else can spend the escrow's balance on opt-in fees.
    ///
    /// `funding` is paid from the owner to the escrow and may be zero.
    pub fn opt_in_transactions(
        &self,
        owner: &Keypair,
        funding: u64,
        params: &SuggestedParams,
    ) -> Result<Vec<SignedTransaction>> {
        if owner.address() != self.params.owner {
            return Err(invalid(format!(
                "{} is not the order's owner",
                owner.address()
            )));
        }
        require_before_expiry(params.last_valid, self.params.expiry_round)?;

        let payment = TransactionBuilder::from_params(owner.address(), params)
            .payment(PaymentFields::new(self.address(), funding))
            .build()?;
        let opt_in = TransactionBuilder::from_params(self.address(), params)
            .asset_transfer(AssetTransferFields::new(
                self.params.asset_id,
                self.address(),
                0,
            ))
            .build()?;
        require_fee_within(&opt_in, self.params.max_fee)?;

        let grouped = assign_group_id(&[payment, opt_in])?;
        Ok(vec![
            grouped[0].sign(owner),
            escrow_spend(self, grouped[1].clone(), Vec::new())?,
        ])
    }

    /// After expiry, close the asset holding out to the owner.
    pub fn reclaim_transaction(&self, params: &SuggestedParams) -> Result<SignedTransaction> {
        require_after_expiry(params.first_valid, self.params.expiry_round)?;
        let txn = TransactionBuilder::from_params(self.address(), params)
            .asset_transfer(
                AssetTransferFields::new(self.params.asset_id, self.params.owner, 0)
                    .close_to(self.params.owner),
            )
            .build()?;
        require_fee_within(&txn, self.params.max_fee)?;
        escrow_spend(self, txn, Vec::new())
    }
}

impl Template for LimitOrder {
    fn program(&self) -> &[u8] {
        &self.program
    }
}

fn compile(p: &LimitOrderParams) -> Result<Vec<u8>> {
    let program = ProgramBuilder::new(TEMPLATE_VERSION)
        .txn(TxnField::Fee)
        .int(p.max_fee)
        .op(Op::Le)
        .txn_is_zero_address(TxnField::RekeyTo)
        .op(Op::And)
        .txn_eq_int(TxnField::TypeEnum, AXFER_TYPE)
        .op(Op::And)
        .txn_eq_int(TxnField::XferAsset, p.asset_id)
        .op(Op::And)
        .txn_is_zero_address(TxnField::AssetSender)
        .op(Op::And)
        .global(GlobalField::GroupSize)
        .int(2)
        .op(Op::Eq)
        .bnz("pair")
        // lone transfer: reclaim to the owner after expiry
        .global(GlobalField::GroupSize)
        .int(1)
        .op(Op::Eq)
        .op(Op::And)
        .txn_eq_addr(TxnField::AssetCloseTo, &p.owner)
        .op(Op::And)
        .txn_eq_addr(TxnField::AssetReceiver, &p.owner)
        .op(Op::And)
        .txn_eq_int(TxnField::AssetAmount, 0)
        .op(Op::And)
        .txn(TxnField::FirstValid)
        .int(p.expiry_round)
        .op(Op::Gt)
        .op(Op::And)
        .b("done")
        .label("pair")
        .txn_eq_int(TxnField::GroupIndex, 1)
        .op(Op::And)
        .txn_is_zero_address(TxnField::AssetCloseTo)
        .op(Op::And)
        .txn(TxnField::LastValid)
        .int(p.expiry_round)
        .op(Op::Le)
        .op(Op::And)
        // a pair led by the owner is an opt-in the owner authorized
        .gtxn(0, TxnField::Sender)
        .addr(&p.owner)
        .op(Op::Eq)
        .bnz("opt_in")
        .gtxn(0, TxnField::TypeEnum)
        .int(PAY_TYPE)
        .op(Op::Eq)
        .op(Op::And)
        .gtxn(0, TxnField::Receiver)
        .addr(&p.owner)
        .op(Op::Eq)
        .op(Op::And)
        .gtxn(0, TxnField::CloseRemainderTo)
        .global(GlobalField::ZeroAddress)
        .op(Op::Eq)
        .op(Op::And)
        .gtxn(0, TxnField::RekeyTo)
        .global(GlobalField::ZeroAddress)
        .op(Op::Eq)
        .op(Op::And)
        .txn(TxnField::AssetReceiver)
        .gtxn(0, TxnField::Sender)
        .op(Op::Eq)
        .op(Op::And)
        .txn(TxnField::AssetAmount)
        .int(p.min_trade)
        .op(Op::Ge)
        .op(Op::And)
        .gtxn(0, TxnField::Amount)
        .int(p.ratio_d)
        .op(Op::Mul)
        .txn(TxnField::AssetAmount)
        .int(p.ratio_n)
        .op(Op::Mul)
        .op(Op::Ge)
        .op(Op::And)
        .b("done")
        .label("opt_in")
        .txn_eq_int(TxnField::AssetAmount, 0)
        .op(Op::And)
        .txn(TxnField::AssetReceiver)
        .txn(TxnField::Sender)
        .op(Op::Eq)
        .op(Op::And)
        .label("done")
        .assemble()?;
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(min_trade: u64) -> LimitOrder {
        LimitOrder::new(LimitOrderParams {
            owner: Address::new([1; 32]),
            asset_id: 42,
            ratio_n: 3,
            ratio_d: 2,
            min_trade,
            expiry_round: 10_000,
            max_fee: 2_000,
        })
        .unwrap()
    }

    #[test]
    fn price_bound_is_inclusive() {
        // 3/2 micro-units per unit: 10 units cost at least 15.
        assert!(order(1).check_trade(10, 15).is_ok());
        assert!(order(1).check_trade(10, 14).is_err());
        assert!(order(1).check_trade(10, 1_000).is_ok());
    }

    #[test]
    fn minimum_trade_enforced() {
        assert!(order(5).check_trade(4, 1_000).is_err());
        assert!(order(5).check_trade(5, 1_000).is_ok());
        assert!(order(0).check_trade(0, 1_000).is_err());
    }

    #[test]
    fn overflow_is_a_constraint_not_a_panic() {
        assert!(matches!(
            order(1).check_trade(u64::MAX, u64::MAX),
            Err(crate::TemplateError::Constraint(_))
        ));
    }

    #[test]
    fn zero_asset_rejected() {
        let params = LimitOrderParams {
            owner: Address::new([1; 32]),
            asset_id: 0,
            ratio_n: 1,
            ratio_d: 1,
            min_trade: 0,
            expiry_round: 1,
            max_fee: 1_000,
        };
        assert!(LimitOrder::new(params).is_err());
    }
}
