//! Integration tests for the limit order contract.

mod support;

use algo_protocol::crypto::{Address, Keypair};
use algo_protocol::transaction::{
    assign_group_id, AssetTransferFields, Authorization, PaymentFields, SignedTransaction,
    TransactionBuilder, TxnKind,
};
use algo_templates::{LimitOrder, LimitOrderParams, Template, TemplateError};
use support::{accepted, params, program_accepts, with_rekey};

const ASSET: u64 = 31_566_704;
const EXPIRY: u64 = 8_000;

fn owner() -> Address {
    Address::new([0x0d; 32])
}

/// Sells at no less than 3 micro-units per 2 asset units, 10 units minimum.
fn order() -> LimitOrder {
    LimitOrder::new(LimitOrderParams {
        owner: owner(),
        asset_id: ASSET,
        ratio_n: 3,
        ratio_d: 2,
        min_trade: 10,
        expiry_round: EXPIRY,
        max_fee: 2_000,
    })
    .unwrap()
}

#[test]
fn swap_at_the_limit_is_accepted() {
    let template = order();
    let buyer = Keypair::from_seed(&[0x42; 32]);
    let group = template
        .swap_transactions(10, 15, &buyer, &params(1_000, 2_000))
        .unwrap();

    assert_eq!(group.len(), 2);
    assert!(matches!(group[0].auth, Authorization::Single(_)));
    assert!(matches!(group[1].auth, Authorization::Logic(_)));
    match &group[1].txn.kind {
        TxnKind::AssetTransfer(a) => {
            assert_eq!(a.asset_index, ASSET);
            assert_eq!(a.receiver, buyer.address());
            assert_eq!(a.amount, 10);
        }
        other => panic!("unexpected kind {other:?}"),
    }
    assert!(accepted(&group).unwrap());
}

#[test]
fn worse_price_is_refused() {
    let buyer = Keypair::from_seed(&[0x42; 32]);
    assert!(matches!(
        order().swap_transactions(10, 14, &buyer, &params(1_000, 2_000)),
        Err(TemplateError::Constraint(_))
    ));
}

#[test]
fn worse_price_fails_the_program() {
    let template = order();
    let buyer = Keypair::from_seed(&[0x42; 32]);
    let window = params(1_000, 2_000);
    let payment = TransactionBuilder::from_params(buyer.address(), &window)
        .payment(PaymentFields::new(owner(), 14))
        .build()
        .unwrap();
    let transfer = TransactionBuilder::from_params(template.address(), &window)
        .asset_transfer(AssetTransferFields::new(ASSET, buyer.address(), 10))
        .build()
        .unwrap();
    let grouped = assign_group_id(&[payment, transfer]).unwrap();
    let group = vec![
        grouped[0].sign(&buyer),
        SignedTransaction::with_logic_sig(grouped[1].clone(), template.logic_sig(vec![]).unwrap())
            .unwrap(),
    ];
    assert!(!accepted(&group).unwrap());
}

#[test]
fn small_trade_is_refused() {
    let buyer = Keypair::from_seed(&[0x42; 32]);
    assert!(matches!(
        order().swap_transactions(9, 1_000, &buyer, &params(1_000, 2_000)),
        Err(TemplateError::Constraint(_))
    ));
}

#[test]
fn swap_past_expiry_is_refused() {
    let buyer = Keypair::from_seed(&[0x42; 32]);
    assert!(matches!(
        order().swap_transactions(10, 15, &buyer, &params(7_000, EXPIRY + 1)),
        Err(TemplateError::Constraint(_))
    ));
}

#[test]
fn owner_opts_the_escrow_in() {
    let template = order();
    let owner_key = Keypair::from_seed(&[0x0d; 32]);
    let template = LimitOrder::new(LimitOrderParams {
        owner: owner_key.address(),
        ..template.params().clone()
    })
    .unwrap();

    let group = template
        .opt_in_transactions(&owner_key, 200_000, &params(1_000, 2_000))
        .unwrap();
    assert_eq!(group[0].txn.sender(), &owner_key.address());
    match &group[1].txn.kind {
        TxnKind::AssetTransfer(a) => {
            assert_eq!(a.receiver, template.address());
            assert_eq!(a.amount, 0);
        }
        other => panic!("unexpected kind {other:?}"),
    }
    assert!(accepted(&group).unwrap());
}

#[test]
fn only_the_owner_can_opt_in() {
    let stranger = Keypair::from_seed(&[0x43; 32]);
    assert!(matches!(
        order().opt_in_transactions(&stranger, 0, &params(1_000, 2_000)),
        Err(TemplateError::InvalidParameter(_))
    ));
}

#[test]
fn opt_in_led_by_a_stranger_fails_the_program() {
    let template = order();
    let stranger = Keypair::from_seed(&[0x43; 32]);
    let window = params(1_000, 2_000);
    let nudge = TransactionBuilder::from_params(stranger.address(), &window)
        .payment(PaymentFields::new(template.address(), 0))
        .build()
        .unwrap();
    let opt_in = TransactionBuilder::from_params(template.address(), &window)
        .asset_transfer(AssetTransferFields::new(ASSET, template.address(), 0))
        .build()
        .unwrap();
    let grouped = assign_group_id(&[nudge, opt_in]).unwrap();
    let group = vec![
        grouped[0].sign(&stranger),
        SignedTransaction::with_logic_sig(grouped[1].clone(), template.logic_sig(vec![]).unwrap())
            .unwrap(),
    ];
    assert!(!accepted(&group).unwrap());
}

#[test]
fn lone_opt_in_fails_the_program() {
    let template = order();
    let opt_in = TransactionBuilder::from_params(template.address(), &params(1_000, 2_000))
        .asset_transfer(AssetTransferFields::new(ASSET, template.address(), 0))
        .build()
        .unwrap();
    let stx =
        SignedTransaction::with_logic_sig(opt_in, template.logic_sig(vec![]).unwrap()).unwrap();
    assert!(!accepted(&[stx]).unwrap());
}

#[test]
fn owner_reclaims_after_expiry() {
    let template = order();
    assert!(template.reclaim_transaction(&params(EXPIRY, EXPIRY + 10)).is_err());

    let stx = template
        .reclaim_transaction(&params(EXPIRY + 1, EXPIRY + 10))
        .unwrap();
    assert!(accepted(&[stx]).unwrap());
}

#[test]
fn reclaim_cannot_send_the_asset_elsewhere() {
    let template = order();
    let thief = Address::new([0x66; 32]);
    let window = params(EXPIRY + 1_000, EXPIRY + 1_500);
    let spend = |fields: AssetTransferFields| {
        let txn = TransactionBuilder::from_params(template.address(), &window)
            .asset_transfer(fields)
            .build()
            .unwrap();
        SignedTransaction::with_logic_sig(txn, template.logic_sig(vec![]).unwrap()).unwrap()
    };

    let to_thief = spend(AssetTransferFields::new(ASSET, thief, 1_000_000).close_to(owner()));
    assert!(!accepted(&[to_thief]).unwrap());
    let drained_to_owner = spend(AssetTransferFields::new(ASSET, owner(), 1_000).close_to(owner()));
    assert!(!accepted(&[drained_to_owner]).unwrap());
    let zero_to_thief = spend(AssetTransferFields::new(ASSET, thief, 0).close_to(owner()));
    assert!(!accepted(&[zero_to_thief]).unwrap());
    let honest = spend(AssetTransferFields::new(ASSET, owner(), 0).close_to(owner()));
    assert!(accepted(&[honest]).unwrap());
}

#[test]
fn rekeying_the_escrow_fails_every_branch() {
    let template = order();
    let attacker = Address::new([0x66; 32]);
    let buyer = Keypair::from_seed(&[0x42; 32]);

    let swap = template
        .swap_transactions(10, 15, &buyer, &params(1_000, 2_000))
        .unwrap();
    let txns: Vec<_> = swap.iter().map(|s| s.txn.clone()).collect();
    assert!(program_accepts(&swap, &txns, 1).unwrap());
    assert!(!program_accepts(&swap, &with_rekey(&swap, 1, attacker), 1).unwrap());
    assert!(!program_accepts(&swap, &with_rekey(&swap, 0, attacker), 1).unwrap());

    let reclaim = [template
        .reclaim_transaction(&params(EXPIRY + 1, EXPIRY + 10))
        .unwrap()];
    assert!(!program_accepts(&reclaim, &with_rekey(&reclaim, 0, attacker), 0).unwrap());
}
