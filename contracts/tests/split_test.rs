//! Integration tests for the ratio split contract.

mod support;

use algo_protocol::crypto::Address;
use algo_protocol::transaction::{
    assign_group_id, PaymentFields, SignedTransaction, TransactionBuilder, TxnKind,
};
use algo_templates::{Split, SplitParams, Template, TemplateError};
use proptest::prelude::*;
use support::{accepted, params, program_accepts, with_rekey};

const EXPIRY: u64 = 5_000;

fn split(n: u64, d: u64, min_pay: u64) -> Split {
    Split::new(SplitParams {
        owner: Address::new([0x01; 32]),
        receiver_1: Address::new([0x02; 32]),
        receiver_2: Address::new([0x03; 32]),
        ratio_n: n,
        ratio_d: d,
        min_pay,
        expiry_round: EXPIRY,
        max_fee: 2_000,
    })
    .unwrap()
}

fn amount(stx: &SignedTransaction) -> u64 {
    match &stx.txn.kind {
        TxnKind::Payment(p) => p.amount,
        other => panic!("unexpected kind {other:?}"),
    }
}

#[test]
fn split_group_is_accepted() {
    let template = split(30, 100, 100);
    let group = template
        .split_transactions(1_300, &params(100, 1_100))
        .unwrap();

    assert_eq!(group.len(), 2);
    assert_eq!(amount(&group[0]), 300);
    assert_eq!(amount(&group[1]), 1_000);
    assert!(group.iter().all(|s| s.txn.sender() == &template.address()));
    assert!(accepted(&group).unwrap());
}

#[test]
fn unbalanced_pair_fails_the_program() {
    let template = split(30, 100, 100);
    let pay = |to: u8, amount: u64| {
        TransactionBuilder::from_params(template.address(), &params(100, 1_100))
            .payment(PaymentFields::new(Address::new([to; 32]), amount))
            .build()
            .unwrap()
    };
    let grouped = assign_group_id(&[pay(0x02, 301), pay(0x03, 999)]).unwrap();
    let group: Vec<SignedTransaction> = grouped
        .into_iter()
        .map(|t| SignedTransaction::with_logic_sig(t, template.logic_sig(vec![]).unwrap()).unwrap())
        .collect();
    assert!(!accepted(&group).unwrap());
}

#[test]
fn indivisible_total_is_refused() {
    assert!(matches!(
        split(30, 100, 100).split_transactions(1_301, &params(100, 1_100)),
        Err(TemplateError::Constraint(_))
    ));
}

#[test]
fn rounded_split_leaves_the_remainder_behind() {
    let template = split(30, 100, 100);
    let (group, left) = template
        .split_transactions_rounded(1_305, &params(100, 1_100))
        .unwrap();
    assert_eq!(left, 5);
    assert_eq!(amount(&group[0]), 300);
    assert_eq!(amount(&group[1]), 1_000);
    assert!(accepted(&group).unwrap());

    // Exact totals lose nothing.
    let (_, left) = template
        .split_transactions_rounded(2_600, &params(100, 1_100))
        .unwrap();
    assert_eq!(left, 0);
}

#[test]
fn rounded_split_still_honours_the_floor() {
    // 400 rounds down to 390, which splits 90 + 300.
    assert!(matches!(
        split(30, 100, 100).split_transactions_rounded(400, &params(100, 1_100)),
        Err(TemplateError::Constraint(_))
    ));
}

#[test]
fn below_floor_is_refused() {
    assert!(matches!(
        split(30, 100, 400).split_transactions(1_300, &params(100, 1_100)),
        Err(TemplateError::Constraint(_))
    ));
}

#[test]
fn window_past_expiry_is_refused() {
    assert!(matches!(
        split(1, 1, 0).split_transactions(10, &params(4_500, EXPIRY + 1)),
        Err(TemplateError::Constraint(_))
    ));
}

#[test]
fn owner_closes_after_expiry() {
    let template = split(1, 1, 0);
    assert!(template.close_transaction(&params(EXPIRY, EXPIRY + 10)).is_err());

    let stx = template
        .close_transaction(&params(EXPIRY + 1, EXPIRY + 10))
        .unwrap();
    assert!(accepted(&[stx]).unwrap());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn exact_multiples_always_split(n in 1u64..50, d in 1u64..50, unit in 1u64..1_000) {
        let template = split(n, d, 0);
        let g = {
            let (mut a, mut b) = (n, d);
            while b != 0 {
                (a, b) = (b, a % b);
            }
            a
        };
        let total = unit * (n + d) / g;
        let group = template.split_transactions(total, &params(100, 200)).unwrap();
        let (a, b) = (amount(&group[0]), amount(&group[1]));
        prop_assert_eq!(a + b, total);
        prop_assert_eq!(a * d, b * n);
        prop_assert!(accepted(&group).unwrap());
    }
}

#[test]
fn rekeying_either_leg_fails_the_program() {
    let template = split(30, 100, 100);
    let attacker = Address::new([0x66; 32]);
    let group = template
        .split_transactions(1_300, &params(100, 1_100))
        .unwrap();
    for index in 0..2 {
        let txns = with_rekey(&group, index, attacker);
        assert!(!program_accepts(&group, &txns, index).unwrap());
    }

    let close = [template.close_transaction(&params(EXPIRY + 1, EXPIRY + 10)).unwrap()];
    assert!(!program_accepts(&close, &with_rekey(&close, 0, attacker), 0).unwrap());
}
