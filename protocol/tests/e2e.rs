//! End-to-end integration tests for the protocol core.
//!
//! These tests walk the wallet-side lifecycle the way a client would:
//! build from suggested parameters, group, sign (singly, by multisig
//! committee, or by logic signature), persist to a file, read back, and
//! verify. Each test stands alone with its own fixtures and temp directory.

use algo_protocol::crypto::{Address, Keypair};
use algo_protocol::logic::{LogicSig, Op, ProgramBuilder, TxnField};
use algo_protocol::network::SuggestedParams;
use algo_protocol::storage::{read_from_file, write_to_file};
use algo_protocol::transaction::{
    assign_group_id, assign_group_id_for, AssetConfigFields, AssetFreezeFields, AssetParams,
    AssetTransferFields, KeyRegFields, Multisig, MultisigTransaction, PaymentFields,
    SignedTransaction, Transaction, TransactionBuilder,
};
use algo_protocol::{encoding, Error};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn params() -> SuggestedParams {
    SuggestedParams {
        fee: 0,
        first_valid: 5_000,
        last_valid: 6_000,
        genesis_id: "testnet-v1.0".to_string(),
        genesis_hash: Some([0x48; 32]),
        flat_fee: false,
    }
}

fn committee() -> (Multisig, [Keypair; 3]) {
    let kps = [
        Keypair::from_seed(&[31; 32]),
        Keypair::from_seed(&[32; 32]),
        Keypair::from_seed(&[33; 32]),
    ];
    let msig = Multisig::new(
        1,
        2,
        kps.iter().map(Keypair::address).collect(),
    )
    .unwrap();
    (msig, kps)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn two_of_three_payment_signed_on_separate_machines() {
    let (msig, [a, b, c]) = committee();
    let txn = TransactionBuilder::from_params(msig.address(), &params())
        .payment(PaymentFields::new(Address::new([9; 32]), 1_000_000))
        .build()
        .unwrap();

    // Each co-signer receives only the encoded unsigned container.
    let wire = encoding::encode(&MultisigTransaction::new(txn, &msig).unwrap());
    let part = |kp: &Keypair| {
        let mtx: MultisigTransaction = encoding::decode(&wire).unwrap();
        encoding::encode(&mtx.sign(kp).unwrap())
    };
    let from_a: MultisigTransaction = encoding::decode(&part(&a)).unwrap();
    let from_c: MultisigTransaction = encoding::decode(&part(&c)).unwrap();

    let merged = MultisigTransaction::merge(&[from_c, from_a]).unwrap();
    assert!(merged.is_broadcast_eligible());
    assert_eq!(merged.msig.populated(), 2);
    assert!(merged.msig.subsigs[1].signature.is_none());

    let stx = merged.to_signed().unwrap();
    assert_eq!(stx.auth_addr, None);
    assert!(stx.verify().is_ok());

    // A late third signature is harmless.
    let late = merged.sign(&b).unwrap();
    assert_eq!(late.msig.populated(), 3);
    assert!(late.verify());
}

#[test]
fn grouped_payments_signed_by_each_sender() {
    let alice = Keypair::from_seed(&[41; 32]);
    let bob = Keypair::from_seed(&[42; 32]);
    let txns = [
        TransactionBuilder::from_params(alice.address(), &params())
            .payment(PaymentFields::new(bob.address(), 100))
            .build()
            .unwrap(),
        TransactionBuilder::from_params(bob.address(), &params())
            .payment(PaymentFields::new(alice.address(), 200))
            .build()
            .unwrap(),
    ];

    let alice_part = assign_group_id_for(&txns, &alice.address()).unwrap();
    let bob_part = assign_group_id_for(&txns, &bob.address()).unwrap();
    assert_eq!(alice_part.len(), 1);
    assert_eq!(alice_part[0].group(), bob_part[0].group());

    let signed = [alice_part[0].sign(&alice), bob_part[0].sign(&bob)];
    assert!(signed.iter().all(|s| s.verify().is_ok()));
    assert_eq!(assign_group_id(&txns).unwrap()[1], bob_part[0]);
}

#[test]
fn files_carry_signed_and_unsigned_transactions() {
    let dir = tempfile::tempdir().unwrap();
    let kp = Keypair::from_seed(&[51; 32]);
    let txn = TransactionBuilder::from_params(kp.address(), &params())
        .note(b"rent".to_vec())
        .payment(PaymentFields::new(Address::new([7; 32]), 42))
        .build()
        .unwrap();

    let raw = dir.path().join("raw.tx");
    write_to_file(&raw, &[txn.clone()]).unwrap();
    let unsigned: Vec<Transaction> = read_from_file(&raw).unwrap();
    assert_eq!(unsigned, vec![txn.clone()]);

    let signed_path = dir.path().join("signed.tx");
    write_to_file(&signed_path, &[unsigned[0].sign(&kp)]).unwrap();
    let signed: Vec<SignedTransaction> = read_from_file(&signed_path).unwrap();
    assert_eq!(signed[0].txn, txn);
    assert!(signed[0].verify().is_ok());
}

#[test]
fn every_transaction_type_roundtrips() {
    let sender = Address::new([61; 32]);
    let other = Address::new([62; 32]);
    let base = || TransactionBuilder::from_params(sender, &params());
    let txns = vec![
        base()
            .payment(PaymentFields::new(other, 1).close_remainder_to(sender))
            .build()
            .unwrap(),
        base()
            .key_registration(KeyRegFields {
                vote_pk: [1; 32],
                selection_pk: [2; 32],
                vote_first: 10,
                vote_last: 10_000,
                vote_key_dilution: 100,
                non_participation: false,
            })
            .build()
            .unwrap(),
        base()
            .key_registration(KeyRegFields {
                non_participation: true,
                ..KeyRegFields::default()
            })
            .build()
            .unwrap(),
        base()
            .asset_config(AssetConfigFields::create(AssetParams {
                total: 1_000_000,
                decimals: 2,
                default_frozen: true,
                unit_name: "tok".to_string(),
                asset_name: "token".to_string(),
                url: "https://example.invalid/token".to_string(),
                metadata_hash: Some([5; 32]),
                manager: Some(sender),
                reserve: Some(sender),
                freeze: Some(sender),
                clawback: Some(sender),
            }))
            .build()
            .unwrap(),
        base()
            .asset_config(AssetConfigFields::destroy(77))
            .build()
            .unwrap(),
        base()
            .asset_transfer(AssetTransferFields::new(77, other, 5).revocation_target(other))
            .build()
            .unwrap(),
        base()
            .asset_freeze(AssetFreezeFields {
                asset_index: 77,
                target: other,
                frozen: true,
            })
            .build()
            .unwrap(),
    ];

    for txn in txns {
        let bytes = encoding::encode(&txn);
        let back: Transaction = encoding::decode(&bytes).unwrap();
        assert_eq!(back, txn, "{}", txn.tx_type());
        assert_eq!(encoding::encode(&back), bytes);
        assert_eq!(
            encoding::decode_b64::<Transaction>(&encoding::encode_b64(&txn)).unwrap(),
            txn
        );
    }
}

#[test]
fn default_frozen_is_carried_verbatim() {
    let sender = Address::new([61; 32]);
    let create = |frozen: bool| {
        TransactionBuilder::from_params(sender, &params())
            .asset_config(AssetConfigFields::create(AssetParams {
                total: 10,
                default_frozen: frozen,
                ..AssetParams::default()
            }))
            .build()
            .unwrap()
    };
    let frozen: Transaction = encoding::decode(&encoding::encode(&create(true))).unwrap();
    let thawed: Transaction = encoding::decode(&encoding::encode(&create(false))).unwrap();
    assert_ne!(frozen.id(), thawed.id());
    assert_eq!(frozen, create(true));
}

#[test]
fn escrow_spend_through_logic_sig() {
    let program = ProgramBuilder::new(2)
        .txn(TxnField::Fee)
        .int(2_000)
        .op(Op::Le)
        .assemble()
        .unwrap();
    let lsig = LogicSig::new(program, vec![]).unwrap();
    let txn = TransactionBuilder::from_params(lsig.address(), &params())
        .payment(PaymentFields::new(Address::new([3; 32]), 10))
        .build()
        .unwrap();
    let stx = SignedTransaction::with_logic_sig(txn, lsig).unwrap();
    assert!(stx.verify().is_ok());

    let back: SignedTransaction = encoding::decode(&encoding::encode(&stx)).unwrap();
    assert_eq!(back, stx);
}

#[test]
fn errors_convert_into_the_crate_error() {
    fn build() -> algo_protocol::Result<Transaction> {
        Ok(TransactionBuilder::new(Address::new([1; 32]))
            .payment(PaymentFields::new(Address::new([2; 32]), 1))
            .build()?)
    }
    assert!(matches!(build(), Err(Error::Validation(_))));
}
