//! # Transaction Module
//!
//! Construction, identity, signing, multisig combination, grouping and
//! verification of transactions.
//!
//! ## Architecture
//!
//! ```text
//! types.rs        - Type tag, shared header, one field struct per variant
//! builder.rs      - Transaction (id, bytes to sign, size) and TransactionBuilder
//! signing.rs      - SignedTransaction, Authorization, single-key signing
//! multisig.rs     - Multisig metadata, partial signatures, threshold merge
//! group.rs        - Atomic group id derivation and assignment
//! verification.rs - Structural and cryptographic checks on signed transactions
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Build**: [`TransactionBuilder`] validates fields and prices the fee.
//! 2. **Group** (optional): [`assign_group_id`] stamps every member.
//! 3. **Sign**: [`Transaction::sign`], [`MultisigTransaction::sign`] +
//!    [`MultisigTransaction::merge`], or [`SignedTransaction::with_logic_sig`].
//! 4. **Verify**: [`verify_transaction`] before handing bytes to a node.
//!
//! ## Design Decisions
//!
//! - All amounts are `u64` micro-units. No floating point anywhere near
//!   monetary values; [`crate::config::to_micro_units`] exists for display
//!   input only.
//! - Every value is immutable once built. Signing, merging and grouping
//!   return new values.

pub mod builder;
pub mod group;
pub mod multisig;
pub mod signing;
pub mod types;
pub mod verification;

pub use builder::{Transaction, TransactionBuilder};
pub use group::{assign_group_id, assign_group_id_for, compute_group_id};
pub use multisig::{
    merge_multisig_transactions, Multisig, MultisigSignature, MultisigSubsig, MultisigTransaction,
};
pub use signing::{sign_transaction, Authorization, SignedTransaction};
pub use types::{
    AssetConfigFields, AssetFreezeFields, AssetParams, AssetTransferFields, Header, KeyRegFields,
    PaymentFields, TransactionType, TxnKind,
};
pub use verification::{check_structure, verify_transaction, VerificationError};
