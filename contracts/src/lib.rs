// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Escrow Templates
//!
//! Parameterized predicate programs and the transactions each one accepts.
//! A template is an immutable value: construct it from its parameter
//! struct, fund [`Template::address`], then use its helpers to build spends.
//!
//! - **HTLC**: pay the receiver on a hash preimage, refund the owner after
//!   expiry.
//! - **Split**: pay two receivers in a fixed ratio, atomically.
//! - **Periodic Payment**: a fixed withdrawal once per period.
//! - **Limit Order**: sell an asset at or above a price.
//! - **Dynamic Fee**: a delegated payment whose fee someone else covers.
//!
//! ## Design Principles
//!
//! 1. Helpers only build transactions the program accepts. Anything the
//!    program would reject fails with [`TemplateError::Constraint`] before a
//!    transaction exists.
//! 2. Nothing is clamped. A window past expiry or an amount below a floor
//!    is an error, not a quietly adjusted transaction.
//! 3. All arithmetic the program does is checked in the helper too, so an
//!    overflow is a constraint error rather than a rejected submission.

pub mod common;
pub mod dynamic_fee;
pub mod error;
pub mod htlc;
pub mod limit_order;
pub mod periodic_payment;
pub mod split;

pub use common::{random_lease, Template};
pub use dynamic_fee::{DynamicFee, DynamicFeeParams};
pub use error::{Result, TemplateError};
pub use htlc::{HashFunction, Htlc, HtlcParams};
pub use limit_order::{LimitOrder, LimitOrderParams};
pub use periodic_payment::{PeriodicPayment, PeriodicPaymentParams};
pub use split::{Split, SplitParams};
