// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Protocol Core
//!
//! Everything a wallet needs to produce transactions a network will accept,
//! and nothing it doesn't: no consensus, no ledger, no transport.
//!
//! The one thing this crate must never get wrong is bytes. A signer and a
//! verifier that disagree about a single byte of a transaction's encoding
//! disagree about its id, its signature and its group, so every identity in
//! the protocol flows through one canonical encoder.
//!
//! ## Architecture
//!
//! - **config**: Protocol constants: sizes, domain tags, fee floor, limits.
//! - **crypto**: Addresses, Ed25519 keys, SHA-512/256 and friends.
//! - **encoding**: The canonical MessagePack encoder and strict decoder.
//! - **transaction**: Building, signing, multisig merge, grouping, verifying.
//! - **logic**: Predicate programs and logic signatures.
//! - **auction**: Signed auction bids.
//! - **storage**: Files of concatenated encodings.
//! - **network**: Node-client and key-store interfaces.
//! - **error**: The error taxonomy.
//!
//! ## Design Philosophy
//!
//! 1. Every value is immutable once built; operations return new values.
//! 2. Nothing panics on bad input. Everything returns a `Result`.
//! 3. If it touches bytes that get signed, it has a golden test.

pub mod auction;
pub mod config;
pub mod crypto;
pub mod encoding;
pub mod error;
pub mod logic;
pub mod network;
pub mod storage;
pub mod transaction;

pub use error::{Error, Result};
