//! # Network Collaborators
//!
//! Interfaces to the two external services a wallet talks to: a node
//! (fees, rounds, submission) and a key store (signing). Only the traits
//! and an in-memory key store live here; the crate stays transport-agnostic.
//!
//! Both traits are `async` because every real implementation does I/O.
//! The in-memory store guards its map with `parking_lot::RwLock`: reads
//! (signing) vastly outnumber writes (imports), and no lock is held across
//! an `.await`.

pub mod client;
pub mod keystore;

pub use client::{ClientError, NodeClient, NodeStatus, SuggestedParams};
pub use keystore::{InMemoryKeyStore, KeyStore, KeyStoreError};
