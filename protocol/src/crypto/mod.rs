//! # Cryptographic Primitives
//!
//! Thin, typed wrappers around audited implementations:
//!
//! - **Ed25519** (`ed25519-dalek`) for account signatures.
//! - **SHA-512/256** (`sha2`) for every identifier the protocol derives.
//! - **SHA-256** and **Keccak-256** for hash-lock images.
//! - **BIP-39 English words** (`bip39`) for 25-word key backups.
//!
//! Nothing here is novel cryptography. If you are tempted to optimize it,
//! don't.

pub mod address;
pub mod hash;
pub mod keys;
pub mod mnemonic;
pub mod signatures;

pub use address::{decode_address, encode_address, is_valid_address, Address, AddressError};
pub use hash::{keccak256, sha256, sha512_256, tagged_hash};
pub use keys::{Keypair, Signature};
pub use signatures::{sign_tagged, tagged_message, verify_tagged};
