//! # Protocol Configuration & Constants
//!
//! Every magic number in the crate lives here. Most of these are part of
//! the wire contract with the network: change a domain tag or a fee floor
//! and every signature or fee estimate this crate produces stops being
//! accepted.

// ---------------------------------------------------------------------------
// Key and address sizes
// ---------------------------------------------------------------------------

/// Ed25519 public key length. An address is this key plus a checksum.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Exported private key length: 32-byte seed followed by the public key.
pub const PRIVATE_KEY_LENGTH: usize = 64;

/// Ed25519 signature length. Always 64 bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// Number of trailing SHA-512/256 bytes appended to a key as its checksum.
pub const CHECKSUM_LENGTH: usize = 4;

/// Length of the textual address: base32 of 36 bytes, unpadded.
pub const ADDRESS_LENGTH: usize = 58;

/// Digest length for every identifier (txid, group id, program address).
pub const HASH_LENGTH: usize = 32;

/// Genesis hashes, leases, group ids and metadata hashes are all 32 bytes.
pub const DIGEST_FIELD_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Domain tags
// ---------------------------------------------------------------------------

/// Prefix for transaction ids and transaction signatures.
pub const TRANSACTION_TAG: &[u8] = b"TX";

/// Prefix for group id derivation.
pub const TX_GROUP_TAG: &[u8] = b"TG";

/// Prefix for program addresses and delegated logic signatures.
pub const PROGRAM_TAG: &[u8] = b"Program";

/// Prefix for multisig address derivation.
pub const MULTISIG_ADDR_TAG: &[u8] = b"MultisigAddr";

/// Prefix for auction bid signatures.
pub const BID_TAG: &[u8] = b"aB";

// ---------------------------------------------------------------------------
// Fees and limits
// ---------------------------------------------------------------------------

/// Minimum fee, in micro-units, that the network accepts for a transaction.
pub const MIN_TXN_FEE: u64 = 1_000;

/// Micro-units per whole unit of the native currency.
pub const MICRO_UNITS_PER_UNIT: u64 = 1_000_000;

/// Maximum note length in bytes.
pub const MAX_NOTE_LENGTH: usize = 1_024;

/// Maximum number of transactions in one atomic group.
pub const MAX_GROUP_SIZE: usize = 16;

/// Only multisig version understood by the network.
pub const MULTISIG_VERSION: u8 = 1;

// ---------------------------------------------------------------------------
// Logic programs
// ---------------------------------------------------------------------------

/// Highest program version this crate assembles and checks.
pub const LOGIC_SIG_VERSION: u64 = 2;

/// Upper bound on `program.len() + sum(arg.len())`.
pub const LOGIC_SIG_MAX_SIZE: usize = 1_000;

/// Upper bound on the static cost of a logic-signature program.
pub const LOGIC_SIG_MAX_COST: u64 = 20_000;

/// Converts whole units to micro-units, rounding to the nearest micro-unit.
pub fn to_micro_units(units: f64) -> u64 {
    (units * MICRO_UNITS_PER_UNIT as f64).round() as u64
}

/// Converts micro-units to whole units for display.
pub fn from_micro_units(micro: u64) -> f64 {
    micro as f64 / MICRO_UNITS_PER_UNIT as f64
}
