//! # Domain-Tagged Signatures
//!
//! Every signature in the protocol is taken over `tag ‖ payload`, never over
//! a bare payload. A signature on a transaction ("TX") can therefore never
//! be replayed as a signature on a program ("Program") or a bid ("aB"),
//! even if the payload bytes happen to coincide.

use super::address::Address;
use super::keys::{Keypair, Signature};

/// Concatenate a domain tag and a payload into the exact bytes that get
/// signed.
pub fn tagged_message(tag: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut msg = Vec::with_capacity(tag.len() + payload.len());
    msg.extend_from_slice(tag);
    msg.extend_from_slice(payload);
    msg
}

/// Sign `tag ‖ payload`.
pub fn sign_tagged(keypair: &Keypair, tag: &[u8], payload: &[u8]) -> Signature {
    keypair.sign(&tagged_message(tag, payload))
}

/// Verify a signature over `tag ‖ payload`.
pub fn verify_tagged(signer: &Address, tag: &[u8], payload: &[u8], signature: &Signature) -> bool {
    signer.verify(&tagged_message(tag, payload), signature)
}
