//! # Storage Module
//!
//! File persistence for transactions awaiting signatures or submission.
//! Chain state is the node's business; this crate only stores what a
//! wallet produces.

pub mod file;

pub use file::{read_from_file, write_to_file, StorageError};
