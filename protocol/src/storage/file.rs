//! Files of concatenated canonical encodings.
//!
//! This is the interchange format wallets use to hand unsigned or signed
//! transactions to each other: no framing, no header, just one canonical
//! encoding after another. Reading stops exactly at end of file and a
//! partial trailing record is an error.

use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::encoding::{self, CanonicalDecode, CanonicalEncode};
use crate::error::EncodingError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// Write `items` to `path`, replacing any existing file.
pub fn write_to_file<T: CanonicalEncode>(
    path: impl AsRef<Path>,
    items: &[T],
) -> Result<(), StorageError> {
    let mut bytes = Vec::new();
    for item in items {
        bytes.extend(encoding::encode(item));
    }
    fs::write(path.as_ref(), &bytes)?;
    debug!(path = %path.as_ref().display(), records = items.len(), bytes = bytes.len(), "wrote encodings");
    Ok(())
}

/// Read every record in `path`.
pub fn read_from_file<T: CanonicalDecode>(path: impl AsRef<Path>) -> Result<Vec<T>, StorageError> {
    let bytes = fs::read(path.as_ref())?;
    let items = encoding::decode_stream(&bytes)?;
    debug!(path = %path.as_ref().display(), records = items.len(), "read encodings");
    Ok(items)
}
