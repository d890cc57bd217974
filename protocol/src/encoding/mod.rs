//! # Canonical Encoding
//!
//! Every byte that gets hashed or signed passes through here. Two parties
//! that build the same logical transaction must produce the same bytes, or
//! their ids and signatures will disagree; the rules that guarantee this
//! live in [`msgpack`].
//!
//! Types opt in by implementing [`CanonicalEncode`] (value → map tree) and
//! [`CanonicalDecode`] (map tree → value). Decoding is strict: truncated
//! input, trailing bytes and unknown fields are all errors, and so is any
//! input that does not re-encode to itself (keys out of order, oversized
//! headers, explicitly encoded zero values).

pub mod msgpack;

use base64::{engine::general_purpose::STANDARD, Engine};
use rmpv::Value;

use crate::error::EncodingError;

pub use msgpack::{MapBuilder, MapReader};

/// Converts a value to the MessagePack tree that gets serialized.
pub trait CanonicalEncode {
    fn to_msgpack(&self) -> Value;
}

/// Rebuilds a value from a decoded MessagePack tree.
pub trait CanonicalDecode: Sized {
    fn from_msgpack(value: &Value) -> Result<Self, EncodingError>;
}

/// Canonical bytes for `value`.
pub fn encode<T: CanonicalEncode + ?Sized>(value: &T) -> Vec<u8> {
    let mut out = Vec::new();
    msgpack::write_canonical(&value.to_msgpack(), &mut out);
    out
}

/// Decode exactly one value from `bytes`.
pub fn decode<T: CanonicalDecode>(bytes: &[u8]) -> Result<T, EncodingError> {
    let mut cursor = bytes;
    let value = read_canonical(&mut cursor)?;
    if !cursor.is_empty() {
        return Err(EncodingError::TrailingBytes(cursor.len()));
    }
    T::from_msgpack(&value)
}

/// Decode a concatenation of values, failing on a partial trailing record.
pub fn decode_stream<T: CanonicalDecode>(bytes: &[u8]) -> Result<Vec<T>, EncodingError> {
    let mut cursor = bytes;
    let mut out = Vec::new();
    while !cursor.is_empty() {
        let value = read_canonical(&mut cursor)?;
        out.push(T::from_msgpack(&value)?);
    }
    Ok(out)
}

pub fn encode_b64<T: CanonicalEncode + ?Sized>(value: &T) -> String {
    STANDARD.encode(encode(value))
}

pub fn decode_b64<T: CanonicalDecode>(text: &str) -> Result<T, EncodingError> {
    let bytes = STANDARD
        .decode(text.trim())
        .map_err(|e| EncodingError::InvalidBase64(e.to_string()))?;
    decode(&bytes)
}

/// Read one value and require that its canonical encoding is exactly the
/// bytes it was read from.
fn read_canonical(cursor: &mut &[u8]) -> Result<Value, EncodingError> {
    let start = *cursor;
    let value = read_value(cursor)?;
    let consumed = &start[..start.len() - cursor.len()];
    let mut canonical = Vec::with_capacity(consumed.len());
    msgpack::write_canonical(&value, &mut canonical);
    if canonical != consumed {
        let reason = if msgpack::canonicalize(&value) != value {
            "map keys out of order"
        } else {
            "oversized header"
        };
        return Err(EncodingError::NonCanonical(reason.to_string()));
    }
    Ok(value)
}

fn read_value(cursor: &mut &[u8]) -> Result<Value, EncodingError> {
    use rmpv::decode::Error as DecodeError;

    rmpv::decode::read_value(cursor).map_err(|err| match err {
        DecodeError::InvalidMarkerRead(ref io) | DecodeError::InvalidDataRead(ref io)
            if io.kind() == std::io::ErrorKind::UnexpectedEof =>
        {
            EncodingError::Truncated
        }
        other => EncodingError::Malformed(other.to_string()),
    })
}
