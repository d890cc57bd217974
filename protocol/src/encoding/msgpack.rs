//! Canonical MessagePack emission and field-level helpers.
//!
//! `rmpv::Value` is the in-memory tree and `rmpv` does the writing. Its
//! writer already picks the smallest header for every integer, string,
//! byte string, array and map, and keeps `bin` and `str` apart. The one
//! rule it does not know is key order, so [`canonicalize`] sorts every map
//! in the tree first, bytewise by the raw key bytes (not by their encoded
//! form, which would put short keys first).
//!
//! Omitting zero-valued fields is the job of [`MapBuilder`]; the writer
//! emits whatever it is given.

use rmpv::Value;

use crate::crypto::Address;
use crate::error::EncodingError;

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Append the canonical encoding of `value` to `out`.
pub fn write_canonical(value: &Value, out: &mut Vec<u8>) {
    let written = rmpv::encode::write_value(out, &canonicalize(value));
    debug_assert!(written.is_ok(), "writes into a Vec are infallible");
}

/// A copy of `value` with the entries of every nested map in key order.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        Value::Map(entries) => {
            let mut sorted: Vec<(Value, Value)> = entries
                .iter()
                .map(|(k, v)| (canonicalize(k), canonicalize(v)))
                .collect();
            sorted.sort_by_cached_key(|(k, _)| sort_key(k));
            Value::Map(sorted)
        }
        other => other.clone(),
    }
}

fn sort_key(key: &Value) -> Vec<u8> {
    match key {
        Value::String(s) => s.as_bytes().to_vec(),
        Value::Binary(b) => b.clone(),
        other => {
            let mut buf = Vec::new();
            write_canonical(other, &mut buf);
            buf
        }
    }
}

// ---------------------------------------------------------------------------
// MapBuilder
// ---------------------------------------------------------------------------

/// Collects the fields of one record, dropping every zero value.
///
/// The omission rules are what make two logically equal records encode to
/// the same bytes: a missing field and a zero field are indistinguishable
/// on the wire.
#[derive(Debug, Default)]
pub struct MapBuilder {
    entries: Vec<(Value, Value)>,
}

impl MapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uint(mut self, key: &str, n: u64) -> Self {
        if n != 0 {
            self.entries.push((Value::from(key), Value::from(n)));
        }
        self
    }

    pub fn boolean(mut self, key: &str, b: bool) -> Self {
        if b {
            self.entries.push((Value::from(key), Value::Boolean(true)));
        }
        self
    }

    pub fn string(mut self, key: &str, s: &str) -> Self {
        if !s.is_empty() {
            self.entries.push((Value::from(key), Value::from(s)));
        }
        self
    }

    pub fn bytes(mut self, key: &str, b: &[u8]) -> Self {
        if !b.is_empty() {
            self.entries
                .push((Value::from(key), Value::Binary(b.to_vec())));
        }
        self
    }

    /// Fixed-width digests (hashes, leases, group ids) are empty when all
    /// bytes are zero.
    pub fn digest(self, key: &str, d: &[u8; 32]) -> Self {
        if d.iter().all(|b| *b == 0) {
            self
        } else {
            self.bytes(key, d)
        }
    }

    pub fn opt_digest(self, key: &str, d: Option<&[u8; 32]>) -> Self {
        match d {
            Some(d) => self.digest(key, d),
            None => self,
        }
    }

    pub fn address(self, key: &str, addr: &Address) -> Self {
        self.digest(key, addr.as_bytes())
    }

    pub fn opt_address(self, key: &str, addr: Option<&Address>) -> Self {
        match addr {
            Some(a) => self.address(key, a),
            None => self,
        }
    }

    /// Nested values are dropped when they are nil, an empty map or an
    /// empty array.
    pub fn value(mut self, key: &str, v: Value) -> Self {
        let empty = match &v {
            Value::Nil => true,
            Value::Map(m) => m.is_empty(),
            Value::Array(a) => a.is_empty(),
            _ => false,
        };
        if !empty {
            self.entries.push((Value::from(key), v));
        }
        self
    }

    pub fn build(self) -> Value {
        Value::Map(self.entries)
    }
}

// ---------------------------------------------------------------------------
// MapReader
// ---------------------------------------------------------------------------

/// Pulls typed fields out of a decoded map and fails on anything left over.
///
/// Absent fields read as their zero value, mirroring [`MapBuilder`]. The
/// converse is an error: a field that is present but zero (or empty, or an
/// all-zero digest) could only come from a non-canonical encoder.
pub struct MapReader<'a> {
    entries: Vec<(&'a str, &'a Value)>,
}

impl<'a> MapReader<'a> {
    pub fn new(value: &'a Value, context: &str) -> Result<Self, EncodingError> {
        let map = value.as_map().ok_or_else(|| EncodingError::UnexpectedType {
            field: context.to_string(),
            expected: "map",
        })?;
        let mut entries = Vec::with_capacity(map.len());
        for (k, v) in map {
            let key = k.as_str().ok_or_else(|| EncodingError::UnexpectedType {
                field: context.to_string(),
                expected: "string keys",
            })?;
            if entries.iter().any(|(seen, _)| *seen == key) {
                return Err(EncodingError::Malformed(format!(
                    "duplicate key {key} in {context}"
                )));
            }
            if is_zero_value(v) {
                return Err(EncodingError::NonCanonical(format!(
                    "{context}.{key} is encoded but empty"
                )));
            }
            entries.push((key, v));
        }
        Ok(Self { entries })
    }

    pub fn take(&mut self, key: &str) -> Option<&'a Value> {
        let pos = self.entries.iter().position(|(k, _)| *k == key)?;
        Some(self.entries.swap_remove(pos).1)
    }

    pub fn uint(&mut self, key: &str) -> Result<u64, EncodingError> {
        match self.take(key) {
            None => Ok(0),
            Some(v) => v.as_u64().ok_or_else(|| type_error(key, "unsigned integer")),
        }
    }

    pub fn boolean(&mut self, key: &str) -> Result<bool, EncodingError> {
        match self.take(key) {
            None => Ok(false),
            Some(v) => v.as_bool().ok_or_else(|| type_error(key, "boolean")),
        }
    }

    pub fn string(&mut self, key: &str) -> Result<String, EncodingError> {
        match self.take(key) {
            None => Ok(String::new()),
            Some(v) => v
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| type_error(key, "utf-8 string")),
        }
    }

    pub fn bytes(&mut self, key: &str) -> Result<Vec<u8>, EncodingError> {
        match self.take(key) {
            None => Ok(Vec::new()),
            Some(v) => as_bin(key, v).map(<[u8]>::to_vec),
        }
    }

    pub fn digest(&mut self, key: &str) -> Result<Option<[u8; 32]>, EncodingError> {
        match self.take(key) {
            None => Ok(None),
            Some(v) => {
                let d = fixed32(key, as_bin(key, v)?)?;
                if d.iter().all(|b| *b == 0) {
                    return Err(EncodingError::NonCanonical(format!(
                        "{key} is encoded but all zero"
                    )));
                }
                Ok(Some(d))
            }
        }
    }

    pub fn address(&mut self, key: &str) -> Result<Address, EncodingError> {
        Ok(self.digest(key)?.map(Address::new).unwrap_or(Address::ZERO))
    }

    pub fn opt_address(&mut self, key: &str) -> Result<Option<Address>, EncodingError> {
        Ok(self.digest(key)?.map(Address::new))
    }

    /// Errors if any field was not consumed.
    pub fn finish(self) -> Result<(), EncodingError> {
        match self.entries.first() {
            None => Ok(()),
            Some((key, _)) => Err(EncodingError::UnknownField((*key).to_string())),
        }
    }
}

fn is_zero_value(v: &Value) -> bool {
    match v {
        Value::Nil | Value::Boolean(false) => true,
        Value::Integer(n) => n.as_u64() == Some(0),
        Value::String(s) => s.as_bytes().is_empty(),
        Value::Binary(b) => b.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Map(m) => m.is_empty(),
        _ => false,
    }
}

pub fn type_error(field: &str, expected: &'static str) -> EncodingError {
    EncodingError::UnexpectedType {
        field: field.to_string(),
        expected,
    }
}

pub fn as_bin<'v>(field: &str, v: &'v Value) -> Result<&'v [u8], EncodingError> {
    match v {
        Value::Binary(b) => Ok(b.as_slice()),
        _ => Err(type_error(field, "byte string")),
    }
}

pub fn fixed32(field: &str, b: &[u8]) -> Result<[u8; 32], EncodingError> {
    b.try_into().map_err(|_| EncodingError::InvalidLength {
        field: field.to_string(),
        expected: 32,
        actual: b.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(v: &Value) -> Vec<u8> {
        let mut out = Vec::new();
        write_canonical(v, &mut out);
        out
    }

    #[test]
    fn integers_use_smallest_header() {
        assert_eq!(encoded(&Value::from(5u64)), vec![0x05]);
        assert_eq!(encoded(&Value::from(200u64)), vec![0xcc, 0xc8]);
        assert_eq!(encoded(&Value::from(1000u64)), vec![0xcd, 0x03, 0xe8]);
        assert_eq!(
            encoded(&Value::from(70_000u64)),
            vec![0xce, 0x00, 0x01, 0x11, 0x70]
        );
        assert_eq!(
            encoded(&Value::from(u64::MAX)),
            vec![0xcf, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
        );
    }

    #[test]
    fn strings_and_bytes_are_distinguished() {
        assert_eq!(encoded(&Value::from("pay")), vec![0xa3, b'p', b'a', b'y']);
        assert_eq!(
            encoded(&Value::Binary(b"pay".to_vec())),
            vec![0xc4, 0x03, b'p', b'a', b'y']
        );
        let long = "x".repeat(40);
        assert_eq!(encoded(&Value::from(long.as_str()))[..2], [0xd9, 40]);
    }

    #[test]
    fn map_keys_sort_by_raw_bytes_not_encoded_length() {
        // "close" is longer than "fee" but sorts first.
        let v = Value::Map(vec![
            (Value::from("fee"), Value::from(1u64)),
            (Value::from("close"), Value::from(2u64)),
        ]);
        let out = encoded(&v);
        assert_eq!(out[0], 0x82);
        assert_eq!(&out[1..7], &[0xa5, b'c', b'l', b'o', b's', b'e']);
    }

    #[test]
    fn nested_maps_are_sorted_too() {
        let inner = Value::Map(vec![
            (Value::from("s"), Value::Binary(vec![1])),
            (Value::from("pk"), Value::Binary(vec![2])),
        ]);
        let v = Value::Map(vec![
            (Value::from("v"), Value::from(1u64)),
            (Value::from("subsig"), Value::Array(vec![inner])),
        ]);
        let out = encoded(&v);
        let expected: Vec<u8> = [
            &[0x82, 0xa6][..],
            b"subsig",
            &[0x91, 0x82, 0xa2],
            b"pk",
            &[0xc4, 0x01, 0x02, 0xa1],
            b"s",
            &[0xc4, 0x01, 0x01, 0xa1],
            b"v",
            &[0x01],
        ]
        .concat();
        assert_eq!(out, expected);
    }

    #[test]
    fn sorted_input_passes_through_unchanged() {
        let v = MapBuilder::new().uint("amt", 5).uint("fee", 1000).build();
        assert_eq!(canonicalize(&v), v);
        let mut plain = Vec::new();
        rmpv::encode::write_value(&mut plain, &v).unwrap();
        assert_eq!(encoded(&v), plain);
    }

    #[test]
    fn builder_omits_zero_values() {
        let v = MapBuilder::new()
            .uint("a", 0)
            .boolean("b", false)
            .string("c", "")
            .bytes("d", &[])
            .digest("e", &[0u8; 32])
            .address("f", &Address::ZERO)
            .value("g", Value::Map(vec![]))
            .uint("h", 1)
            .build();
        assert_eq!(v.as_map().map(Vec::len), Some(1));
    }

    #[test]
    fn reader_rejects_unknown_fields() {
        let v = MapBuilder::new().uint("known", 1).uint("extra", 2).build();
        let mut r = MapReader::new(&v, "test").unwrap();
        assert_eq!(r.uint("known").unwrap(), 1);
        assert_eq!(
            r.finish(),
            Err(EncodingError::UnknownField("extra".to_string()))
        );
    }

    #[test]
    fn reader_checks_digest_length() {
        let v = MapBuilder::new().bytes("gh", &[1u8; 31]).build();
        let mut r = MapReader::new(&v, "test").unwrap();
        assert!(matches!(
            r.digest("gh"),
            Err(EncodingError::InvalidLength { expected: 32, actual: 31, .. })
        ));
    }

    #[test]
    fn reader_rejects_explicit_zero_values() {
        let zeros = [
            Value::from(0u64),
            Value::Boolean(false),
            Value::from(""),
            Value::Binary(vec![]),
            Value::Array(vec![]),
            Value::Map(vec![]),
            Value::Nil,
        ];
        for zero in zeros {
            let v = Value::Map(vec![(Value::from("f"), zero.clone())]);
            assert!(
                matches!(MapReader::new(&v, "test"), Err(EncodingError::NonCanonical(_))),
                "{zero:?} accepted"
            );
        }
    }

    #[test]
    fn reader_rejects_all_zero_digest() {
        let v = Value::Map(vec![(Value::from("close"), Value::Binary(vec![0; 32]))]);
        let mut r = MapReader::new(&v, "test").unwrap();
        assert!(matches!(
            r.opt_address("close"),
            Err(EncodingError::NonCanonical(_))
        ));
    }

    #[test]
    fn reader_defaults_absent_fields_to_zero() {
        let v = MapBuilder::new().build();
        let mut r = MapReader::new(&v, "test").unwrap();
        assert_eq!(r.uint("fee").unwrap(), 0);
        assert_eq!(r.address("snd").unwrap(), Address::ZERO);
        assert!(!r.boolean("df").unwrap());
        assert!(r.finish().is_ok());
    }
}
