//! Typed program assembly.
//!
//! Programs are built from typed ops rather than text. Integer and byte
//! constants are pooled into an `intcblock` / `bytecblock` pair in first-use
//! order, so the same parameters always assemble to the same bytes and
//! therefore the same escrow address.

use std::collections::HashMap;

use super::opcodes::{GlobalField, Op, TxnField};
use crate::crypto::Address;
use crate::error::ValidationError;

pub(crate) fn write_uvarint(mut n: u64, out: &mut Vec<u8>) {
    while n >= 0x80 {
        out.push((n as u8) | 0x80);
        n >>= 7;
    }
    out.push(n as u8);
}

/// Returns the value and the number of bytes consumed.
pub(crate) fn read_uvarint(bytes: &[u8]) -> Option<(u64, usize)> {
    let mut value = 0u64;
    for (i, b) in bytes.iter().enumerate().take(10) {
        let low = u64::from(b & 0x7f);
        if i == 9 && *b > 1 {
            return None;
        }
        value |= low << (7 * i);
        if b & 0x80 == 0 {
            return Some((value, i + 1));
        }
    }
    None
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    Simple(u8),
    Int(usize),
    Bytes(usize),
    Arg(u8),
    Txn(TxnField),
    Gtxn(u8, TxnField),
    Global(GlobalField),
    Load(u8),
    Store(u8),
    Branch(u8, String),
    Label(String),
}

impl Item {
    fn size(&self) -> usize {
        match self {
            Item::Simple(_) => 1,
            Item::Int(i) | Item::Bytes(i) => {
                if *i < 4 {
                    1
                } else {
                    2
                }
            }
            Item::Arg(n) => {
                if *n < 4 {
                    1
                } else {
                    2
                }
            }
            Item::Txn(_) | Item::Global(_) | Item::Load(_) | Item::Store(_) => 2,
            Item::Gtxn(..) => 3,
            Item::Branch(..) => 3,
            Item::Label(_) => 0,
        }
    }
}

/// Builds a program one op at a time.
///
/// ```
/// use algo_protocol::logic::{ProgramBuilder, TxnField, Op};
///
/// let program = ProgramBuilder::new(2)
///     .txn(TxnField::Fee)
///     .int(1_000)
///     .op(Op::Le)
///     .assemble()
///     .unwrap();
/// assert_eq!(program[0], 2);
/// ```
#[derive(Debug, Clone)]
pub struct ProgramBuilder {
    version: u64,
    items: Vec<Item>,
    ints: Vec<u64>,
    bytes: Vec<Vec<u8>>,
}

impl ProgramBuilder {
    pub fn new(version: u64) -> Self {
        Self {
            version,
            items: Vec::new(),
            ints: Vec::new(),
            bytes: Vec::new(),
        }
    }

    pub fn int(mut self, n: u64) -> Self {
        let idx = match self.ints.iter().position(|v| *v == n) {
            Some(i) => i,
            None => {
                self.ints.push(n);
                self.ints.len() - 1
            }
        };
        self.items.push(Item::Int(idx));
        self
    }

    pub fn byte(mut self, b: &[u8]) -> Self {
        let idx = match self.bytes.iter().position(|v| v == b) {
            Some(i) => i,
            None => {
                self.bytes.push(b.to_vec());
                self.bytes.len() - 1
            }
        };
        self.items.push(Item::Bytes(idx));
        self
    }

    pub fn addr(self, addr: &Address) -> Self {
        self.byte(addr.as_bytes())
    }

    pub fn arg(mut self, n: u8) -> Self {
        self.items.push(Item::Arg(n));
        self
    }

    pub fn txn(mut self, field: TxnField) -> Self {
        self.items.push(Item::Txn(field));
        self
    }

    pub fn gtxn(mut self, index: u8, field: TxnField) -> Self {
        self.items.push(Item::Gtxn(index, field));
        self
    }

    pub fn global(mut self, field: GlobalField) -> Self {
        self.items.push(Item::Global(field));
        self
    }

    pub fn load(mut self, slot: u8) -> Self {
        self.items.push(Item::Load(slot));
        self
    }

    pub fn store(mut self, slot: u8) -> Self {
        self.items.push(Item::Store(slot));
        self
    }

    pub fn op(mut self, op: Op) -> Self {
        self.items.push(Item::Simple(op.opcode()));
        self
    }

    /// Push `txn field == int n`.
    pub fn txn_eq_int(self, field: TxnField, n: u64) -> Self {
        self.txn(field).int(n).op(Op::Eq)
    }

    /// Push `txn field == addr`.
    pub fn txn_eq_addr(self, field: TxnField, addr: &Address) -> Self {
        self.txn(field).addr(addr).op(Op::Eq)
    }

    /// Push `txn field == global ZeroAddress`.
    pub fn txn_is_zero_address(self, field: TxnField) -> Self {
        self.txn(field).global(GlobalField::ZeroAddress).op(Op::Eq)
    }

    pub fn bnz(mut self, label: &str) -> Self {
        self.items.push(Item::Branch(0x40, label.to_string()));
        self
    }

    pub fn bz(mut self, label: &str) -> Self {
        self.items.push(Item::Branch(0x41, label.to_string()));
        self
    }

    pub fn b(mut self, label: &str) -> Self {
        self.items.push(Item::Branch(0x42, label.to_string()));
        self
    }

    pub fn label(mut self, name: &str) -> Self {
        self.items.push(Item::Label(name.to_string()));
        self
    }

    /// Emit bytecode. Fails on unknown or backward branch targets,
    /// duplicate labels, constant pools too large to index, or ops newer
    /// than the program version.
    pub fn assemble(self) -> Result<Vec<u8>, ValidationError> {
        let invalid = |msg: String| ValidationError::InvalidProgram(msg);

        if self.version == 0 || self.version > crate::config::LOGIC_SIG_VERSION {
            return Err(invalid(format!("unsupported version {}", self.version)));
        }
        if self.ints.len() > 256 || self.bytes.len() > 256 {
            return Err(invalid("constant pool exceeds 256 entries".to_string()));
        }

        let mut out = Vec::new();
        write_uvarint(self.version, &mut out);
        if !self.ints.is_empty() {
            out.push(0x20);
            write_uvarint(self.ints.len() as u64, &mut out);
            for n in &self.ints {
                write_uvarint(*n, &mut out);
            }
        }
        if !self.bytes.is_empty() {
            out.push(0x26);
            write_uvarint(self.bytes.len() as u64, &mut out);
            for b in &self.bytes {
                write_uvarint(b.len() as u64, &mut out);
                out.extend_from_slice(b);
            }
        }

        // First pass: label positions relative to the start of the body.
        let mut labels = HashMap::new();
        let mut pc = 0usize;
        for item in &self.items {
            if let Item::Label(name) = item {
                if labels.insert(name.as_str(), pc).is_some() {
                    return Err(invalid(format!("duplicate label {name}")));
                }
            }
            pc += item.size();
        }

        let mut pc = 0usize;
        for item in &self.items {
            match item {
                Item::Simple(opcode) => {
                    if *opcode == Op::Return.opcode() && self.version < 2 {
                        return Err(invalid("return requires version 2".to_string()));
                    }
                    out.push(*opcode);
                }
                Item::Int(i) if *i < 4 => out.push(0x22 + *i as u8),
                Item::Int(i) => out.extend_from_slice(&[0x21, *i as u8]),
                Item::Bytes(i) if *i < 4 => out.push(0x28 + *i as u8),
                Item::Bytes(i) => out.extend_from_slice(&[0x27, *i as u8]),
                Item::Arg(n) if *n < 4 => out.push(0x2d + n),
                Item::Arg(n) => out.extend_from_slice(&[0x2c, *n]),
                Item::Txn(field) => out.extend_from_slice(&[0x31, *field as u8]),
                Item::Gtxn(index, field) => out.extend_from_slice(&[0x33, *index, *field as u8]),
                Item::Global(field) => out.extend_from_slice(&[0x32, *field as u8]),
                Item::Load(slot) => out.extend_from_slice(&[0x34, *slot]),
                Item::Store(slot) => out.extend_from_slice(&[0x35, *slot]),
                Item::Branch(opcode, label) => {
                    if *opcode != 0x40 && self.version < 2 {
                        return Err(invalid(format!("branch op {opcode:#04x} requires version 2")));
                    }
                    let target = *labels
                        .get(label.as_str())
                        .ok_or_else(|| invalid(format!("unknown label {label}")))?;
                    let next = pc + 3;
                    if target < next {
                        return Err(invalid(format!("backward branch to {label}")));
                    }
                    let offset = u16::try_from(target - next)
                        .map_err(|_| invalid(format!("branch to {label} is too far")))?;
                    out.push(*opcode);
                    out.extend_from_slice(&offset.to_be_bytes());
                }
                Item::Label(_) => {}
            }
            pc += item.size();
        }
        Ok(out)
    }
}
