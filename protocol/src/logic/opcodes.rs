//! Opcode table and field enumerations for predicate programs.

/// How an opcode's immediate bytes are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Immediate {
    None,
    /// Fixed number of single-byte immediates.
    Bytes(usize),
    /// `varint count` followed by `count` varints.
    IntBlock,
    /// `varint count` followed by `count` length-prefixed byte strings.
    ByteBlock,
    /// Two-byte big-endian forward offset.
    Branch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpSpec {
    pub opcode: u8,
    pub name: &'static str,
    pub immediate: Immediate,
    pub cost: u64,
    pub min_version: u64,
}

const fn op(opcode: u8, name: &'static str, immediate: Immediate, cost: u64, min_version: u64) -> OpSpec {
    OpSpec {
        opcode,
        name,
        immediate,
        cost,
        min_version,
    }
}

use Immediate::{Branch, ByteBlock, Bytes, IntBlock};

pub const OPS: &[OpSpec] = &[
    op(0x00, "err", Immediate::None, 1, 1),
    op(0x01, "sha256", Immediate::None, 7, 1),
    op(0x02, "keccak256", Immediate::None, 26, 1),
    op(0x03, "sha512_256", Immediate::None, 9, 1),
    op(0x04, "ed25519verify", Immediate::None, 1900, 1),
    op(0x08, "+", Immediate::None, 1, 1),
    op(0x09, "-", Immediate::None, 1, 1),
    op(0x0a, "/", Immediate::None, 1, 1),
    op(0x0b, "*", Immediate::None, 1, 1),
    op(0x0c, "<", Immediate::None, 1, 1),
    op(0x0d, ">", Immediate::None, 1, 1),
    op(0x0e, "<=", Immediate::None, 1, 1),
    op(0x0f, ">=", Immediate::None, 1, 1),
    op(0x10, "&&", Immediate::None, 1, 1),
    op(0x11, "||", Immediate::None, 1, 1),
    op(0x12, "==", Immediate::None, 1, 1),
    op(0x13, "!=", Immediate::None, 1, 1),
    op(0x14, "!", Immediate::None, 1, 1),
    op(0x15, "len", Immediate::None, 1, 1),
    op(0x16, "itob", Immediate::None, 1, 1),
    op(0x17, "btoi", Immediate::None, 1, 1),
    op(0x18, "%", Immediate::None, 1, 1),
    op(0x19, "|", Immediate::None, 1, 1),
    op(0x1a, "&", Immediate::None, 1, 1),
    op(0x1b, "^", Immediate::None, 1, 1),
    op(0x1c, "~", Immediate::None, 1, 1),
    op(0x1d, "mulw", Immediate::None, 1, 1),
    op(0x20, "intcblock", IntBlock, 1, 1),
    op(0x21, "intc", Bytes(1), 1, 1),
    op(0x22, "intc_0", Immediate::None, 1, 1),
    op(0x23, "intc_1", Immediate::None, 1, 1),
    op(0x24, "intc_2", Immediate::None, 1, 1),
    op(0x25, "intc_3", Immediate::None, 1, 1),
    op(0x26, "bytecblock", ByteBlock, 1, 1),
    op(0x27, "bytec", Bytes(1), 1, 1),
    op(0x28, "bytec_0", Immediate::None, 1, 1),
    op(0x29, "bytec_1", Immediate::None, 1, 1),
    op(0x2a, "bytec_2", Immediate::None, 1, 1),
    op(0x2b, "bytec_3", Immediate::None, 1, 1),
    op(0x2c, "arg", Bytes(1), 1, 1),
    op(0x2d, "arg_0", Immediate::None, 1, 1),
    op(0x2e, "arg_1", Immediate::None, 1, 1),
    op(0x2f, "arg_2", Immediate::None, 1, 1),
    op(0x30, "arg_3", Immediate::None, 1, 1),
    op(0x31, "txn", Bytes(1), 1, 1),
    op(0x32, "global", Bytes(1), 1, 1),
    op(0x33, "gtxn", Bytes(2), 1, 1),
    op(0x34, "load", Bytes(1), 1, 1),
    op(0x35, "store", Bytes(1), 1, 1),
    op(0x40, "bnz", Branch, 1, 1),
    op(0x41, "bz", Branch, 1, 2),
    op(0x42, "b", Branch, 1, 2),
    op(0x43, "return", Immediate::None, 1, 2),
    op(0x48, "pop", Immediate::None, 1, 1),
    op(0x49, "dup", Immediate::None, 1, 1),
];

pub fn lookup(opcode: u8) -> Option<&'static OpSpec> {
    OPS.iter().find(|spec| spec.opcode == opcode)
}

/// Opcodes that take no immediates and are emitted as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Err,
    Sha256,
    Keccak256,
    Sha512_256,
    Ed25519Verify,
    Add,
    Sub,
    Div,
    Mul,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
    Eq,
    Ne,
    Not,
    Len,
    Itob,
    Btoi,
    Mod,
    BitOr,
    BitAnd,
    BitXor,
    BitNot,
    Mulw,
    Return,
    Pop,
    Dup,
}

impl Op {
    pub fn opcode(self) -> u8 {
        match self {
            Op::Err => 0x00,
            Op::Sha256 => 0x01,
            Op::Keccak256 => 0x02,
            Op::Sha512_256 => 0x03,
            Op::Ed25519Verify => 0x04,
            Op::Add => 0x08,
            Op::Sub => 0x09,
            Op::Div => 0x0a,
            Op::Mul => 0x0b,
            Op::Lt => 0x0c,
            Op::Gt => 0x0d,
            Op::Le => 0x0e,
            Op::Ge => 0x0f,
            Op::And => 0x10,
            Op::Or => 0x11,
            Op::Eq => 0x12,
            Op::Ne => 0x13,
            Op::Not => 0x14,
            Op::Len => 0x15,
            Op::Itob => 0x16,
            Op::Btoi => 0x17,
            Op::Mod => 0x18,
            Op::BitOr => 0x19,
            Op::BitAnd => 0x1a,
            Op::BitXor => 0x1b,
            Op::BitNot => 0x1c,
            Op::Mulw => 0x1d,
            Op::Return => 0x43,
            Op::Pop => 0x48,
            Op::Dup => 0x49,
        }
    }
}

/// Fields readable with `txn` and `gtxn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TxnField {
    Sender = 0,
    Fee = 1,
    FirstValid = 2,
    FirstValidTime = 3,
    LastValid = 4,
    Note = 5,
    Lease = 6,
    Receiver = 7,
    Amount = 8,
    CloseRemainderTo = 9,
    VotePK = 10,
    SelectionPK = 11,
    VoteFirst = 12,
    VoteLast = 13,
    VoteKeyDilution = 14,
    Type = 15,
    TypeEnum = 16,
    XferAsset = 17,
    AssetAmount = 18,
    AssetSender = 19,
    AssetReceiver = 20,
    AssetCloseTo = 21,
    GroupIndex = 22,
    TxID = 23,
    RekeyTo = 32,
}

/// Lowest program version that can read txn field `index`, or `None` if
/// the field is unknown. Indices 24..32 are application fields, which
/// predicate programs never read.
pub fn txn_field_version(index: u8) -> Option<u64> {
    match index {
        0..=23 => Some(1),
        32 => Some(2),
        _ => None,
    }
}

/// Fields readable with `global`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GlobalField {
    MinTxnFee = 0,
    MinBalance = 1,
    MaxTxnLife = 2,
    ZeroAddress = 3,
    GroupSize = 4,
}

pub const GLOBAL_FIELD_COUNT: u8 = 5;
