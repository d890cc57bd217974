//! A small stack evaluator for the opcodes the templates emit, so tests can
//! check that helper-built transactions actually satisfy their program.
//!
//! Mirrors the network's rules for the subset it covers: arithmetic
//! overflow and type mismatches fail the program, and a program passes
//! only if it ends with exactly one non-zero integer on the stack.

#![allow(dead_code)]

use algo_protocol::crypto::{keccak256, sha256, Address};
use algo_protocol::network::SuggestedParams;
use algo_protocol::transaction::{Authorization, SignedTransaction, Transaction, TxnKind};

#[derive(Debug, Clone, PartialEq, Eq)]
enum StackValue {
    Uint(u64),
    Bytes(Vec<u8>),
}

fn read_uvarint(bytes: &[u8], pc: &mut usize) -> Result<u64, String> {
    let mut n = 0u64;
    for shift in (0..64).step_by(7) {
        let b = *bytes.get(*pc).ok_or("truncated varint")?;
        *pc += 1;
        n |= u64::from(b & 0x7f) << shift;
        if b & 0x80 == 0 {
            return Ok(n);
        }
    }
    Err("varint too long".to_string())
}

fn txn_field(group: &[Transaction], index: usize, field: u8) -> Result<StackValue, String> {
    use StackValue::{Bytes, Uint};

    let txn = group.get(index).ok_or("group index out of range")?;
    let zero = || Bytes(vec![0; 32]);
    let (pay, axfer) = match &txn.kind {
        TxnKind::Payment(p) => (Some(p), None),
        TxnKind::AssetTransfer(a) => (None, Some(a)),
        _ => (None, None),
    };
    Ok(match field {
        0 => Bytes(txn.sender().as_bytes().to_vec()),
        1 => Uint(txn.header.fee),
        2 => Uint(txn.header.first_valid),
        4 => Uint(txn.header.last_valid),
        5 => Bytes(txn.header.note.clone()),
        6 => Bytes(txn.header.lease.unwrap_or([0; 32]).to_vec()),
        7 => pay.map_or_else(zero, |p| Bytes(p.receiver.as_bytes().to_vec())),
        8 => Uint(pay.map_or(0, |p| p.amount)),
        9 => pay
            .and_then(|p| p.close_remainder_to)
            .map_or_else(zero, |a| Bytes(a.as_bytes().to_vec())),
        16 => Uint(txn.tx_type().type_enum()),
        17 => Uint(axfer.map_or(0, |a| a.asset_index)),
        18 => Uint(axfer.map_or(0, |a| a.amount)),
        19 => axfer
            .and_then(|a| a.revocation_target)
            .map_or_else(zero, |a| Bytes(a.as_bytes().to_vec())),
        20 => axfer.map_or_else(zero, |a| Bytes(a.receiver.as_bytes().to_vec())),
        21 => axfer
            .and_then(|a| a.close_to)
            .map_or_else(zero, |a| Bytes(a.as_bytes().to_vec())),
        22 => Uint(index as u64),
        32 => txn
            .header
            .rekey_to
            .map_or_else(zero, |a| Bytes(a.as_bytes().to_vec())),
        other => return Err(format!("txn field {other} not supported")),
    })
}

/// Run `program` for member `index` of `group` with `args`.
pub fn eval(
    program: &[u8],
    args: &[Vec<u8>],
    group: &[Transaction],
    index: usize,
) -> Result<bool, String> {
    use StackValue::{Bytes, Uint};

    let mut pc = 0usize;
    read_uvarint(program, &mut pc)?;
    let mut ints: Vec<u64> = Vec::new();
    let mut bytes: Vec<Vec<u8>> = Vec::new();
    let mut stack: Vec<StackValue> = Vec::new();

    let byte_at = |pc: usize| program.get(pc).copied().ok_or("truncated immediate");

    macro_rules! pop_uint {
        () => {
            match stack.pop() {
                Some(Uint(n)) => n,
                other => return Err(format!("expected uint, got {other:?}")),
            }
        };
    }
    macro_rules! pop_bytes {
        () => {
            match stack.pop() {
                Some(Bytes(b)) => b,
                other => return Err(format!("expected bytes, got {other:?}")),
            }
        };
    }

    while pc < program.len() {
        let opcode = program[pc];
        pc += 1;
        match opcode {
            0x20 => {
                let count = read_uvarint(program, &mut pc)?;
                ints = (0..count)
                    .map(|_| read_uvarint(program, &mut pc))
                    .collect::<Result<_, _>>()?;
            }
            0x26 => {
                let count = read_uvarint(program, &mut pc)?;
                bytes.clear();
                for _ in 0..count {
                    let len = read_uvarint(program, &mut pc)? as usize;
                    let b = program.get(pc..pc + len).ok_or("truncated bytecblock")?;
                    bytes.push(b.to_vec());
                    pc += len;
                }
            }
            0x21 => {
                let i = byte_at(pc)? as usize;
                pc += 1;
                stack.push(Uint(*ints.get(i).ok_or("intc out of range")?));
            }
            0x22..=0x25 => {
                let i = (opcode - 0x22) as usize;
                stack.push(Uint(*ints.get(i).ok_or("intc out of range")?));
            }
            0x27 => {
                let i = byte_at(pc)? as usize;
                pc += 1;
                stack.push(Bytes(bytes.get(i).ok_or("bytec out of range")?.clone()));
            }
            0x28..=0x2b => {
                let i = (opcode - 0x28) as usize;
                stack.push(Bytes(bytes.get(i).ok_or("bytec out of range")?.clone()));
            }
            0x2c => {
                let i = byte_at(pc)? as usize;
                pc += 1;
                stack.push(Bytes(args.get(i).ok_or("missing arg")?.clone()));
            }
            0x2d..=0x30 => {
                let i = (opcode - 0x2d) as usize;
                stack.push(Bytes(args.get(i).ok_or("missing arg")?.clone()));
            }
            0x31 => {
                let field = byte_at(pc)?;
                pc += 1;
                stack.push(txn_field(group, index, field)?);
            }
            0x32 => {
                let field = byte_at(pc)?;
                pc += 1;
                stack.push(match field {
                    0 => Uint(1_000),
                    3 => Bytes(vec![0; 32]),
                    4 => Uint(group.len() as u64),
                    other => return Err(format!("global field {other} not supported")),
                });
            }
            0x33 => {
                let member = byte_at(pc)? as usize;
                let field = byte_at(pc + 1)?;
                pc += 2;
                stack.push(txn_field(group, member, field)?);
            }
            0x01 => {
                let b = pop_bytes!();
                stack.push(Bytes(sha256(&b).to_vec()));
            }
            0x02 => {
                let b = pop_bytes!();
                stack.push(Bytes(keccak256(&b).to_vec()));
            }
            0x08 | 0x09 | 0x0b | 0x0c | 0x0d | 0x0e | 0x0f | 0x10 | 0x11 | 0x18 => {
                let b = pop_uint!();
                let a = pop_uint!();
                let r = match opcode {
                    0x08 => a.checked_add(b).ok_or("+ overflowed")?,
                    0x09 => a.checked_sub(b).ok_or("- underflowed")?,
                    0x0b => a.checked_mul(b).ok_or("* overflowed")?,
                    0x0c => u64::from(a < b),
                    0x0d => u64::from(a > b),
                    0x0e => u64::from(a <= b),
                    0x0f => u64::from(a >= b),
                    0x10 => u64::from(a != 0 && b != 0),
                    0x11 => u64::from(a != 0 || b != 0),
                    _ => a.checked_rem(b).ok_or("% by zero")?,
                };
                stack.push(Uint(r));
            }
            0x12 | 0x13 => {
                let b = stack.pop().ok_or("stack underflow")?;
                let a = stack.pop().ok_or("stack underflow")?;
                if std::mem::discriminant(&a) != std::mem::discriminant(&b) {
                    return Err("comparing values of different types".to_string());
                }
                let eq = a == b;
                stack.push(Uint(u64::from(if opcode == 0x12 { eq } else { !eq })));
            }
            0x14 => {
                let a = pop_uint!();
                stack.push(Uint(u64::from(a == 0)));
            }
            0x40..=0x42 => {
                let offset = u16::from_be_bytes([byte_at(pc)?, byte_at(pc + 1)?]) as usize;
                pc += 2;
                let jump = match opcode {
                    0x40 => pop_uint!() != 0,
                    0x41 => pop_uint!() == 0,
                    _ => true,
                };
                if jump {
                    pc += offset;
                }
            }
            0x43 => {
                let a = pop_uint!();
                return Ok(a != 0);
            }
            other => return Err(format!("opcode {other:#04x} not supported")),
        }
    }

    match stack.as_slice() {
        [Uint(n)] => Ok(*n != 0),
        other => Err(format!("program ended with stack {other:?}")),
    }
}

/// Every logic-signed member of `group` passes its program, and the
/// members agree on one group id when there is more than one.
pub fn accepted(group: &[SignedTransaction]) -> Result<bool, String> {
    let txns: Vec<Transaction> = group.iter().map(|s| s.txn.clone()).collect();
    if txns.len() > 1 {
        let gid = txns[0].group().copied().ok_or("first member has no group id")?;
        if txns.iter().any(|t| t.group() != Some(&gid)) {
            return Ok(false);
        }
    }
    for (index, stx) in group.iter().enumerate() {
        if let Authorization::Logic(lsig) = &stx.auth {
            if !eval(lsig.program(), lsig.args(), &txns, index)? {
                return Ok(false);
            }
        }
        if stx.verify().is_err() {
            return Ok(false);
        }
    }
    Ok(true)
}

/// The group's transactions with member `index` rekeying its sender to `to`.
pub fn with_rekey(group: &[SignedTransaction], index: usize, to: Address) -> Vec<Transaction> {
    let mut txns: Vec<Transaction> = group.iter().map(|s| s.txn.clone()).collect();
    txns[index].header.rekey_to = Some(to);
    txns
}

/// Whether member `index`'s logic signature accepts it within `txns`,
/// which may differ from what was signed.
pub fn program_accepts(
    group: &[SignedTransaction],
    txns: &[Transaction],
    index: usize,
) -> Result<bool, String> {
    match &group[index].auth {
        Authorization::Logic(lsig) => eval(lsig.program(), lsig.args(), txns, index),
        other => Err(format!("member {index} is not logic-signed: {other:?}")),
    }
}

/// Suggested parameters for a window of rounds.
pub fn params(first_valid: u64, last_valid: u64) -> SuggestedParams {
    SuggestedParams {
        fee: 0,
        first_valid,
        last_valid,
        genesis_id: "templates-v1".to_string(),
        genesis_hash: Some([0x47; 32]),
        flat_fee: false,
    }
}
