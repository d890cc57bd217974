//! Static sanity checks run before a program is signed or submitted.
//!
//! This is not an evaluator. It walks the bytecode once, confirming that
//! every opcode is known for the declared version, that immediates are in
//! bounds, and that the size and static cost fit the network's limits.

use super::assembler::read_uvarint;
use super::opcodes::{lookup, txn_field_version, Immediate, GLOBAL_FIELD_COUNT};
use crate::config::{LOGIC_SIG_MAX_COST, LOGIC_SIG_MAX_SIZE, LOGIC_SIG_VERSION};
use crate::error::ValidationError;

/// Validate `program` together with the arguments it will run with.
pub fn check_program(program: &[u8], args: &[Vec<u8>]) -> Result<(), ValidationError> {
    program_cost(program, args).map(|_| ())
}

/// Static cost of `program`, after the same checks as [`check_program`].
pub fn program_cost(program: &[u8], args: &[Vec<u8>]) -> Result<u64, ValidationError> {
    let invalid = |msg: String| ValidationError::InvalidProgram(msg);

    if program.is_empty() {
        return Err(invalid("empty program".to_string()));
    }
    let size = program.len() + args.iter().map(Vec::len).sum::<usize>();
    if size > LOGIC_SIG_MAX_SIZE {
        return Err(invalid(format!(
            "program and args are {size} bytes, limit is {LOGIC_SIG_MAX_SIZE}"
        )));
    }

    let (version, mut pc) =
        read_uvarint(program).ok_or_else(|| invalid("bad version varint".to_string()))?;
    if version == 0 || version > LOGIC_SIG_VERSION {
        return Err(invalid(format!("unsupported version {version}")));
    }

    let mut cost = 0u64;
    let mut int_consts = 0u64;
    let mut byte_consts = 0u64;

    while pc < program.len() {
        let opcode = program[pc];
        let spec = lookup(opcode)
            .ok_or_else(|| invalid(format!("unknown opcode {opcode:#04x} at {pc}")))?;
        if spec.min_version > version {
            return Err(invalid(format!(
                "{} at {pc} requires version {}",
                spec.name, spec.min_version
            )));
        }
        let at = pc;
        let truncated = move || invalid(format!("{} at {at} is truncated", spec.name));
        pc += 1;

        match spec.immediate {
            Immediate::None => {
                if let Some(i) = implicit_const_index(opcode, 0x22) {
                    if i >= int_consts {
                        return Err(invalid(format!("{} at {} out of range", spec.name, pc - 1)));
                    }
                }
                if let Some(i) = implicit_const_index(opcode, 0x28) {
                    if i >= byte_consts {
                        return Err(invalid(format!("{} at {} out of range", spec.name, pc - 1)));
                    }
                }
            }
            Immediate::Bytes(n) => {
                let imm = program.get(pc..pc + n).ok_or_else(truncated)?;
                let in_range = match spec.name {
                    "intc" => u64::from(imm[0]) < int_consts,
                    "bytec" => u64::from(imm[0]) < byte_consts,
                    "txn" => txn_field_version(imm[0]).is_some_and(|v| v <= version),
                    "gtxn" => txn_field_version(imm[1]).is_some_and(|v| v <= version),
                    "global" => imm[0] < GLOBAL_FIELD_COUNT,
                    _ => true,
                };
                if !in_range {
                    return Err(invalid(format!("{} at {} out of range", spec.name, pc - 1)));
                }
                pc += n;
            }
            Immediate::IntBlock => {
                let (count, used) = read_uvarint(&program[pc..]).ok_or_else(truncated)?;
                pc += used;
                for _ in 0..count {
                    let (_, used) = read_uvarint(&program[pc..]).ok_or_else(truncated)?;
                    pc += used;
                }
                int_consts = count;
            }
            Immediate::ByteBlock => {
                let (count, used) = read_uvarint(&program[pc..]).ok_or_else(truncated)?;
                pc += used;
                for _ in 0..count {
                    let (len, used) = read_uvarint(&program[pc..]).ok_or_else(truncated)?;
                    pc += used;
                    let end = usize::try_from(len)
                        .ok()
                        .and_then(|len| pc.checked_add(len))
                        .filter(|end| *end <= program.len())
                        .ok_or_else(truncated)?;
                    pc = end;
                }
                byte_consts = count;
            }
            Immediate::Branch => {
                let imm = program.get(pc..pc + 2).ok_or_else(truncated)?;
                let offset = usize::from(u16::from_be_bytes([imm[0], imm[1]]));
                pc += 2;
                // Landing exactly on the end is a clean exit.
                if pc + offset > program.len() {
                    return Err(invalid(format!("{} at {} jumps past the end", spec.name, pc - 3)));
                }
            }
        }
        cost += spec.cost;
    }

    if cost > LOGIC_SIG_MAX_COST {
        return Err(invalid(format!(
            "static cost {cost} exceeds {LOGIC_SIG_MAX_COST}"
        )));
    }
    Ok(cost)
}

fn implicit_const_index(opcode: u8, base: u8) -> Option<u64> {
    (base..base + 4).contains(&opcode).then(|| u64::from(opcode - base))
}
