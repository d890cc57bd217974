//! # Logic Programs
//!
//! Stateless predicate programs that authorize transactions. The network
//! evaluates them; this crate only assembles, checks and signs them.
//!
//! ```text
//! opcodes.rs   - opcode table, costs, txn/global field enumerations
//! assembler.rs - ProgramBuilder: typed ops → bytecode with constant pools
//! check.rs     - static checks: version, opcodes, immediates, size, cost
//! logicsig.rs  - LogicSig: escrow and delegated authorization
//! ```

pub mod assembler;
pub mod check;
pub mod logicsig;
pub mod opcodes;

pub use assembler::ProgramBuilder;
pub use check::{check_program, program_cost};
pub use logicsig::{program_address, LogicSig};
pub use opcodes::{GlobalField, Op, TxnField};
