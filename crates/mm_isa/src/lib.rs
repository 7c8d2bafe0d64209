//! Instruction-set description for the eight model machines: what opcodes they
//! have, how wide their operands are, and what each opcode means. This crate
//! has no notion of execution; it is pure data, consumed by the loader,
//! assembler, and control unit alike so they never disagree about what an
//! opcode is.

mod machine;
mod predicate;
mod semantics;
mod table;

pub use machine::{MachineConfig, MachineId, StackPolicy};
pub use predicate::Predicate;
pub use semantics::{AddrMode, ArithOp, Semantics};
pub use table::{by_mnemonic, by_opcode, table, InstructionDesc, HALT_OPCODE};
