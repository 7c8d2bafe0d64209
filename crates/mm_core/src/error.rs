use mm_word::ArithError;
use mm_mem::MemError;

/// Everything that can stop a model machine mid-instruction. Distinct from
/// [`crate::control::StopReason`]: an `Error` is a guest program fault, a
/// `StopReason` also covers the normal, non-faulting ways a run can end.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("memory fault: {0}")]
    Memory(#[from] MemError),

    #[error("arithmetic fault: {0}")]
    Arith(#[from] ArithError),

    #[error("opcode {opcode:#04x} is not defined for this machine")]
    IllegalOpcode { opcode: u8 },

    #[error("stack underflow")]
    StackUnderflow,

    #[error("stack overflow")]
    StackOverflow,

    #[error("this machine has no stack")]
    NoStack,
}
