//! A small two-pass assembler for the register-with-modification machine:
//! labels, `.config`/`.code`/`.word`/`.dump` directives, and the `label(reg)`
//! addressing form, producing the same [`mm_fmt::ParsedProgram`] the `.mmach`
//! parser does so the loader doesn't need to know which front end ran.

mod gen;
mod ir;
mod lex;
mod parse;

pub use ir::{DumpDirective, Item, Operand, Statement, WordDirective};

use std::fmt;

use mm_fmt::ParsedProgram;
use mm_isa::MachineId;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub struct Error {
    line: usize,
    message: String,
}

impl Error {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self { line, message: message.into() }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Assemble a `.mmasm` source string for the register-with-modification
/// machine.
pub fn assemble(source: &str) -> Result<ParsedProgram, Error> {
    let config = mm_isa::MachineConfig::for_machine(MachineId::RegisterModified);
    let items = parse::parse(source)?;
    gen::assemble(items, config.word_bits)
}
