//! Parser for the `.mmach` program source format: directives plus raw hex
//! machine code, producing the image and I/O binding table the loader needs.
//! Knows nothing about how any opcode executes; that's `mm_isa`/`mm_core`'s
//! job.

mod emit;
mod error;
mod ir;
mod parse;

pub use emit::to_text;
pub use error::FormatError;
pub use ir::{Binding, BindingKind, ParsedProgram, Span};
pub use parse::parse;
