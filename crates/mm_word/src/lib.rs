//! Fixed-width two's-complement integers and the flags they produce.
//!
//! This is the innermost layer of the emulator: every model machine, no matter how
//! it addresses memory or shapes its instructions, bottoms out in arithmetic on a
//! [`Word`] of some declared bit width.

mod error;
mod flags;
mod word;

pub use error::{ArithError, WidthMismatch};
pub use flags::Flags;
pub use word::Word;
