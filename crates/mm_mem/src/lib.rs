//! The two memory shapes every model machine is built from: cell-addressable
//! [`Ram`] and the [`RegisterFile`] register bank.

mod error;
mod ram;
mod registers;

pub use error::MemError;
pub use ram::Ram;
pub use registers::{RegisterFile, RegisterId};
