//! The shared fetch-decode-execute engine every model machine runs on: an
//! [`alu`], a [`control::ControlUnit`], and the [`machine::Machine`] run loop
//! that ties them together with a debugger hook.

pub mod alu;
mod control;
mod debug;
mod error;
mod machine;

pub use control::{ControlUnit, StopReason};
pub use debug::Debugger;
pub use error::Error;
pub use machine::Machine;
