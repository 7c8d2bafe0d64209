//! Turns a [`mm_fmt::ParsedProgram`] into a running machine: builds the RAM
//! and register file for its target architecture, loads the program image,
//! binds input values, runs it to completion, and collects output values.

mod error;
mod run;
#[cfg(test)]
mod test;

pub use error::LoadError;
pub use run::{load_and_run, load_and_run_with_debugger, RunOutcome};
