use crate::control::ControlUnit;

/// Observer hooks a host program can plug into [`crate::machine::Machine::run`]
/// to drive a debugger: single-stepping, inspecting state between
/// instructions, and stopping at breakpoints.
pub trait Debugger {
    /// Called before each instruction is fetched.
    fn before_step(&mut self, _cpu: &ControlUnit) {}

    /// Called after each instruction executes, with the address it started at.
    /// Returning `true` stops the run, the same as hitting a breakpoint.
    fn after_step(&mut self, _cpu: &ControlUnit, _at: u16) -> bool {
        false
    }

    /// Addresses execution should stop before continuing past.
    fn breakpoints(&self) -> &[u16] {
        &[]
    }
}

impl Debugger for () {
    fn after_step(&mut self, _cpu: &ControlUnit, _at: u16) -> bool {
        false
    }
}
