use log::debug;

use crate::control::{ControlUnit, StopReason};
use crate::debug::Debugger;
use crate::error::Error;

/// A runnable model machine: a [`ControlUnit`] plus the run loop that drives
/// it to completion, checking breakpoints and the debugger hook between every
/// instruction.
pub struct Machine {
    cpu: ControlUnit,
}

impl Machine {
    pub fn new(cpu: ControlUnit) -> Self {
        Self { cpu }
    }

    pub fn cpu(&self) -> &ControlUnit {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut ControlUnit {
        &mut self.cpu
    }

    /// Execute a single instruction.
    pub fn step(&mut self) -> Result<Option<StopReason>, Error> {
        self.cpu.step()
    }

    /// Run until halt, a step-limit trip, or a debugger-reported stop.
    pub fn run_until_halt_or_breakpoint(&mut self, debugger: &mut impl Debugger) -> Result<StopReason, Error> {
        loop {
            let at = self.cpu.pc();
            if debugger.breakpoints().contains(&at) {
                return Ok(StopReason::Breakpoint(at));
            }
            debugger.before_step(&self.cpu);
            if let Some(reason) = self.cpu.step()? {
                debug!("run stopped: {reason:?}");
                return Ok(reason);
            }
            if debugger.after_step(&self.cpu, at) {
                return Ok(StopReason::Breakpoint(self.cpu.pc()));
            }
        }
    }

    /// Run to completion with no debugger attached.
    pub fn run_to_halt(&mut self) -> Result<StopReason, Error> {
        self.run_until_halt_or_breakpoint(&mut ())
    }
}
