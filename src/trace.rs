use log::debug;

use mm_core::{ControlUnit, Debugger};

/// Debugger hook used by `mmach debug`: logs the program counter and flags
/// before and after every instruction instead of running silently to halt.
#[derive(Default)]
pub struct StepTracer;

impl Debugger for StepTracer {
    fn before_step(&mut self, cpu: &ControlUnit) {
        debug!("pc={:#06x} flags={:?}", cpu.pc(), cpu.flags());
    }

    fn after_step(&mut self, cpu: &ControlUnit, at: u16) -> bool {
        debug!("executed {:#06x}, pc now {:#06x}", at, cpu.pc());
        false
    }
}
