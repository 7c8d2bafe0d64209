use log::info;

use mm_core::{ControlUnit, Debugger, Machine, StopReason};
use mm_fmt::{Binding, BindingKind, ParsedProgram};
use mm_isa::{MachineConfig, MachineId};
use mm_word::Word;

use crate::error::LoadError;

/// The outcome of loading and running a program to completion (or to a
/// watchdog trip). `outputs` is empty whenever the run didn't end in a
/// normal halt, per the "errors suppress output" rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub stop_reason: StopReason,
    pub outputs: Vec<i64>,
}

fn fits(value: i64, width: u32) -> bool {
    let min = -(1i64 << (width - 1));
    let max = (1i64 << (width - 1)) - 1;
    (min..=max).contains(&value) || (value >= 0 && value <= ((1u64 << width) - 1) as i64)
}

fn build_machine(program: &ParsedProgram, input_values: &[i64], step_limit: Option<u64>) -> Result<Machine, LoadError> {
    let config = MachineConfig::for_machine(program.machine_id);
    let mut cpu = ControlUnit::new(config);
    cpu.set_step_limit(step_limit);

    for span in &program.spans {
        cpu.ram_mut().load_span(span.address, &span.bytes);
    }

    bind_inputs(&mut cpu, program, input_values)?;
    Ok(Machine::new(cpu))
}

/// Build a machine from a parsed program, bind `input_values` to its input
/// slots, run it to completion, and collect output values on normal halt.
pub fn load_and_run(
    program: &ParsedProgram,
    input_values: &[i64],
    step_limit: Option<u64>,
) -> Result<RunOutcome, LoadError> {
    let mut machine = build_machine(program, input_values, step_limit)?;
    let stop_reason = machine.run_to_halt()?;
    info!("run stopped: {stop_reason:?}");

    let outputs = match stop_reason {
        StopReason::Halted => collect_outputs(machine.cpu(), program)?,
        _ => Vec::new(),
    };

    Ok(RunOutcome { stop_reason, outputs })
}

/// Same as [`load_and_run`], but drives the run through a debugger hook
/// instead of running straight to completion.
pub fn load_and_run_with_debugger(
    program: &ParsedProgram,
    input_values: &[i64],
    step_limit: Option<u64>,
    debugger: &mut dyn Debugger,
) -> Result<RunOutcome, LoadError> {
    let mut machine = build_machine(program, input_values, step_limit)?;
    let stop_reason = machine.run_until_halt_or_breakpoint(debugger)?;
    info!("run stopped: {stop_reason:?}");

    let outputs = match stop_reason {
        StopReason::Halted => collect_outputs(machine.cpu(), program)?,
        _ => Vec::new(),
    };

    Ok(RunOutcome { stop_reason, outputs })
}

fn bind_inputs(cpu: &mut ControlUnit, program: &ParsedProgram, input_values: &[i64]) -> Result<(), LoadError> {
    let inputs: Vec<&Binding> = program.bindings.iter().filter(|b| b.kind == BindingKind::Input).collect();
    if inputs.len() > input_values.len() {
        return Err(LoadError::NotEnoughInput { bindings: inputs.len(), values: input_values.len() });
    }

    let width = cpu.config().word_bits;
    for (index, binding) in inputs.iter().enumerate() {
        let value = input_values[index];
        if !fits(value, width) {
            return Err(LoadError::NumberOutOfRange { index, value, width });
        }
        let word = Word::from_signed(width, value);

        if program.machine_id == MachineId::StacklessZero {
            // No addressed store exists on this machine; input values are
            // pushed directly, in binding order, the same way a `push` opcode would.
            cpu.push_stack(word)?;
        } else {
            cpu.ram_mut().store(binding.address, word)?;
        }
    }
    Ok(())
}

fn collect_outputs(cpu: &ControlUnit, program: &ParsedProgram) -> Result<Vec<i64>, LoadError> {
    let outputs: Vec<&Binding> = program.bindings.iter().filter(|b| b.kind == BindingKind::Output).collect();

    if program.machine_id == MachineId::StacklessZero {
        let stack = cpu.stack().unwrap_or(&[]);
        let take = outputs.len().min(stack.len());
        return Ok(stack[stack.len() - take..].iter().map(|w| w.as_signed()).collect());
    }

    let width = cpu.config().word_bits;
    outputs
        .iter()
        .map(|binding| {
            let word = cpu.ram().fetch(binding.address, width).map_err(mm_core::Error::from)?;
            Ok(word.as_signed())
        })
        .collect()
}
