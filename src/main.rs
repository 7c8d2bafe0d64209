//! Command-line front-end: parse or assemble a program, run it to
//! completion (or under a step-tracing debugger), and report its outputs.
//! The interesting work all lives in `mm_fmt`/`mm_masm`/`mm_loader`; this
//! binary is just the thin contract described for the external interface.

mod trace;

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::LevelFilter;

use mm_fmt::ParsedProgram;

#[derive(Parser)]
#[command(name = "mmach", author, version, about = "Model-machine emulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load and run a program to completion.
    Run(RunArgs),
    /// Load and run a program, tracing every step at debug level.
    Debug(RunArgs),
    /// Assemble a `.mmasm` source file into a `.mmach` image.
    Asm(AsmArgs),
}

#[derive(Parser)]
struct RunArgs {
    /// `.mmach` source file (or `.mmasm` for the modification machine).
    file: PathBuf,

    /// Input values to bind, overriding any inline `.enter` line. With
    /// neither present, values are read one per line from stdin.
    #[arg(long, num_args = 0.., allow_hyphen_values = true)]
    enter: Option<Vec<i64>>,

    /// Watchdog step budget before a run is declared non-halting.
    #[arg(long, default_value_t = 1_000_000)]
    step_limit: u64,
}

#[derive(Parser)]
struct AsmArgs {
    /// `.mmasm` source file.
    input: PathBuf,
    /// Where to write the assembled `.mmach` image.
    output: PathBuf,
}

fn main() -> ExitCode {
    env_logger::Builder::new()
        .format(|f, record| {
            use std::io::Write;
            writeln!(f, "{}: {}", record.level(), record.args())
        })
        .filter(None, LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(args, false),
        Command::Debug(args) => run(args, true),
        Command::Asm(args) => asm(args),
    }
}

fn load_program(path: &Path) -> Result<ParsedProgram, String> {
    let source = fs::read_to_string(path).map_err(|e| format!("can't read {}: {e}", path.display()))?;
    if path.extension().and_then(|e| e.to_str()) == Some("mmasm") {
        mm_masm::assemble(&source).map_err(|e| e.to_string())
    } else {
        mm_fmt::parse(&source).map_err(|e| e.to_string())
    }
}

fn gather_input(args: &RunArgs, program: &ParsedProgram) -> Result<Vec<i64>, String> {
    if let Some(values) = &args.enter {
        return Ok(values.clone());
    }
    if let Some(values) = &program.inline_enter {
        return Ok(values.clone());
    }

    let input_count = program.bindings.iter().filter(|b| b.kind == mm_fmt::BindingKind::Input).count();
    if input_count == 0 {
        return Ok(Vec::new());
    }

    let mut text = String::new();
    io::stdin().read_to_string(&mut text).map_err(|e| format!("failed reading stdin: {e}"))?;
    text.split_whitespace()
        .map(|t| t.parse::<i64>().map_err(|_| format!("{t:?} is not an integer")))
        .collect()
}

fn run(args: RunArgs, trace: bool) -> ExitCode {
    let program = match load_program(&args.file) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };

    let inputs = match gather_input(&args, &program) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };

    let outcome = if trace {
        let mut tracer = trace::StepTracer::default();
        mm_loader::load_and_run_with_debugger(&program, &inputs, Some(args.step_limit), &mut tracer)
    } else {
        mm_loader::load_and_run(&program, &inputs, Some(args.step_limit))
    };

    match outcome {
        Ok(outcome) => {
            for value in &outcome.outputs {
                println!("{value}");
            }
            match outcome.stop_reason {
                mm_core::StopReason::Halted => ExitCode::from(0),
                other => {
                    eprintln!("run stopped without halting: {other:?}");
                    ExitCode::from(1)
                }
            }
        }
        Err(mm_loader::LoadError::Cpu(e)) => {
            eprintln!("{e}");
            ExitCode::from(1)
        }
        Err(e) => {
            // Failed before execution ever started: a loader-time problem
            // (bad input values, not enough of them), not a control-unit fault.
            eprintln!("{e}");
            ExitCode::from(2)
        }
    }
}

fn asm(args: AsmArgs) -> ExitCode {
    let source = match fs::read_to_string(&args.input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("can't read {}: {e}", args.input.display());
            return ExitCode::from(2);
        }
    };

    let program = match mm_masm::assemble(&source) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };

    let text = mm_fmt::to_text(&program);
    match fs::write(&args.output, text) {
        Ok(()) => ExitCode::from(0),
        Err(e) => {
            eprintln!("can't write {}: {e}", args.output.display());
            ExitCode::from(2)
        }
    }
}
