//! clove-cli — bibliothèque interne du binaire `clove`
//!
//! Le parsing d’arguments reste dans `main.rs` ; ici on trouve les tâches
//! (exécuter, désassembler, assembler, REPL), les codes de sortie et les
//! petites sorties colorées.

#![deny(unused_must_use)]

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::Result;
use clove_core::disasm::disassemble_chunk;
use clove_vm::{Vm, VmOptions};

#[cfg(feature = "color")]
use owo_colors::OwoColorize;

pub mod repl;

/// Successful run.
pub const EX_OK: u8 = 0;
/// The input could not be compiled or assembled (sysexits `EX_DATAERR`).
pub const EX_DATAERR: u8 = 65;
/// The program failed at runtime (sysexits `EX_SOFTWARE`).
pub const EX_SOFTWARE: u8 = 70;
/// The input file could not be read (sysexits `EX_IOERR`).
pub const EX_IOERR: u8 = 74;

// ───────────────────────────── Types publics ─────────────────────────────

/// High-level command, already parsed.
#[derive(Clone, Debug)]
pub enum Command {
    /// Compile and run a script.
    Run(RunTask),
    /// Interactive loop.
    Repl(repl::ReplTask),
    /// Compile a script and print its disassembly.
    Disasm(DisasmTask),
    /// Assemble a text chunk and run it.
    Asm(AsmTask),
}

/// `clove run`.
#[derive(Clone, Debug, Default)]
pub struct RunTask {
    /// Script path.
    pub path: PathBuf,
    /// Per-instruction execution trace.
    pub trace: bool,
    /// Report compile and run durations.
    pub time: bool,
}

/// `clove disasm`.
#[derive(Clone, Debug, Default)]
pub struct DisasmTask {
    /// Script path.
    pub path: PathBuf,
}

/// `clove asm`.
#[derive(Clone, Debug, Default)]
pub struct AsmTask {
    /// Assembly listing path.
    pub path: PathBuf,
    /// Per-instruction execution trace.
    pub trace: bool,
    /// Print the disassembly before running.
    pub disasm: bool,
}

// ───────────────────────────── Initialisation ─────────────────────────────

/// Install `env_logger`; `tracing` events reach it through the `log` bridge.
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_secs()
        .try_init();
}

// ───────────────────────────── Exécution ─────────────────────────────

/// Execute a command and return the process exit status.
pub fn execute(cmd: Command) -> Result<u8> {
    match cmd {
        Command::Run(t) => Ok(run_entry(&t)),
        Command::Repl(t) => repl::run(&t),
        Command::Disasm(t) => Ok(disasm_entry(&t)),
        Command::Asm(t) => Ok(asm_entry(&t)),
    }
}

fn vm_for(trace: bool) -> Vm { Vm::with_options(VmOptions { trace_execution: trace, ..VmOptions::default() }) }

fn run_entry(task: &RunTask) -> u8 {
    let Some(source) = read_source(&task.path) else { return EX_IOERR };
    log::info!("running {}", display(&task.path));
    run_source(&mut vm_for(task.trace), &source, task.time)
}

/// Compile and run `source` on `vm`, mapping the outcome to an exit status.
/// Compile diagnostics and runtime errors go to the VM's stderr sink.
pub fn run_source(vm: &mut Vm, source: &str, time: bool) -> u8 {
    let started = Instant::now();
    let compiled = vm.compile(source);
    let compile_time = started.elapsed();

    let chunk = match compiled {
        Ok(chunk) => chunk,
        Err(err) => {
            vm.report_error(&err);
            return EX_DATAERR;
        }
    };

    let started = Instant::now();
    let outcome = vm.interpret_chunk(&chunk);
    if time {
        status_info(
            "TIME",
            &format!("compile: {}, run: {}", human_duration(compile_time), human_duration(started.elapsed())),
        );
    }

    match outcome {
        Ok(()) => EX_OK,
        Err(err) => err.exit_code(),
    }
}

fn disasm_entry(task: &DisasmTask) -> u8 {
    let Some(source) = read_source(&task.path) else { return EX_IOERR };
    let mut vm = Vm::new();
    match disassemble_source(&mut vm, &source, &display(&task.path)) {
        Some(listing) => {
            print!("{listing}");
            EX_OK
        }
        None => EX_DATAERR,
    }
}

/// Compile `source` and return its listing under a `== name ==` header, or
/// `None` after reporting the compile error on the VM's stderr sink.
pub fn disassemble_source(vm: &mut Vm, source: &str, name: &str) -> Option<String> {
    match vm.compile(source) {
        Ok(chunk) => Some(disassemble_chunk(&chunk, vm.heap(), name)),
        Err(err) => {
            vm.report_error(&err);
            None
        }
    }
}

fn asm_entry(task: &AsmTask) -> u8 {
    let Some(text) = read_source(&task.path) else { return EX_IOERR };
    run_assembly(&mut vm_for(task.trace), &text, &display(&task.path), task.disasm)
}

/// Assemble `text`, optionally print its listing, then run it.
pub fn run_assembly(vm: &mut Vm, text: &str, name: &str, show_disasm: bool) -> u8 {
    let chunk = match vm.assemble(text) {
        Ok(chunk) => chunk,
        Err(err) => {
            vm.report_error(&format_args!("{name}: {err}"));
            return EX_DATAERR;
        }
    };
    if show_disasm {
        print!("{}", disassemble_chunk(&chunk, vm.heap(), name));
    }
    match vm.interpret_chunk(&chunk) {
        Ok(()) => EX_OK,
        Err(err) => err.exit_code(),
    }
}

// ───────────────────────────── Utilitaires E/S ─────────────────────────────

fn read_source(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(source) => Some(source),
        Err(err) => {
            report_unreadable(path, &err);
            None
        }
    }
}

fn report_unreadable(path: &Path, err: &io::Error) {
    log::debug!("read failed: {err:?}");
    status_err("ERROR", &format!("Could not open file \"{}\": {err}.", display(path)));
}

fn display(p: &Path) -> String { p.to_string_lossy().to_string() }

/// Short human rendering of a duration (`850 µs`, `12 ms`, `1.250 s`).
pub fn human_duration(d: Duration) -> String {
    let us = d.as_micros();
    if us < 1_000 {
        return format!("{us} µs");
    }
    let ms = d.as_millis();
    if ms < 1_000 {
        return format!("{ms} ms");
    }
    format!("{:.3} s", d.as_secs_f64())
}

// ───────────────────────────── Sorties jolies ─────────────────────────────

pub(crate) fn status_info(tag: &str, msg: &str) {
    #[cfg(feature = "color")]
    {
        eprintln!("{} {}", tag.blue().bold(), msg);
    }
    #[cfg(not(feature = "color"))]
    {
        eprintln!("{tag} {msg}");
    }
}

pub(crate) fn status_err(tag: &str, msg: &str) {
    #[cfg(feature = "color")]
    {
        eprintln!("{} {}", tag.red().bold(), msg);
    }
    #[cfg(not(feature = "color"))]
    {
        eprintln!("{tag} {msg}");
    }
}

// ───────────────────────────── Tests ─────────────────────────────
