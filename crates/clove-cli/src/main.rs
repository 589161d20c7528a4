//! `clove` — CLI principal
//!
//! Ici on fait uniquement : parsing d'arguments, initialisation (logger,
//! couleur), et délégation à `clove_cli` (lib).

use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use clove_cli::{self as cli, repl::ReplTask, AsmTask, DisasmTask, RunTask};

// ──────────────────────────── CLI (clap) ────────────────────────────

#[derive(Debug, Parser)]
#[command(
    name = "clove",
    version,
    about = "Clove — bytecode VM: run scripts, REPL, disassemble, assemble",
    long_about = None,
    args_conflicts_with_subcommands = true
)]
struct Opt {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long = "quiet", action = ArgAction::SetTrue, global = true)]
    quiet: bool,

    /// When to colour status lines
    #[arg(long = "color", value_enum, default_value_t = ColorChoice::Auto, global = true)]
    color: ColorChoice,

    #[command(subcommand)]
    cmd: Option<Command>,

    /// Script to run (same as `clove run <PATH>`); starts the REPL when omitted
    path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile and run a script
    Run {
        /// Script path
        path: PathBuf,
        /// Trace every dispatched instruction (needs the `trace` log level)
        #[arg(long)]
        trace: bool,
        /// Report compile and run time
        #[arg(long)]
        time: bool,
    },

    /// Interactive loop, one expression per line
    Repl {
        /// Prompt
        #[arg(long, default_value = "> ")]
        prompt: String,
        /// Trace every dispatched instruction
        #[arg(long)]
        trace: bool,
    },

    /// Compile a script and print its bytecode listing
    Disasm {
        /// Script path
        path: PathBuf,
    },

    /// Assemble a text chunk and run it
    Asm {
        /// Assembly listing path
        path: PathBuf,
        /// Trace every dispatched instruction
        #[arg(long)]
        trace: bool,
        /// Print the listing before running
        #[arg(long)]
        disasm: bool,
    },
}

impl Command {
    const fn wants_trace(&self) -> bool {
        match self {
            Command::Run { trace, .. } | Command::Repl { trace, .. } | Command::Asm { trace, .. } => *trace,
            Command::Disasm { .. } => false,
        }
    }
}

// ──────────────────────────── Logger / Couleur ────────────────────────────

fn init_telemetry(verbose: u8, quiet: bool, trace: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let mut filter = std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_string());
    if trace {
        filter.push_str(",clove_vm=trace");
    }
    std::env::set_var("RUST_LOG", filter);
    cli::init_logger();
}

fn init_color(choice: ColorChoice) {
    match choice {
        ColorChoice::Auto => {}
        ColorChoice::Always => {
            std::env::set_var("CLICOLOR_FORCE", "1");
            std::env::remove_var("NO_COLOR");
        }
        ColorChoice::Never => {
            std::env::set_var("NO_COLOR", "1");
            std::env::remove_var("CLICOLOR_FORCE");
        }
    }
}

// ──────────────────────────── main ────────────────────────────

fn main() -> ExitCode {
    match real_main() {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn real_main() -> Result<u8> {
    let opt = Opt::parse();

    init_color(opt.color);
    init_telemetry(opt.verbose, opt.quiet, opt.cmd.as_ref().is_some_and(Command::wants_trace));

    let command = match (opt.cmd, opt.path) {
        (Some(Command::Run { path, trace, time }), _) => cli::Command::Run(RunTask { path, trace, time }),
        (Some(Command::Repl { prompt, trace }), _) => cli::Command::Repl(ReplTask { prompt, trace }),
        (Some(Command::Disasm { path }), _) => cli::Command::Disasm(DisasmTask { path }),
        (Some(Command::Asm { path, trace, disasm }), _) => cli::Command::Asm(AsmTask { path, trace, disasm }),
        (None, Some(path)) => cli::Command::Run(RunTask { path, ..RunTask::default() }),
        (None, None) => cli::Command::Repl(ReplTask::default()),
    };

    cli::execute(command).context("command failed")
}
