//! REPL Clove — une ligne par appel à `interpret`, sur une VM qui survit
//! aux erreurs.
//!
//! Commandes méta :
//!   :help          — aide
//!   :quit / :q     — quitte
//!   :disasm        — désassemble la dernière ligne compilée
//!   :time [on|off] — chrono compile/run par ligne

use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{anyhow, Result};
use clove_vm::{Vm, VmOptions};
use rustyline::{error::ReadlineError, history::DefaultHistory, Config as RLConfig, Editor};

use crate::{disassemble_source, run_source, status_info, EX_OK};

/// `clove repl`.
#[derive(Clone, Debug)]
pub struct ReplTask {
    /// Prompt shown before each line.
    pub prompt: String,
    /// Per-instruction execution trace.
    pub trace: bool,
}

impl Default for ReplTask {
    fn default() -> Self { Self { prompt: "> ".into(), trace: false } }
}

const HELP_TEXT: &str = "\
REPL commands:
  :help          show this help
  :quit / :q     leave the session
  :disasm        disassemble the last line compiled
  :time [on|off] report compile/run time per line
Anything else is compiled and run as an expression.";

/// What the loop should do after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next line.
    Continue,
    /// Leave the loop.
    Quit,
}

/// REPL state independent of the line editor.
pub struct Session {
    vm: Vm,
    last_source: Option<String>,
    timing: bool,
    out: Box<dyn Write + Send>,
}

impl Session {
    /// Session on `vm`; meta-command output goes to stdout.
    pub fn new(vm: Vm) -> Self { Self { vm, last_source: None, timing: false, out: Box::new(io::stdout()) } }

    /// Redirect meta-command output.
    #[must_use]
    pub fn with_meta_output<W: Write + Send + 'static>(mut self, out: W) -> Self {
        self.out = Box::new(out);
        self
    }

    /// The session's VM.
    pub const fn vm(&self) -> &Vm { &self.vm }

    /// Handle one input line: a meta command or an expression.
    pub fn handle_line(&mut self, line: &str) -> Flow {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Flow::Continue;
        }
        if trimmed.starts_with(':') {
            return self.meta(trimmed);
        }

        let status = run_source(&mut self.vm, line, self.timing);
        log::debug!("repl line finished with status {status}");
        self.last_source = Some(line.to_owned());
        Flow::Continue
    }

    fn meta(&mut self, cmd: &str) -> Flow {
        let mut parts = cmd.split_whitespace();
        let head = parts.next().unwrap_or_default();

        let reply = match head {
            ":q" | ":quit" => return Flow::Quit,
            ":help" => HELP_TEXT.to_owned(),
            ":disasm" => match self.last_source.clone() {
                Some(source) => match disassemble_source(&mut self.vm, &source, "<repl>") {
                    Some(listing) => listing.trim_end().to_owned(),
                    None => return Flow::Continue,
                },
                None => "(nothing compiled yet)".to_owned(),
            },
            ":time" => match parts.next() {
                None => format!("time = {}", if self.timing { "on" } else { "off" }),
                Some("on") => {
                    self.timing = true;
                    "time -> on".to_owned()
                }
                Some("off") => {
                    self.timing = false;
                    "time -> off".to_owned()
                }
                Some(_) => "usage: :time [on|off]".to_owned(),
            },
            other => format!("unknown command: {other}. Type :help"),
        };

        let _ = writeln!(self.out, "{reply}");
        Flow::Continue
    }
}

/// History file under the user's data directory.
pub fn history_path() -> Result<PathBuf> {
    let base = dirs::data_dir().ok_or_else(|| anyhow!("no data directory for this user"))?;
    Ok(base.join("clove").join("history"))
}

/// Run the interactive loop until EOF or `:quit`.
pub fn run(task: &ReplTask) -> Result<u8> {
    let history = history_path().ok();
    let config = RLConfig::builder()
        .history_ignore_dups(true)
        .map_err(|e| anyhow!("REPL configuration: {e}"))?
        .build();
    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(config)?;
    if let Some(path) = &history {
        let _ = rl.load_history(path);
    }

    status_info("clove", "REPL. Type :help for commands, :quit or Ctrl-D to leave.");
    let vm = Vm::with_options(VmOptions { trace_execution: task.trace, ..VmOptions::default() });
    let mut session = Session::new(vm);

    loop {
        let line = match rl.readline(&task.prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                eprintln!("(^C)");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(anyhow!("readline: {e}")),
        };

        if !line.trim().is_empty() {
            let _ = rl.add_history_entry(line.as_str());
        }
        if session.handle_line(&line) == Flow::Quit {
            break;
        }
    }

    if let Some(path) = &history {
        if let Some(dir) = path.parent() {
            let _ = fs::create_dir_all(dir);
        }
        let _ = rl.save_history(path);
    }
    Ok(EX_OK)
}
