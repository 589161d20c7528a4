//! Petits utilitaires partagés par les tests d'intégration.

use clove_vm::{Captured, Vm, VmOptions, VmResult};

/// Outcome of one `interpret` call on a fresh VM.
#[derive(Debug)]
pub struct Outcome {
    /// Result returned by `interpret`.
    pub result: VmResult,
    /// Everything written to stdout.
    pub out: String,
    /// Everything written to stderr.
    pub err: String,
}

/// Compile and run `source` on a fresh VM with captured output.
pub fn run(source: &str) -> Outcome {
    let (mut vm, out, err) = Vm::with_captured_output(VmOptions::default());
    let result = vm.interpret(source);
    Outcome { result, out: out.get(), err: err.get() }
}

/// A VM kept across several calls, plus its captured sinks.
pub fn session() -> (Vm, Captured, Captured) { Vm::with_captured_output(VmOptions::default()) }

/// Lox string literal for `text` (no escapes in the language, so `"` is rejected).
pub fn quoted(text: &str) -> String {
    assert!(!text.contains('"'), "string literals cannot contain quotes");
    format!("\"{text}\"")
}
