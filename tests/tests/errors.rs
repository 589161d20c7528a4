//! Erreurs de compilation et d'exécution : rendu, ligne, remise à zéro.

use clove_compiler::CompileError;
use clove_core::{Chunk, OpCode, Value};
use clove_tests::{run, session};
use clove_vm::{InterpretError, RuntimeError, Vm, VmOptions};
use pretty_assertions::assert_eq;

#[test]
fn mixed_add_is_a_runtime_error_and_clears_the_stack() {
    let (mut vm, out, err) = session();
    let result = vm.interpret("1 + \"one\"");
    assert_eq!(
        result,
        Err(InterpretError::Runtime(RuntimeError {
            message: "Operands must be two numbers or two strings.".into(),
            line: Some(1),
        }))
    );
    assert_eq!(vm.stack_len(), 0);
    assert_eq!(out.get(), "");
    assert_eq!(err.get(), "Operands must be two numbers or two strings.\n[line 1] in script\n");
}

#[test]
fn the_vm_stays_usable_after_a_runtime_error() {
    let (mut vm, out, _) = session();
    assert!(vm.interpret("-true").is_err());
    assert!(vm.interpret("nil > 1").is_err());
    vm.interpret("1 + 1").unwrap();
    assert_eq!(out.get(), "2\n");
    assert_eq!(vm.stack_len(), 0);
}

#[test]
fn runtime_errors_name_the_operator_line() {
    let outcome = run("1 +\n\nnil");
    assert_eq!(outcome.err, "Operands must be two numbers or two strings.\n[line 3] in script\n");

    let outcome = run("-\n\"s\"");
    assert_eq!(outcome.err, "Operand must be a number.\n[line 2] in script\n");

    let outcome = run("(1 * 2)\n < \"x\"");
    assert_eq!(outcome.err, "Operands must be numbers.\n[line 2] in script\n");
}

#[test]
fn compile_errors_are_reported_and_nothing_runs() {
    let outcome = run("1 +");
    assert_eq!(outcome.err, "[line 1] Error at end: Expect expression.\n");
    assert_eq!(outcome.out, "");
    let Err(err @ InterpretError::Compile(_)) = outcome.result else { panic!("expected a compile error") };
    assert_eq!(err.exit_code(), 65);

    assert_eq!(run("(1\n+ 2").err, "[line 2] Error at end: Expect ')' after expression.\n");
    assert_eq!(run("1 2").err, "[line 1] Error at '2': Expect end of expression.\n");
    assert_eq!(run("\n@").err, "[line 2] Error: Unexpected character.\n");
    assert_eq!(run("\"open").err, "[line 1] Error: Unterminated string.\n");
}

#[test]
fn compile_error_value_lists_one_diagnostic() {
    let (mut vm, _, _) = session();
    let err: CompileError = vm.compile(")").unwrap_err();
    assert_eq!(err.diagnostics.len(), 1);
    assert_eq!(err.to_string(), "[line 1] Error at ')': Expect expression.");
}

#[test]
fn runtime_exit_code() {
    let Err(err) = run("-nil").result else { panic!("expected a runtime error") };
    assert_eq!(err.exit_code(), 70);
}

#[test]
fn deep_expressions_overflow_a_small_stack() {
    let (mut vm, _, err) = Vm::with_captured_output(VmOptions { stack_max: 2, ..VmOptions::default() });
    assert!(vm.interpret("(1 + 2) * 3 - 4").is_ok());
    assert!(vm.interpret("1 + (2 + 3)").is_err());
    assert_eq!(err.get(), "Stack overflow.\n[line 1] in script\n");
    assert_eq!(vm.stack_len(), 0);
}

#[test]
fn malformed_chunks_degrade_to_runtime_errors() {
    let (mut vm, _, err) = session();
    let chunk = vm.assemble("ADD\nRETURN").unwrap();
    assert!(vm.interpret_chunk(&chunk).is_err());
    let chunk = vm.assemble("BYTE 200").unwrap();
    assert!(vm.interpret_chunk(&chunk).is_err());
    assert_eq!(
        err.get(),
        "Stack underflow.\n[line 1] in script\nUnknown opcode 200.\n[line 1] in script\n"
    );
    vm.interpret("true").unwrap();
}

#[test]
fn runaway_nesting_is_rejected_at_compile_time() {
    let outcome = run(&"(".repeat(100_000));
    let Err(err) = outcome.result else { panic!("expected a compile error") };
    assert_eq!(err.exit_code(), 65);
    assert_eq!(outcome.err, "[line 1] Error at '(': Expression nests too deeply.\n");

    let nested = format!("{}1{}", "(".repeat(200), ")".repeat(200));
    assert_eq!(run(&nested).out, "1\n");
}

#[test]
fn constants_owned_by_another_vm_are_a_runtime_error() {
    let (mut owner, _, _) = session();
    let (mut vm, out, err) = session();
    let mut chunk = Chunk::new();
    let k = chunk.add_constant(Value::Obj(owner.copy_string(b"x")));
    chunk.write_op(OpCode::Constant, 4);
    chunk.write(u8::try_from(k).unwrap(), 4);
    chunk.write_op(OpCode::Return, 4);

    let Err(result) = vm.interpret_chunk(&chunk) else { panic!("expected a runtime error") };
    assert_eq!(result.exit_code(), 70);
    assert_eq!(err.get(), "Constant 0 refers to an object of another heap.\n[line 4] in script\n");
    assert_eq!(out.get(), "");
    vm.interpret("\"still\" + \" usable\"").unwrap();
    assert_eq!(out.get(), "still usable\n");
}
