//! Arithmétique de bout en bout : chunk construit à la main, source compilée,
//! division par zéro.

use clove_core::{Chunk, OpCode, Value};
use clove_tests::{run, session};
use pretty_assertions::assert_eq;

fn push_constant(chunk: &mut Chunk, n: f64, line: u32) {
    let k = chunk.add_constant(Value::Number(n));
    chunk.write_op(OpCode::Constant, line);
    chunk.write(u8::try_from(k).unwrap(), line);
}

#[test]
fn hand_built_chunk_prints_the_negated_quotient() {
    let (mut vm, out, err) = session();
    let mut chunk = Chunk::new();
    push_constant(&mut chunk, 1.2, 1);
    push_constant(&mut chunk, 3.4, 1);
    chunk.write_op(OpCode::Add, 1);
    push_constant(&mut chunk, 5.6, 1);
    chunk.write_op(OpCode::Divide, 1);
    chunk.write_op(OpCode::Negate, 1);
    chunk.write_op(OpCode::Return, 1);
    chunk.write_op(OpCode::Return, 2);

    vm.interpret_chunk(&chunk).unwrap();
    assert_eq!(out.get(), "-0.8214285714285714\n");
    assert_eq!(err.get(), "");
    assert_eq!(vm.stack_len(), 0);
}

#[test]
fn compiled_source_matches_the_hand_built_chunk() {
    let outcome = run("-((1.2 + 3.4) / 5.6)");
    assert!(outcome.result.is_ok());
    assert_eq!(outcome.out, "-0.8214285714285714\n");
}

#[test]
fn precedence_and_associativity() {
    for (source, expected) in [
        ("1 + 2 * 3", "7"),
        ("(1 + 2) * 3", "9"),
        ("10 - 4 - 3", "3"),
        ("2 * 3 / 4", "1.5"),
        ("--5", "5"),
        ("-2 * -3", "6"),
        ("1 < 2 == 3 > 4", "false"),
        ("!(5 - 4 > 3 * 2 == !nil)", "true"),
    ] {
        let outcome = run(source);
        assert!(outcome.result.is_ok(), "{source}: {}", outcome.err);
        assert_eq!(outcome.out, format!("{expected}\n"), "{source}");
    }
}

#[test]
fn lowered_comparisons() {
    for (source, expected) in [
        ("1 != 2", "true"),
        ("2 != 2", "false"),
        ("2 <= 2", "true"),
        ("3 <= 2", "false"),
        ("2 >= 3", "false"),
        ("3 >= 3", "true"),
    ] {
        assert_eq!(run(source).out, format!("{expected}\n"), "{source}");
    }
}

#[test]
fn division_by_zero_follows_ieee754() {
    let (mut vm, out, err) = session();
    for source in ["1 / 0", "-1 / 0", "0 / 0"] {
        vm.interpret(source).unwrap();
    }
    assert_eq!(out.get(), "inf\n-inf\nNaN\n");
    assert_eq!(err.get(), "");
}
