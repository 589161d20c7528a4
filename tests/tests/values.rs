//! Égalité structurelle et véracité.

use clove_core::{Heap, Value};
use clove_tests::{run, session};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[test]
fn equality_is_reflexive_except_for_nan() {
    let heap = Heap::new();
    assert!(heap.values_equal(Value::Nil, Value::Nil));
    assert!(heap.values_equal(Value::Bool(true), Value::Bool(true)));
    assert!(heap.values_equal(Value::Bool(false), Value::Bool(false)));
    assert!(!heap.values_equal(Value::Number(f64::NAN), Value::Number(f64::NAN)));
    assert!(heap.values_equal(Value::Number(0.0), Value::Number(-0.0)));
    assert!(!heap.values_equal(Value::Nil, Value::Bool(false)));
    assert!(!heap.values_equal(Value::Number(0.0), Value::Bool(false)));
}

#[test]
fn nan_through_the_vm() {
    let (mut vm, out, _) = session();
    vm.interpret("0 / 0 == 0 / 0").unwrap();
    vm.interpret("1 / 0 == 2 / 0").unwrap();
    assert_eq!(out.get(), "false\ntrue\n");
}

#[test]
fn not_follows_truthiness() {
    for (source, expected) in [
        ("!nil", "true"),
        ("!false", "true"),
        ("!true", "false"),
        ("!0", "false"),
        ("!\"\"", "false"),
        ("!\"text\"", "false"),
        ("!!nil", "false"),
    ] {
        assert_eq!(run(source).out, format!("{expected}\n"), "{source}");
    }
}

#[test]
fn not_on_assembled_chunks() {
    let (mut vm, out, _) = session();
    for text in ["NIL\nNOT\nRETURN", "FALSE\nNOT\nRETURN", "CONSTANT 0\nNOT\nRETURN", "CONSTANT \"\"\nNOT\nRETURN"] {
        let chunk = vm.assemble(text).unwrap();
        vm.interpret_chunk(&chunk).unwrap();
    }
    assert_eq!(out.get(), "true\ntrue\nfalse\nfalse\n");
}

proptest! {
    #[test]
    fn numbers_equal_themselves_unless_nan(x in any::<f64>()) {
        let heap = Heap::new();
        prop_assert_eq!(heap.values_equal(Value::Number(x), Value::Number(x)), !x.is_nan());
    }

    #[test]
    fn numbers_are_always_truthy(x in any::<f64>()) {
        prop_assert!(!Value::Number(x).is_falsey());
    }

    #[test]
    fn literal_equality(whole in 0u32..1_000_000, frac in 0u32..1000) {
        let outcome = run(&format!("{whole}.{frac} == {whole}.{frac}"));
        prop_assert_eq!(outcome.out, "true\n");
    }
}
