//! Concaténation : nouveau string alloué, opérandes intacts.

use clove_core::{Chunk, OpCode, Value};
use clove_tests::{quoted, run, session};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[test]
fn chained_concatenation_allocates_each_step() {
    let (mut vm, out, _) = session();
    vm.interpret("\"st\" + \"ri\" + \"ng\"").unwrap();
    assert_eq!(out.get(), "string\n");
    // three literals, two intermediate results
    assert_eq!(vm.heap().len(), 5);
}

#[test]
fn one_compiled_chunk_serves_several_sessions() {
    let (mut a, a_out, _) = session();
    let (mut b, b_out, _) = session();
    let chunk = a.compile("\"con\" + \"cat\" == \"concat\"").unwrap();

    b.copy_string(b"unrelated");
    b.copy_string(b"padding");
    for _ in 0..2 {
        b.interpret_chunk(&chunk).unwrap();
        a.interpret_chunk(&chunk).unwrap();
    }
    assert_eq!(a_out.get(), "true\ntrue\n");
    assert_eq!(b_out.get(), "true\ntrue\n");
}

#[test]
fn strings_compare_by_content() {
    assert_eq!(run("\"abc\" == \"abc\"").out, "true\n");
    assert_eq!(run("\"abc\" == \"abd\"").out, "false\n");
    assert_eq!(run("\"ab\" + \"c\" == \"abc\"").out, "true\n");
    assert_eq!(run("\"1\" == 1").out, "false\n");
}

#[test]
fn empty_strings_concatenate() {
    assert_eq!(run("\"\" + \"\" == \"\"").out, "true\n");
    assert_eq!(run("\"\" + \"x\"").out, "x\n");
}

proptest! {
    #[test]
    fn concatenation_leaves_operands_unchanged(a in "[a-zA-Z0-9 ,.!?]{0,16}", b in "[a-zA-Z0-9 ,.!?]{0,16}") {
        let (mut vm, out, _) = session();
        let left = vm.copy_string(a.as_bytes());
        let right = vm.copy_string(b.as_bytes());

        let mut chunk = Chunk::new();
        for r in [left, right] {
            let k = chunk.add_constant(Value::Obj(r));
            chunk.write_op(OpCode::Constant, 1);
            chunk.write(u8::try_from(k).unwrap(), 1);
        }
        chunk.write_op(OpCode::Add, 1);
        chunk.write_op(OpCode::Return, 1);

        prop_assert!(vm.interpret_chunk(&chunk).is_ok());
        prop_assert_eq!(out.get(), format!("{a}{b}\n"));
        prop_assert_eq!(vm.heap().as_string(Value::Obj(left)).as_bytes(), a.as_bytes());
        prop_assert_eq!(vm.heap().as_string(Value::Obj(right)).as_bytes(), b.as_bytes());
        prop_assert_eq!(vm.heap().len(), 3);
    }

    #[test]
    fn source_concatenation(a in "[a-z ]{0,12}", b in "[a-z ]{0,12}") {
        let outcome = run(&format!("{} + {}", quoted(&a), quoted(&b)));
        prop_assert!(outcome.result.is_ok());
        prop_assert_eq!(outcome.out, format!("{a}{b}\n"));
    }
}
