//! Table des lignes : requêtes idempotentes sur des lignes entrelacées.

use clove_core::{Chunk, OpCode, Value};
use clove_tests::session;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[test]
fn interleaved_lines_resolve_at_every_boundary() {
    let mut chunk = Chunk::new();
    let lines = [3u32, 3, 9, 1, 1, 9, 14, 3, 14];
    for (i, &line) in lines.iter().enumerate() {
        let k = chunk.add_constant(Value::Number(f64::from(u32::try_from(i).unwrap())));
        chunk.write_op(OpCode::Constant, line);
        chunk.write(u8::try_from(k).unwrap(), line);
    }

    for (i, &line) in lines.iter().enumerate() {
        let offset = i * 2;
        assert_eq!(chunk.line_for_offset(offset).unwrap(), line);
        assert_eq!(chunk.line_for_offset(offset).unwrap(), line, "second query at {offset}");
        assert_eq!(chunk.line_for_offset(offset + 1).unwrap(), line);
    }
    assert!(chunk.line_for_offset(lines.len() * 2).is_err());
}

#[test]
fn compiled_chunks_record_token_lines() {
    let (mut vm, _, _) = session();
    let chunk = vm.compile("1 +\n\n2 *\n\n\n3").unwrap();
    let lines: Vec<u32> = (0..chunk.len()).map(|off| chunk.line_for_offset(off).unwrap()).collect();
    assert_eq!(lines, vec![1, 1, 3, 3, 6, 6, 6, 6, 6]);
}

proptest! {
    #[test]
    fn lookups_match_the_written_lines(lines in prop::collection::vec(1u32..50, 1..200)) {
        let mut chunk = Chunk::new();
        for &line in &lines {
            chunk.write_op(OpCode::Nil, line);
        }
        for _ in 0..2 {
            for (offset, &line) in lines.iter().enumerate() {
                prop_assert_eq!(chunk.line_for_offset(offset).unwrap(), line);
            }
        }
    }
}
