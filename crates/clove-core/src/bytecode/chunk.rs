//! Core bytecode container: instruction bytes, a run-length line table and
//! the constant pool.

use thiserror::Error;

use crate::bytecode::opcode::OpCode;
use crate::value::{Heap, ObjRef, Value};

/// Errors returned when querying a chunk.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkError {
    /// Offset past the last recorded instruction byte.
    #[error("offset {offset} is out of range (chunk holds {len} bytes)")]
    OutOfRange {
        /// Queried offset.
        offset: usize,
        /// Number of bytes recorded.
        len: usize,
    },
    /// Constant index past the end of the pool.
    #[error("constant index {index} is out of range (pool holds {len} constants)")]
    ConstantIndex {
        /// Queried index.
        index: usize,
        /// Pool size.
        len: usize,
    },
}

/* ─────────────────────────── Constant pool ─────────────────────────── */

/// Constant pool with stable indices (0-based), in emission order.
///
/// No deduplication happens here; that is the compiler's business.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstPool {
    values: Vec<Value>,
}

impl ConstPool {
    /// Create an empty pool.
    pub fn new() -> Self { Self { values: Vec::new() } }

    /// Number of stored constants.
    pub fn len(&self) -> usize { self.values.len() }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    /// Pushes a value and returns its index (the previous count).
    pub fn add(&mut self, value: Value) -> usize {
        self.values.push(value);
        self.values.len() - 1
    }

    /// Lookup a constant by index.
    pub fn get(&self, idx: usize) -> Option<Value> { self.values.get(idx).copied() }
}

/* ─────────────────────────── Line table ─────────────────────────── */

/// A run of consecutive instruction bytes emitted for the same source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRun {
    /// 1-based source line.
    pub line: u32,
    /// Number of bytes in the run.
    pub len: u32,
}

/// Offset → source line mapping stored as immutable `(line, run length)`
/// pairs. Lookups never modify the table, so they can be repeated freely
/// and interleaved with further appends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineTable {
    runs: Vec<LineRun>,
    total: usize,
}

impl LineTable {
    /// Create an empty line table.
    pub fn new() -> Self { Self::default() }

    /// Record one more byte emitted for `line`. Extends the last run when the
    /// line repeats, opens a new run otherwise (lines need not be monotonic).
    pub fn push(&mut self, line: u32) {
        match self.runs.last_mut() {
            Some(run) if run.line == line => run.len += 1,
            _ => self.runs.push(LineRun { line, len: 1 }),
        }
        self.total += 1;
    }

    /// Number of bytes covered.
    pub fn len(&self) -> usize { self.total }

    /// Whether no byte has been recorded.
    pub fn is_empty(&self) -> bool { self.total == 0 }

    /// The encoded runs.
    pub fn runs(&self) -> &[LineRun] { &self.runs }

    /// Resolve the source line of the byte at `offset`.
    pub fn line_for_offset(&self, offset: usize) -> Result<u32, ChunkError> {
        let mut end = 0usize;
        for run in &self.runs {
            end += run.len as usize;
            if offset < end {
                return Ok(run.line);
            }
        }
        Err(ChunkError::OutOfRange { offset, len: self.total })
    }
}

/* ─────────────────────────── Chunk ─────────────────────────── */

/// Bytecode chunk: append-only code bytes, their source lines and the
/// constants they reference.
///
/// String constants created through [`Chunk::take_string`] live in a heap
/// owned by the chunk, so a chunk does not depend on any VM and can be run
/// by several of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    code: Vec<u8>,
    lines: LineTable,
    objects: Heap,
    /// Constant pool associated with the chunk.
    pub consts: ConstPool,
}

impl Chunk {
    /// Create an empty chunk.
    pub fn new() -> Self { Self::default() }

    /// Append one raw instruction or operand byte emitted at `line`.
    pub fn write(&mut self, byte: u8, line: u32) {
        self.code.push(byte);
        self.lines.push(line);
    }

    /// Append an opcode emitted at `line`.
    pub fn write_op(&mut self, op: OpCode, line: u32) { self.write(op.into(), line); }

    /// Append a constant and return its index.
    pub fn add_constant(&mut self, value: Value) -> usize { self.consts.add(value) }

    /// Allocate a string owned by this chunk, for use as a constant.
    pub fn take_string(&mut self, bytes: Vec<u8>) -> ObjRef { self.objects.take_string(bytes) }

    /// Objects owned by this chunk (its string constants).
    pub const fn objects(&self) -> &Heap { &self.objects }

    /// Constant at `index`.
    pub fn constant(&self, index: usize) -> Result<Value, ChunkError> {
        self.consts.get(index).ok_or(ChunkError::ConstantIndex { index, len: self.consts.len() })
    }

    /// Raw code bytes.
    pub fn code(&self) -> &[u8] { &self.code }

    /// Line table.
    pub fn lines(&self) -> &LineTable { &self.lines }

    /// Number of code bytes.
    pub fn len(&self) -> usize { self.code.len() }

    /// Whether no byte has been written.
    pub fn is_empty(&self) -> bool { self.code.is_empty() }

    /// 1-based source line of the instruction starting at `offset`.
    pub fn line_for_offset(&self, offset: usize) -> Result<u32, ChunkError> {
        self.lines.line_for_offset(offset)
    }
}

/* ─────────────────────────── Tests ─────────────────────────── */

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn interleaved() -> Chunk {
        let mut chunk = Chunk::new();
        let k = chunk.add_constant(Value::Number(1.0));
        chunk.write_op(OpCode::Constant, 3);
        chunk.write(k as u8, 3);
        chunk.write_op(OpCode::Nil, 10);
        chunk.write_op(OpCode::Equal, 3);
        chunk.write_op(OpCode::Not, 42);
        chunk.write_op(OpCode::Return, 42);
        chunk
    }

    #[test]
    fn constants_keep_emission_order() {
        let mut chunk = Chunk::new();
        assert_eq!(chunk.add_constant(Value::Number(1.0)), 0);
        assert_eq!(chunk.add_constant(Value::Number(1.0)), 1);
        assert_eq!(chunk.add_constant(Value::Bool(true)), 2);
        assert_eq!(chunk.constant(1), Ok(Value::Number(1.0)));
        assert_eq!(chunk.constant(3), Err(ChunkError::ConstantIndex { index: 3, len: 3 }));
    }

    #[test]
    fn lines_for_non_contiguous_sources() {
        let chunk = interleaved();
        let expected = [3, 3, 10, 3, 42, 42];
        for (offset, line) in expected.iter().enumerate() {
            assert_eq!(chunk.line_for_offset(offset), Ok(*line), "offset {offset}");
        }
    }

    #[test]
    fn lookups_are_idempotent() {
        let chunk = interleaved();
        for _ in 0..3 {
            assert_eq!(chunk.line_for_offset(2), Ok(10));
            assert_eq!(chunk.line_for_offset(5), Ok(42));
        }
        assert_eq!(chunk.lines().runs().len(), 4);
    }

    #[test]
    fn lookup_between_appends() {
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::True, 1);
        assert_eq!(chunk.line_for_offset(0), Ok(1));
        chunk.write_op(OpCode::Not, 2);
        assert_eq!(chunk.line_for_offset(0), Ok(1));
        assert_eq!(chunk.line_for_offset(1), Ok(2));
    }

    #[test]
    fn out_of_range_offset() {
        let chunk = interleaved();
        assert_eq!(chunk.line_for_offset(6), Err(ChunkError::OutOfRange { offset: 6, len: 6 }));
        assert_eq!(Chunk::new().line_for_offset(0), Err(ChunkError::OutOfRange { offset: 0, len: 0 }));
    }

    #[test]
    fn runs_merge_repeated_lines() {
        let chunk = interleaved();
        assert_eq!(
            chunk.lines().runs(),
            &[
                LineRun { line: 3, len: 2 },
                LineRun { line: 10, len: 1 },
                LineRun { line: 3, len: 1 },
                LineRun { line: 42, len: 2 },
            ][..]
        );
    }

    #[test]
    fn string_constants_belong_to_the_chunk() {
        let mut chunk = Chunk::new();
        let r = chunk.take_string(b"kept".to_vec());
        let k = chunk.add_constant(Value::Obj(r));
        assert!(chunk.objects().owns(r));
        assert_eq!(chunk.objects().as_string(chunk.constant(k).unwrap()).as_bytes(), b"kept");
        assert!(!Heap::new().owns(r));
    }

    proptest! {
        #[test]
        fn table_matches_naive_per_byte_lines(lines in prop::collection::vec(1u32..50, 0..200)) {
            let mut table = LineTable::new();
            for &line in &lines {
                table.push(line);
            }
            prop_assert_eq!(table.len(), lines.len());
            for (offset, &line) in lines.iter().enumerate() {
                prop_assert_eq!(table.line_for_offset(offset), Ok(line));
                prop_assert_eq!(table.line_for_offset(offset), Ok(line));
            }
            prop_assert!(table.line_for_offset(lines.len()).is_err());
        }
    }
}
