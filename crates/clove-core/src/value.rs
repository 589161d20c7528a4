//! Runtime values and the heap that owns every object they can point to.
//!
//! A [`Value`] is a small `Copy` tagged union. Heap-allocated data (currently
//! only strings) lives in a [`Heap`] and is referenced through an [`ObjRef`]
//! handle. The heap is the sole owner of its objects: nothing is freed
//! individually, everything goes away when the heap is dropped.

use core::fmt;
use std::{
    io::{self, Write},
    sync::atomic::{AtomicU32, Ordering},
};

/* ─────────────────────────── Value ─────────────────────────── */

/// Dynamically typed runtime datum.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Value {
    /// Absence of value.
    #[default]
    Nil,
    /// Boolean.
    Bool(bool),
    /// IEEE-754 double.
    Number(f64),
    /// Reference to an object owned by a [`Heap`].
    Obj(ObjRef),
}

impl From<bool> for Value { fn from(v: bool) -> Self { Value::Bool(v) } }
impl From<f64> for Value { fn from(v: f64) -> Self { Value::Number(v) } }
impl From<ObjRef> for Value { fn from(v: ObjRef) -> Self { Value::Obj(v) } }

impl Value {
    /// `true` for `Nil`.
    pub const fn is_nil(self) -> bool { matches!(self, Value::Nil) }
    /// `true` for booleans.
    pub const fn is_bool(self) -> bool { matches!(self, Value::Bool(_)) }
    /// `true` for numbers.
    pub const fn is_number(self) -> bool { matches!(self, Value::Number(_)) }
    /// `true` for object references of any kind.
    pub const fn is_obj(self) -> bool { matches!(self, Value::Obj(_)) }

    /// Only `nil` and `false` are falsey; everything else, `0` included, is truthy.
    pub const fn is_falsey(self) -> bool { matches!(self, Value::Nil | Value::Bool(false)) }

    /// Boolean payload.
    ///
    /// # Panics
    /// If the value is not a boolean: reaching this is a VM defect.
    #[track_caller]
    pub fn as_bool(self) -> bool {
        match self {
            Value::Bool(b) => b,
            other => panic!("as_bool on {}", other.type_name()),
        }
    }

    /// Number payload.
    ///
    /// # Panics
    /// If the value is not a number: reaching this is a VM defect.
    #[track_caller]
    pub fn as_number(self) -> f64 {
        match self {
            Value::Number(n) => n,
            other => panic!("as_number on {}", other.type_name()),
        }
    }

    /// Object handle.
    ///
    /// # Panics
    /// If the value is not an object reference.
    #[track_caller]
    pub fn as_obj(self) -> ObjRef {
        match self {
            Value::Obj(r) => r,
            other => panic!("as_obj on {}", other.type_name()),
        }
    }

    /// Short tag name, for diagnostics.
    pub const fn type_name(self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Obj(_) => "object",
        }
    }
}

/* ─────────────────────────── Objects ─────────────────────────── */

/// Identity of one [`Heap`]; every handle remembers the heap that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeapId(u32);

static NEXT_HEAP_ID: AtomicU32 = AtomicU32::new(1);

impl HeapId {
    fn fresh() -> Self { Self(NEXT_HEAP_ID.fetch_add(1, Ordering::Relaxed)) }
}

/// Handle to an object stored in a [`Heap`]. A heap only resolves the handles
/// it issued; any other heap treats them as foreign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef {
    heap: HeapId,
    slot: u32,
}

impl ObjRef {
    /// Slot index inside the owning heap.
    pub const fn index(self) -> usize { self.slot as usize }

    /// Heap that issued this handle.
    pub const fn heap(self) -> HeapId { self.heap }
}

/// Object kinds, for [`Heap::is_obj_kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjKind {
    /// [`ObjString`].
    String,
}

/// Immutable byte string; the buffer is sized once at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjString {
    bytes: Box<[u8]>,
}

impl ObjString {
    /// Raw content.
    pub fn as_bytes(&self) -> &[u8] { &self.bytes }
    /// Byte length.
    pub fn len(&self) -> usize { self.bytes.len() }
    /// `true` for the empty string.
    pub fn is_empty(&self) -> bool { self.bytes.is_empty() }
}

/// Heap-allocated runtime datum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Obj {
    /// Byte string.
    String(ObjString),
}

impl Obj {
    /// Kind tag of this object.
    pub const fn kind(&self) -> ObjKind {
        match self {
            Obj::String(_) => ObjKind::String,
        }
    }

    fn footprint(&self) -> usize {
        match self {
            Obj::String(s) => core::mem::size_of::<Obj>() + s.len(),
        }
    }
}

/* ─────────────────────────── Heap ─────────────────────────── */

/// Owning container for every object allocated during a VM session.
///
/// Objects are appended on creation and released together when the heap is
/// dropped; there is no per-object collection. A long-running session that
/// keeps concatenating strings grows until teardown.
///
/// Each heap gets a process-unique [`HeapId`] at creation. A clone keeps the
/// id of its source, so handles stay valid in both copies.
#[derive(Debug, Clone, PartialEq)]
pub struct Heap {
    id: HeapId,
    objects: Vec<Obj>,
    bytes_allocated: usize,
}

impl Default for Heap {
    fn default() -> Self { Self { id: HeapId::fresh(), objects: Vec::new(), bytes_allocated: 0 } }
}

impl Heap {
    /// Creates an empty heap with a fresh id.
    pub fn new() -> Self { Self::default() }

    /// This heap's identity.
    pub const fn id(&self) -> HeapId { self.id }

    /// Number of live objects.
    pub fn len(&self) -> usize { self.objects.len() }

    /// `true` when nothing has been allocated yet.
    pub fn is_empty(&self) -> bool { self.objects.is_empty() }

    /// Approximate bytes held by objects (headers plus payloads).
    pub fn bytes_allocated(&self) -> usize { self.bytes_allocated }

    /// Allocates a string that takes ownership of `bytes` without copying.
    pub fn take_string(&mut self, bytes: Vec<u8>) -> ObjRef {
        self.alloc(Obj::String(ObjString { bytes: bytes.into_boxed_slice() }))
    }

    /// Allocates a string holding a fresh copy of `bytes`.
    pub fn copy_string(&mut self, bytes: &[u8]) -> ObjRef {
        self.alloc(Obj::String(ObjString { bytes: Box::from(bytes) }))
    }

    fn alloc(&mut self, obj: Obj) -> ObjRef {
        let slot = u32::try_from(self.objects.len()).expect("heap exhausted: more than u32::MAX objects");
        self.bytes_allocated += obj.footprint();
        self.objects.push(obj);
        ObjRef { heap: self.id, slot }
    }

    /// `true` when `r` was issued by this heap.
    pub fn owns(&self, r: ObjRef) -> bool { r.heap == self.id && r.index() < self.objects.len() }

    /// Object behind `r`, or `None` for a handle issued by another heap.
    pub fn get(&self, r: ObjRef) -> Option<&Obj> {
        if r.heap == self.id { self.objects.get(r.index()) } else { None }
    }

    /// `true` when `value` references an object of `kind` owned by this heap.
    pub fn is_obj_kind(&self, value: Value, kind: ObjKind) -> bool {
        match value {
            Value::Obj(r) => self.get(r).is_some_and(|obj| obj.kind() == kind),
            _ => false,
        }
    }

    /// Shorthand for `is_obj_kind(value, ObjKind::String)`.
    pub fn is_string(&self, value: Value) -> bool { self.is_obj_kind(value, ObjKind::String) }

    /// String payload of `value`.
    ///
    /// # Panics
    /// If `value` is not a string owned by this heap.
    #[track_caller]
    pub fn as_string(&self, value: Value) -> &ObjString {
        match self.get(value.as_obj()) {
            Some(Obj::String(s)) => s,
            None => panic!("as_string on a handle from another heap"),
        }
    }

    /// Structural equality: numbers follow IEEE-754 (`NaN != NaN`,
    /// `0.0 == -0.0`), strings compare by content, mixed tags are never equal.
    /// Foreign handles are only equal to themselves.
    pub fn values_equal(&self, a: Value, b: Value) -> bool {
        match (a, b) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Number(x), Value::Number(y)) => x == y,
            (Value::Obj(x), Value::Obj(y)) => {
                x == y || matches!((self.get(x), self.get(y)), (Some(p), Some(q)) if p == q)
            }
            _ => false,
        }
    }

    /// Writes the external representation of `value` to `out`. Strings are
    /// written as their raw bytes.
    ///
    /// # Errors
    /// Whatever `out` reports.
    pub fn write_value(&self, value: Value, out: &mut dyn Write) -> io::Result<()> {
        match value {
            Value::Obj(r) => match self.get(r) {
                Some(Obj::String(s)) => out.write_all(s.as_bytes()),
                None => write!(out, "{}", self.display(value)),
            },
            other => write!(out, "{}", self.display(other)),
        }
    }

    /// External representation of `value` for diagnostics (strings decoded
    /// as lossy UTF-8).
    pub fn display(&self, value: Value) -> ValueDisplay<'_> { ValueDisplay { heap: self, value } }
}

/// [`fmt::Display`] adapter returned by [`Heap::display`].
pub struct ValueDisplay<'a> {
    heap: &'a Heap,
    value: Value,
}

impl fmt::Display for ValueDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Obj(r) => match self.heap.get(r) {
                Some(Obj::String(s)) => f.write_str(&String::from_utf8_lossy(s.as_bytes())),
                None => write!(f, "<foreign object #{}>", r.index()),
            },
        }
    }
}

/* ─────────────────────────── Tests ─────────────────────────── */
