//! Stack machine and dispatch loop.

use std::{
    fmt,
    io::{self, Write},
};

use clove_compiler::CompileError;
use clove_core::{
    asm::{self, AsmError},
    disasm::{disassemble_instruction, format_stack},
    Chunk, Heap, Obj, ObjRef, OpCode, Value, ValueDisplay,
};
use tracing::{debug, error, trace};

use crate::{Captured, InterpretError, RuntimeError, VmResult};

/// Default value-stack depth.
pub const STACK_MAX: usize = 256;

/// VM tuning, fixed for the lifetime of a [`Vm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmOptions {
    /// Emit one `trace` event per dispatched instruction (stack + disassembly).
    pub trace_execution: bool,
    /// Maximum number of values on the stack.
    pub stack_max: usize,
}

impl Default for VmOptions {
    fn default() -> Self { Self { trace_execution: false, stack_max: STACK_MAX } }
}

/// Why an instruction failed. `Defect`s are malformed-bytecode conditions a
/// well-formed compiler never produces; they are still reported, never UB.
enum Fault {
    Type(&'static str),
    Defect(String),
}

type Step = Result<(), Fault>;

/// One interpretation session: value stack, heap, output sinks.
///
/// Dropping the VM releases every object it allocated.
pub struct Vm {
    stack: Vec<Value>,
    heap: Heap,
    options: VmOptions,
    stdout: Box<dyn Write + Send>,
    stderr: Box<dyn Write + Send>,
}

impl Default for Vm {
    fn default() -> Self { Self::new() }
}

impl Vm {
    /// VM with default options, writing to the process stdout/stderr.
    pub fn new() -> Self { Self::with_options(VmOptions::default()) }

    /// VM with explicit options.
    pub fn with_options(options: VmOptions) -> Self {
        Self {
            stack: Vec::with_capacity(options.stack_max),
            heap: Heap::new(),
            options,
            stdout: Box::new(io::stdout()),
            stderr: Box::new(io::stderr()),
        }
    }

    /// Redirect program output (`RETURN`) and diagnostics.
    #[must_use]
    pub fn with_output<O, E>(mut self, stdout: O, stderr: E) -> Self
    where
        O: Write + Send + 'static,
        E: Write + Send + 'static,
    {
        self.stdout = Box::new(stdout);
        self.stderr = Box::new(stderr);
        self
    }

    /// VM whose stdout and stderr are captured in memory.
    pub fn with_captured_output(options: VmOptions) -> (Self, Captured, Captured) {
        let (out, err) = (Captured::default(), Captured::default());
        let vm = Self::with_options(options).with_output(out.clone(), err.clone());
        (vm, out, err)
    }

    /// Options this VM was built with.
    pub const fn options(&self) -> VmOptions { self.options }

    /// Heap owning every object this VM allocated.
    pub const fn heap(&self) -> &Heap { &self.heap }

    /// Current stack depth (zero after any runtime error).
    pub fn stack_len(&self) -> usize { self.stack.len() }

    /// Allocate a string copying `bytes`.
    pub fn copy_string(&mut self, bytes: &[u8]) -> ObjRef { self.heap.copy_string(bytes) }

    /// Allocate a string taking ownership of `bytes`.
    pub fn take_string(&mut self, bytes: Vec<u8>) -> ObjRef { self.heap.take_string(bytes) }

    /// External representation of `value`.
    pub fn display(&self, value: Value) -> ValueDisplay<'_> { self.heap.display(value) }

    /// Compile `source` without running it. The VM is left untouched.
    pub fn compile(&self, source: &str) -> Result<Chunk, CompileError> { clove_compiler::compile(source) }

    /// Assemble a text chunk without running it.
    pub fn assemble(&self, text: &str) -> Result<Chunk, AsmError> { asm::assemble(text) }

    /// Write one diagnostic line to this VM's stderr sink.
    pub fn report_error(&mut self, diagnostic: &dyn fmt::Display) {
        let _ = writeln!(self.stderr, "{diagnostic}");
        let _ = self.stderr.flush();
    }

    /// Compile and run `source`. The chunk lives for this call only.
    pub fn interpret(&mut self, source: &str) -> VmResult {
        let chunk = match self.compile(source) {
            Ok(chunk) => chunk,
            Err(err) => {
                self.report_error(&err);
                return Err(err.into());
            }
        };
        self.interpret_chunk(&chunk)
    }

    /// Run a caller-owned chunk. The chunk is only borrowed, so the same one
    /// can be run by several VMs. Its string constants are copied into this
    /// VM's heap when loaded; handles from any other heap are rejected.
    pub fn interpret_chunk(&mut self, chunk: &Chunk) -> VmResult {
        debug!(
            bytes = chunk.len(),
            constants = chunk.consts.len(),
            line_runs = chunk.lines().runs().len(),
            "interpret"
        );
        self.stack.clear();

        match self.run(chunk) {
            Ok(()) => {
                debug!(objects = self.heap.len(), "interpret ok");
                Ok(())
            }
            Err(err) => {
                debug!(message = %err.message, line = ?err.line, "runtime error");
                self.report_error(&err);
                self.stack.clear();
                Err(InterpretError::Runtime(err))
            }
        }
    }

    /* ────────── Boucle de dispatch ────────── */

    fn run(&mut self, chunk: &Chunk) -> Result<(), RuntimeError> {
        let code = chunk.code();
        let mut ip = 0usize;

        loop {
            if self.options.trace_execution {
                self.trace(chunk, ip);
            }

            let start = ip;
            let Some(&byte) = code.get(ip) else {
                return Err(self.fail(chunk, start.saturating_sub(1), Fault::Defect("Unexpected end of bytecode.".into())));
            };
            ip += 1;

            let op = match OpCode::try_from(byte) {
                Ok(op) => op,
                Err(raw) => return Err(self.fail(chunk, start, Fault::Defect(format!("Unknown opcode {raw}.")))),
            };

            let step = match op {
                OpCode::Constant => self.op_constant(chunk, &mut ip),
                OpCode::Nil => self.push(Value::Nil),
                OpCode::True => self.push(Value::Bool(true)),
                OpCode::False => self.push(Value::Bool(false)),
                OpCode::Equal => self.op_equal(),
                OpCode::Greater => self.binary_number(|a, b| Value::Bool(a > b)),
                OpCode::Less => self.binary_number(|a, b| Value::Bool(a < b)),
                OpCode::Add => self.op_add(),
                OpCode::Subtract => self.binary_number(|a, b| Value::Number(a - b)),
                OpCode::Multiply => self.binary_number(|a, b| Value::Number(a * b)),
                OpCode::Divide => self.binary_number(|a, b| Value::Number(a / b)),
                OpCode::Not => self.op_not(),
                OpCode::Negate => self.op_negate(),
                OpCode::Return => match self.op_return() {
                    Ok(()) => return Ok(()),
                    Err(fault) => Err(fault),
                },
            };

            if let Err(fault) = step {
                return Err(self.fail(chunk, start, fault));
            }
        }
    }

    fn fail(&self, chunk: &Chunk, offset: usize, fault: Fault) -> RuntimeError {
        let line = chunk.line_for_offset(offset).ok();
        let message = match fault {
            Fault::Type(message) => message.to_owned(),
            Fault::Defect(message) => {
                error!(offset, ?line, depth = self.stack.len(), "malformed bytecode: {message}");
                message
            }
        };
        RuntimeError { message, line }
    }

    fn trace(&self, chunk: &Chunk, ip: usize) {
        let (instruction, _) = disassemble_instruction(chunk, &self.heap, ip);
        trace!(stack = %format_stack(&self.stack, &self.heap), "{instruction}");
    }

    /* ────────── Pile ────────── */

    fn push(&mut self, value: Value) -> Step {
        if self.stack.len() >= self.options.stack_max {
            return Err(Fault::Defect("Stack overflow.".into()));
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<Value, Fault> { self.stack.pop().ok_or_else(|| Fault::Defect("Stack underflow.".into())) }

    fn pop_pair(&mut self) -> Result<(Value, Value), Fault> {
        let b = self.pop()?;
        let a = self.pop()?;
        Ok((a, b))
    }

    /* ────────── Opérations ────────── */

    fn op_constant(&mut self, chunk: &Chunk, ip: &mut usize) -> Step {
        let index = *chunk
            .code()
            .get(*ip)
            .ok_or_else(|| Fault::Defect("Missing operand for OP_CONSTANT.".into()))?;
        *ip += 1;
        let value = chunk
            .constant(usize::from(index))
            .map_err(|_| Fault::Defect(format!("Invalid constant index {index}.")))?;
        let value = match value {
            Value::Obj(r) if self.heap.owns(r) => value,
            Value::Obj(r) => match chunk.objects().get(r) {
                Some(Obj::String(s)) => Value::Obj(self.heap.copy_string(s.as_bytes())),
                None => return Err(Fault::Defect(format!("Constant {index} refers to an object of another heap."))),
            },
            other => other,
        };
        self.push(value)
    }

    fn op_equal(&mut self) -> Step {
        let (a, b) = self.pop_pair()?;
        let equal = self.heap.values_equal(a, b);
        self.push(Value::Bool(equal))
    }

    fn binary_number(&mut self, f: impl FnOnce(f64, f64) -> Value) -> Step {
        match self.pop_pair()? {
            (Value::Number(a), Value::Number(b)) => self.push(f(a, b)),
            _ => Err(Fault::Type("Operands must be numbers.")),
        }
    }

    fn op_add(&mut self) -> Step {
        let (a, b) = self.pop_pair()?;
        if self.heap.is_string(a) && self.heap.is_string(b) {
            let (left, right) = (self.heap.as_string(a).as_bytes(), self.heap.as_string(b).as_bytes());
            let mut bytes = Vec::with_capacity(left.len() + right.len());
            bytes.extend_from_slice(left);
            bytes.extend_from_slice(right);
            let joined = self.heap.take_string(bytes);
            return self.push(Value::Obj(joined));
        }
        match (a, b) {
            (Value::Number(a), Value::Number(b)) => self.push(Value::Number(a + b)),
            _ => Err(Fault::Type("Operands must be two numbers or two strings.")),
        }
    }

    fn op_not(&mut self) -> Step {
        let value = self.pop()?;
        self.push(Value::Bool(value.is_falsey()))
    }

    fn op_negate(&mut self) -> Step {
        match self.pop()? {
            Value::Number(n) => self.push(Value::Number(-n)),
            _ => Err(Fault::Type("Operand must be a number.")),
        }
    }

    fn op_return(&mut self) -> Step {
        let value = self.pop()?;
        self.heap
            .write_value(value, &mut self.stdout)
            .and_then(|()| self.stdout.write_all(b"\n"))
            .and_then(|()| self.stdout.flush())
            .map_err(|e| Fault::Defect(format!("Cannot write output: {e}.")))
    }
}

impl Drop for Vm {
    fn drop(&mut self) {
        debug!(objects = self.heap.len(), bytes = self.heap.bytes_allocated(), "releasing heap");
    }
}
