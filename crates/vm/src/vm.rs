//! The Zinc stack machine.
//!
//! Executes one `Instruction` at a time: fetch, advance the instruction
//! pointer, dispatch on the opcode. Call frames hold function-local slots;
//! the evaluation stack is shared across frames because the compiler keeps
//! it balanced around calls.

use crate::builtins::FileHandle;
use crate::error::{RuntimeError, VmError};
use rand::Rng;
use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Write};
use zinc_core::value::Address;
use zinc_core::{AddressTarget, Function, Instruction, Op, Program, Value};

/// A call frame: one per active function invocation.
pub struct Frame<'a> {
    pub function: &'a Function,
    pub ip: usize,
    /// Evaluation-stack depth when this frame was pushed. Only used by the
    /// debug trace; the stack itself is shared across frames.
    pub base: usize,
    pub locals: Vec<Value>,
    /// Unique id, referenced by pointers into this frame's slots.
    pub id: u64,
}

/// Stack-based virtual machine for Zinc bytecode.
pub struct Vm<'a> {
    program: &'a Program,
    stack: Vec<Value>,
    frames: Vec<Frame<'a>>,
    pub(crate) globals: HashMap<String, Value>,
    pub(crate) files: HashMap<i64, FileHandle>,
    pub(crate) next_file_id: i64,
    next_frame_id: u64,
    debug: bool,
    running: bool,
    pub(crate) output: Box<dyn Write + 'a>,
    input: Box<dyn BufRead + 'a>,
}

impl<'a> Vm<'a> {
    /// Create a VM wired to the process's standard streams.
    pub fn new(program: &'a Program) -> Vm<'a> {
        Vm::with_io(
            program,
            Box::new(BufReader::new(io::stdin())),
            Box::new(io::stdout()),
        )
    }

    /// Create a VM with explicit input and output, for embedding and tests.
    pub fn with_io(
        program: &'a Program,
        input: Box<dyn BufRead + 'a>,
        output: Box<dyn Write + 'a>,
    ) -> Vm<'a> {
        Vm {
            program,
            stack: Vec::new(),
            frames: Vec::new(),
            globals: HashMap::new(),
            files: HashMap::new(),
            next_file_id: 1,
            next_frame_id: 1,
            debug: false,
            running: false,
            output,
            input,
        }
    }

    /// Enable the per-instruction trace on stderr.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Run the program. Errors are reported on stderr; the return value is
    /// the process exit code (the entry function's integer result, or 1 on a
    /// runtime error).
    pub fn run(&mut self) -> i32 {
        match self.execute() {
            Ok(code) => code,
            Err(e) => {
                eprintln!("{}", e);
                1
            }
        }
    }

    /// Run the program, returning the exit code or the runtime error.
    pub fn execute(&mut self) -> Result<i32, RuntimeError> {
        let program = self.program;
        let entry_name = match &program.entry {
            Some(name) => name,
            None => return Err(RuntimeError::new(0, "No main function found")),
        };
        let entry = program.functions.get(entry_name).ok_or_else(|| {
            RuntimeError::new(0, format!("Unknown function: {}", entry_name))
        })?;
        self.call_function(entry, Vec::new());

        self.running = true;
        while self.running && !self.frames.is_empty() {
            self.step()?;
        }

        Ok(match self.stack.pop() {
            Some(Value::Int(n)) => n as i32,
            _ => 0,
        })
    }

    fn step(&mut self) -> Result<(), RuntimeError> {
        let instr: &'a Instruction = {
            let frame = match self.frames.last_mut() {
                Some(frame) => frame,
                None => {
                    self.running = false;
                    return Ok(());
                }
            };
            let function = frame.function;
            if frame.ip >= function.code.len() {
                self.running = false;
                return Ok(());
            }
            let instr = &function.code[frame.ip];
            frame.ip += 1;
            instr
        };

        if self.debug {
            self.trace(instr);
        }
        self.execute_op(&instr.op).map_err(|error| RuntimeError {
            line: instr.line,
            error,
        })
    }

    fn trace(&self, instr: &Instruction) {
        if let Some(frame) = self.frames.last() {
            eprintln!("[{}:{}] {}", frame.function.name, frame.ip - 1, instr);
            let depth = self.stack.len();
            let tail: Vec<String> = self.stack[depth.saturating_sub(5)..]
                .iter()
                .map(|v| v.to_string())
                .collect();
            eprintln!("  stack: [{}]", tail.join(", "));
        }
    }

    fn call_function(&mut self, function: &'a Function, args: Vec<Value>) {
        let mut locals = vec![Value::Null; function.locals_count];
        for (i, arg) in args.into_iter().enumerate() {
            if i < locals.len() {
                locals[i] = arg;
            }
        }
        self.frames.push(Frame {
            function,
            ip: 0,
            base: self.stack.len(),
            locals,
            id: self.next_frame_id,
        });
        self.next_frame_id += 1;
    }

    fn finish_return(&mut self, value: Value) {
        self.frames.pop();
        self.push(value);
        if self.frames.is_empty() {
            self.running = false;
        }
    }

    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    fn pop(&mut self) -> Result<Value, VmError> {
        self.stack.pop().ok_or_else(|| VmError::fault("Stack underflow"))
    }

    fn peek(&self) -> Result<&Value, VmError> {
        self.stack.last().ok_or_else(|| VmError::fault("Stack underflow"))
    }

    fn frame(&self) -> Result<&Frame<'a>, VmError> {
        self.frames.last().ok_or_else(|| VmError::fault("No active call frame"))
    }

    fn frame_mut(&mut self) -> Result<&mut Frame<'a>, VmError> {
        self.frames.last_mut().ok_or_else(|| VmError::fault("No active call frame"))
    }

    fn read_input_line(&mut self) -> Result<String, VmError> {
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }

    fn load_address(&self, addr: &Address) -> Result<Value, VmError> {
        match addr {
            Address::Local { frame, slot } => {
                let frame = self
                    .frames
                    .iter()
                    .rev()
                    .find(|f| f.id == *frame)
                    .ok_or_else(|| {
                        VmError::fault("Dangling pointer: the frame that owned this value is gone")
                    })?;
                frame
                    .locals
                    .get(*slot)
                    .cloned()
                    .ok_or_else(|| VmError::fault(format!("Invalid local slot: {}", slot)))
            }
            Address::Global(name) => self
                .globals
                .get(name)
                .cloned()
                .ok_or_else(|| VmError::fault(format!("Undefined global variable: {}", name))),
        }
    }

    fn store_address(&mut self, addr: &Address, value: Value) -> Result<(), VmError> {
        match addr {
            Address::Local { frame, slot } => {
                let frame = self
                    .frames
                    .iter_mut()
                    .rev()
                    .find(|f| f.id == *frame)
                    .ok_or_else(|| {
                        VmError::fault("Dangling pointer: the frame that owned this value is gone")
                    })?;
                if *slot >= frame.locals.len() {
                    return Err(VmError::fault(format!("Invalid local slot: {}", slot)));
                }
                frame.locals[*slot] = value;
                Ok(())
            }
            Address::Global(name) => {
                self.globals.insert(name.clone(), value);
                Ok(())
            }
        }
    }

    fn execute_op(&mut self, op: &Op) -> Result<(), VmError> {
        match op {
            // Stack operations
            Op::PushInt(n) => self.push(Value::Int(*n)),
            Op::PushFloat(x) => self.push(Value::Float(*x)),
            Op::PushString(s) => self.push(Value::Str(s.clone())),
            Op::PushChar(c) => self.push(Value::Char(*c)),
            Op::PushBool(b) => self.push(Value::Bool(*b)),
            Op::PushNull => self.push(Value::Null),
            Op::Pop => {
                self.pop()?;
            }
            Op::Dup => {
                let top = self.peek()?.clone();
                self.push(top);
            }

            // Variables
            Op::LoadLocal(slot) => {
                let frame = self.frame()?;
                let value = frame
                    .locals
                    .get(*slot)
                    .cloned()
                    .ok_or_else(|| VmError::fault(format!("Invalid local slot: {}", slot)))?;
                self.push(value);
            }
            Op::StoreLocal(slot) => {
                let value = self.pop()?;
                let slot = *slot;
                let frame = self.frame_mut()?;
                if slot >= frame.locals.len() {
                    return Err(VmError::fault(format!("Invalid local slot: {}", slot)));
                }
                frame.locals[slot] = value;
            }
            Op::LoadGlobal(name) => {
                let value = self
                    .globals
                    .get(name)
                    .cloned()
                    .ok_or_else(|| VmError::fault(format!("Undefined global variable: {}", name)))?;
                self.push(value);
            }
            Op::StoreGlobal(name) => {
                let value = self.pop()?;
                self.globals.insert(name.clone(), value);
            }

            // Arithmetic
            Op::Add | Op::Sub | Op::Mul | Op::Div | Op::Mod => {
                let b = self.pop()?;
                let a = self.pop()?;
                self.push(binary_arith(&a, &b, op)?);
            }
            Op::Neg => {
                let a = self.pop()?;
                let value = match a {
                    Value::Int(n) => Value::Int(n.wrapping_neg()),
                    Value::Float(x) => Value::Float(-x),
                    other => {
                        return Err(VmError::fault(format!("Cannot negate {}", other.type_name())))
                    }
                };
                self.push(value);
            }
            Op::Pow => {
                let b = self.pop()?;
                let a = self.pop()?;
                let result = to_number(&a)?.powf(to_number(&b)?);
                if matches!(a, Value::Float(_)) || matches!(b, Value::Float(_)) {
                    self.push(Value::Float(result));
                } else {
                    self.push(Value::Int(result as i64));
                }
            }

            // Comparison
            Op::Eq => {
                let b = self.pop()?;
                let a = self.pop()?;
                self.push(Value::Bool(a.equals(&b)));
            }
            Op::Ne => {
                let b = self.pop()?;
                let a = self.pop()?;
                self.push(Value::Bool(!a.equals(&b)));
            }
            Op::Lt | Op::Le | Op::Gt | Op::Ge => {
                let b = self.pop()?;
                let a = self.pop()?;
                let x = to_number(&a)?;
                let y = to_number(&b)?;
                let result = match op {
                    Op::Lt => x < y,
                    Op::Le => x <= y,
                    Op::Gt => x > y,
                    _ => x >= y,
                };
                self.push(Value::Bool(result));
            }

            // Logical
            Op::And => {
                let b = self.pop()?;
                let a = self.pop()?;
                self.push(Value::Bool(a.is_truthy() && b.is_truthy()));
            }
            Op::Or => {
                let b = self.pop()?;
                let a = self.pop()?;
                self.push(Value::Bool(a.is_truthy() || b.is_truthy()));
            }
            Op::Not => {
                let a = self.pop()?;
                self.push(Value::Bool(!a.is_truthy()));
            }

            // Control flow
            Op::Jump(target) => {
                self.frame_mut()?.ip = *target;
            }
            Op::JumpIfFalse(target) => {
                let condition = self.pop()?;
                if !condition.is_truthy() {
                    self.frame_mut()?.ip = *target;
                }
            }
            Op::JumpIfTrue(target) => {
                let condition = self.pop()?;
                if condition.is_truthy() {
                    self.frame_mut()?.ip = *target;
                }
            }

            // Functions
            Op::Call(name, argc) => {
                let mut args = Vec::with_capacity(*argc);
                for _ in 0..*argc {
                    args.push(self.pop()?);
                }
                args.reverse();

                if name.starts_with("__") && name.ends_with("__") {
                    let result = self.call_builtin(name, args)?;
                    self.push(result);
                } else {
                    let program = self.program;
                    let function = program
                        .functions
                        .get(name)
                        .ok_or_else(|| VmError::fault(format!("Unknown function: {}", name)))?;
                    if args.len() != function.params.len() {
                        return Err(VmError::fault(format!(
                            "Function {} expects {} arguments, got {}",
                            name,
                            function.params.len(),
                            args.len()
                        )));
                    }
                    self.call_function(function, args);
                }
            }
            Op::Return => self.finish_return(Value::Null),
            Op::ReturnValue => {
                let value = self.pop()?;
                self.finish_return(value);
            }

            // I/O
            Op::Print => {
                let value = self.pop()?;
                write!(self.output, "{}", value)?;
            }
            Op::PrintNewline => {
                writeln!(self.output)?;
                self.output.flush()?;
            }
            Op::InputInt => {
                let line = self.read_input_line()?;
                self.push(Value::Int(line.trim().parse().unwrap_or(0)));
            }
            Op::InputFloat => {
                let line = self.read_input_line()?;
                self.push(Value::Float(line.trim().parse().unwrap_or(0.0)));
            }
            Op::InputString => {
                let line = self.read_input_line()?;
                self.push(Value::Str(line));
            }
            Op::InputChar => {
                let line = self.read_input_line()?;
                self.push(Value::Char(line.chars().next().unwrap_or('\0')));
            }

            // Math
            Op::Sqrt => {
                let a = self.pop()?;
                let x = to_number(&a)?;
                if x < 0.0 {
                    return Err(VmError::fault("Cannot take the square root of a negative number"));
                }
                self.push(Value::Float(x.sqrt()));
            }
            Op::Abs => {
                let a = self.pop()?;
                let value = match a {
                    Value::Int(n) => Value::Int(n.wrapping_abs()),
                    Value::Float(x) => Value::Float(x.abs()),
                    other => {
                        return Err(VmError::fault(format!(
                            "Cannot get absolute value of {}",
                            other.type_name()
                        )))
                    }
                };
                self.push(value);
            }

            // Arrays
            Op::CreateArray => {
                let size = self.pop()?;
                let n = match size {
                    Value::Int(n) if n >= 0 => n as usize,
                    Value::Int(_) => return Err(VmError::fault("Array size cannot be negative")),
                    _ => return Err(VmError::fault("Array size must be an integer")),
                };
                self.push(Value::array(vec![Value::Int(0); n]));
            }
            Op::ArrayLiteral(count) => {
                let mut elements = Vec::with_capacity(*count);
                for _ in 0..*count {
                    elements.push(self.pop()?);
                }
                elements.reverse();
                self.push(Value::array(elements));
            }
            Op::ArrayGet => {
                let index = self.pop()?;
                let target = self.pop()?;
                match target {
                    Value::Array(items) => {
                        let items = items.borrow();
                        let idx = normalize_index(&index, items.len())?;
                        self.push(items[idx].clone());
                    }
                    Value::Str(s) => {
                        let chars: Vec<char> = s.chars().collect();
                        let idx = normalize_index(&index, chars.len())?;
                        self.push(Value::Char(chars[idx]));
                    }
                    _ => return Err(VmError::fault("Cannot index non-array value")),
                }
            }
            Op::ArraySet => {
                let value = self.pop()?;
                let index = self.pop()?;
                let target = self.pop()?;
                match target {
                    Value::Array(items) => {
                        let mut items = items.borrow_mut();
                        let idx = normalize_index(&index, items.len())?;
                        items[idx] = value;
                    }
                    _ => return Err(VmError::fault("Cannot index non-array value")),
                }
            }
            Op::ArrayLength => {
                let target = self.pop()?;
                let len = match target {
                    Value::Array(items) => items.borrow().len(),
                    Value::Str(s) => s.chars().count(),
                    other => {
                        return Err(VmError::fault(format!(
                            "Cannot get length of {}",
                            other.type_name()
                        )))
                    }
                };
                self.push(Value::Int(len as i64));
            }

            // Structs
            Op::CreateStruct(name) => {
                let program = self.program;
                let def = program
                    .structs
                    .get(name)
                    .ok_or_else(|| VmError::fault(format!("Unknown struct type: {}", name)))?;
                let mut fields = indexmap::IndexMap::new();
                for field_name in def.fields.keys() {
                    fields.insert(field_name.clone(), Value::Null);
                }
                self.push(Value::struct_instance(name.clone(), fields));
            }
            Op::StructGet(field) => {
                let target = self.pop()?;
                match target {
                    Value::Struct { fields, .. } => {
                        let fields = fields.borrow();
                        let value = fields
                            .get(field)
                            .cloned()
                            .ok_or_else(|| VmError::fault(format!("Unknown field: {}", field)))?;
                        self.push(value);
                    }
                    _ => return Err(VmError::fault("Cannot access field of non-struct value")),
                }
            }
            Op::StructSet(field) => {
                let value = self.pop()?;
                let target = self.pop()?;
                match target {
                    Value::Struct { fields, .. } => {
                        let mut fields = fields.borrow_mut();
                        if !fields.contains_key(field) {
                            return Err(VmError::fault(format!("Unknown field: {}", field)));
                        }
                        fields.insert(field.clone(), value);
                    }
                    _ => return Err(VmError::fault("Cannot access field of non-struct value")),
                }
            }

            // Pointers / memory
            Op::Alloc(_) => {
                let count = self.pop()?;
                let n = match count {
                    Value::Int(n) if n >= 0 => n as usize,
                    Value::Int(_) => return Err(VmError::fault("Allocation size cannot be negative")),
                    _ => return Err(VmError::fault("Allocation size must be an integer")),
                };
                self.push(Value::array(vec![Value::Int(0); n]));
            }
            Op::Free => {
                // Values are reclaimed by reachability; releasing the handle
                // is all there is to do.
                self.pop()?;
            }
            Op::LoadPtr => {
                let ptr = self.pop()?;
                match ptr {
                    Value::Pointer(addr) => {
                        let value = self.load_address(&addr)?;
                        self.push(value);
                    }
                    _ => return Err(VmError::fault("Cannot dereference non-pointer value")),
                }
            }
            Op::StorePtr => {
                let value = self.pop()?;
                let ptr = self.pop()?;
                match ptr {
                    Value::Pointer(addr) => self.store_address(&addr, value)?,
                    _ => return Err(VmError::fault("Cannot dereference non-pointer value")),
                }
            }
            Op::AddressOf(target) => {
                let addr = match target {
                    AddressTarget::Local(slot) => Address::Local {
                        frame: self.frame()?.id,
                        slot: *slot,
                    },
                    AddressTarget::Global(name) => Address::Global(name.clone()),
                };
                self.push(Value::Pointer(addr));
            }

            // Misc
            Op::Random => {
                let max = self.pop()?;
                let min = self.pop()?;
                match (min, max) {
                    (Value::Int(lo), Value::Int(hi)) => {
                        if lo > hi {
                            return Err(VmError::fault("Random range is empty"));
                        }
                        let n = rand::thread_rng().gen_range(lo..=hi);
                        self.push(Value::Int(n));
                    }
                    _ => return Err(VmError::fault("Random range must be integers")),
                }
            }
            Op::Halt => self.running = false,
            Op::Nop => {}
        }
        Ok(())
    }
}

fn to_int(value: &Value) -> Option<i64> {
    match value {
        Value::Int(n) => Some(*n),
        Value::Bool(b) => Some(if *b { 1 } else { 0 }),
        Value::Char(c) => Some(*c as u32 as i64),
        _ => None,
    }
}

fn to_number(value: &Value) -> Result<f64, VmError> {
    match value {
        Value::Int(n) => Ok(*n as f64),
        Value::Float(x) => Ok(*x),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Char(c) => Ok(*c as u32 as f64),
        other => Err(VmError::fault(format!(
            "Cannot convert {} to number",
            other.type_name()
        ))),
    }
}

/// Resolve an index value against a sequence length. Negative `-k` addresses
/// `len - k`; anything outside the sequence is a runtime error.
fn normalize_index(index: &Value, len: usize) -> Result<usize, VmError> {
    let raw = match index {
        Value::Int(n) => *n,
        _ => return Err(VmError::fault("Array index must be an integer")),
    };
    let idx = if raw < 0 { len as i64 + raw } else { raw };
    if idx < 0 || idx >= len as i64 {
        return Err(VmError::fault(format!("Array index out of bounds: {}", raw)));
    }
    Ok(idx as usize)
}

/// `+` with a string operand concatenates; otherwise both operands convert
/// numerically, and the result is Float exactly when either operand is.
fn binary_arith(a: &Value, b: &Value, op: &Op) -> Result<Value, VmError> {
    if matches!(op, Op::Add) && (matches!(a, Value::Str(_)) || matches!(b, Value::Str(_))) {
        return Ok(Value::Str(format!("{}{}", a, b)));
    }

    if let (Some(x), Some(y)) = (to_int(a), to_int(b)) {
        let result = match op {
            Op::Add => x.wrapping_add(y),
            Op::Sub => x.wrapping_sub(y),
            Op::Mul => x.wrapping_mul(y),
            Op::Div => {
                if y == 0 {
                    return Err(VmError::fault("Division by zero"));
                }
                x.wrapping_div(y)
            }
            Op::Mod => {
                if y == 0 {
                    return Err(VmError::fault("Division by zero"));
                }
                x.wrapping_rem(y)
            }
            _ => return Err(VmError::fault(format!("Not an arithmetic opcode: {}", op.name()))),
        };
        return Ok(Value::Int(result));
    }

    let x = to_number(a)?;
    let y = to_number(b)?;
    let result = match op {
        Op::Add => x + y,
        Op::Sub => x - y,
        Op::Mul => x * y,
        Op::Div => {
            if y == 0.0 {
                return Err(VmError::fault("Division by zero"));
            }
            x / y
        }
        Op::Mod => {
            if y == 0.0 {
                return Err(VmError::fault("Division by zero"));
            }
            x % y
        }
        _ => return Err(VmError::fault(format!("Not an arithmetic opcode: {}", op.name()))),
    };
    Ok(Value::Float(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use zinc_core::{Function, Instruction, Program};

    fn program_with_main(ops: Vec<Op>, locals_count: usize) -> Program {
        let mut program = Program::new();
        let code = ops
            .into_iter()
            .enumerate()
            .map(|(i, op)| Instruction::new(op, i + 1))
            .collect();
        program.functions.insert(
            "main".to_string(),
            Function {
                name: "main".to_string(),
                code,
                locals_count,
                is_main: true,
                ..Function::default()
            },
        );
        program.entry = Some("main".to_string());
        program
    }

    fn run_capture(program: &Program) -> (String, Result<i32, RuntimeError>) {
        let mut out = Vec::new();
        let result = {
            let mut vm = Vm::with_io(program, Box::new(io::empty()), Box::new(&mut out));
            vm.execute()
        };
        (String::from_utf8(out).unwrap(), result)
    }

    #[test]
    fn test_print_and_exit_code() {
        let program = program_with_main(
            vec![
                Op::PushString("Hello, World!".to_string()),
                Op::Print,
                Op::PrintNewline,
                Op::PushInt(0),
                Op::ReturnValue,
            ],
            0,
        );
        let (out, result) = run_capture(&program);
        assert_eq!(out, "Hello, World!\n");
        assert_eq!(result.unwrap(), 0);
    }

    #[test]
    fn test_mixed_arithmetic_promotes_to_float() {
        let program = program_with_main(
            vec![
                Op::PushInt(3),
                Op::PushFloat(0.5),
                Op::Add,
                Op::Print,
                Op::PrintNewline,
                Op::PushInt(0),
                Op::ReturnValue,
            ],
            0,
        );
        let (out, result) = run_capture(&program);
        assert_eq!(out, "3.5\n");
        assert_eq!(result.unwrap(), 0);
    }

    #[test]
    fn test_integer_division_truncates() {
        let program = program_with_main(
            vec![
                Op::PushInt(10),
                Op::PushInt(4),
                Op::Div,
                Op::Print,
                Op::PrintNewline,
                Op::Return,
            ],
            0,
        );
        let (out, _) = run_capture(&program);
        assert_eq!(out, "2\n");
    }

    #[test]
    fn test_string_concat_stringifies_other_operand() {
        let program = program_with_main(
            vec![
                Op::PushString("n = ".to_string()),
                Op::PushInt(7),
                Op::Add,
                Op::Print,
                Op::PrintNewline,
                Op::Return,
            ],
            0,
        );
        let (out, _) = run_capture(&program);
        assert_eq!(out, "n = 7\n");
    }

    #[test]
    fn test_division_by_zero_reports_line() {
        let program = program_with_main(vec![Op::PushInt(1), Op::PushInt(0), Op::Div], 0);
        let (_, result) = run_capture(&program);
        let err = result.unwrap_err();
        assert_eq!(err.line, 3);
        assert!(err.to_string().contains("Division by zero"));
    }

    #[test]
    fn test_negative_index_addresses_from_end() {
        let program = program_with_main(
            vec![
                Op::PushInt(10),
                Op::PushInt(20),
                Op::PushInt(30),
                Op::ArrayLiteral(3),
                Op::PushInt(-1),
                Op::ArrayGet,
                Op::Print,
                Op::PrintNewline,
                Op::Return,
            ],
            0,
        );
        let (out, _) = run_capture(&program);
        assert_eq!(out, "30\n");
    }

    #[test]
    fn test_index_out_of_bounds_is_an_error() {
        let program = program_with_main(
            vec![
                Op::PushInt(1),
                Op::PushInt(2),
                Op::ArrayLiteral(2),
                Op::PushInt(4),
                Op::ArrayGet,
            ],
            0,
        );
        let (_, result) = run_capture(&program);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("out of bounds"));
    }

    #[test]
    fn test_array_set_through_alias() {
        // xs = [1]; ys = xs; ys[0] = 9; print xs[0]
        let program = program_with_main(
            vec![
                Op::PushInt(1),
                Op::ArrayLiteral(1),
                Op::StoreLocal(0),
                Op::LoadLocal(0),
                Op::StoreLocal(1),
                Op::LoadLocal(1),
                Op::PushInt(0),
                Op::PushInt(9),
                Op::ArraySet,
                Op::LoadLocal(0),
                Op::PushInt(0),
                Op::ArrayGet,
                Op::Print,
                Op::PrintNewline,
                Op::Return,
            ],
            2,
        );
        let (out, _) = run_capture(&program);
        assert_eq!(out, "9\n");
    }

    #[test]
    fn test_struct_set_expects_value_on_top() {
        let mut program = program_with_main(
            vec![
                Op::CreateStruct("Point".to_string()),
                Op::StoreLocal(0),
                Op::LoadLocal(0),
                Op::PushInt(4),
                Op::StructSet("x".to_string()),
                Op::LoadLocal(0),
                Op::StructGet("x".to_string()),
                Op::Print,
                Op::PrintNewline,
                Op::Return,
            ],
            1,
        );
        let mut fields = indexmap::IndexMap::new();
        fields.insert("x".to_string(), "number".to_string());
        program.structs.insert(
            "Point".to_string(),
            zinc_core::StructDef {
                name: "Point".to_string(),
                fields,
            },
        );
        let (out, result) = run_capture(&program);
        assert!(result.is_ok());
        assert_eq!(out, "4\n");
    }

    #[test]
    fn test_unknown_struct_field_is_an_error() {
        let mut program = program_with_main(
            vec![
                Op::CreateStruct("Point".to_string()),
                Op::StructGet("z".to_string()),
            ],
            0,
        );
        let mut fields = indexmap::IndexMap::new();
        fields.insert("x".to_string(), "number".to_string());
        program.structs.insert(
            "Point".to_string(),
            zinc_core::StructDef {
                name: "Point".to_string(),
                fields,
            },
        );
        let (_, result) = run_capture(&program);
        assert!(result.unwrap_err().to_string().contains("Unknown field: z"));
    }

    #[test]
    fn test_call_binds_arguments_positionally() {
        let mut program = program_with_main(
            vec![
                Op::PushInt(2),
                Op::PushInt(5),
                Op::Call("sub_pair".to_string(), 2),
                Op::Print,
                Op::PrintNewline,
                Op::PushInt(0),
                Op::ReturnValue,
            ],
            0,
        );
        program.functions.insert(
            "sub_pair".to_string(),
            Function {
                name: "sub_pair".to_string(),
                params: vec!["a".to_string(), "b".to_string()],
                param_types: vec!["number".to_string(), "number".to_string()],
                code: vec![
                    Instruction::new(Op::LoadLocal(0), 1),
                    Instruction::new(Op::LoadLocal(1), 1),
                    Instruction::new(Op::Sub, 1),
                    Instruction::new(Op::ReturnValue, 1),
                ],
                locals_count: 2,
                is_main: false,
                ..Function::default()
            },
        );
        let (out, result) = run_capture(&program);
        assert_eq!(out, "-3\n");
        assert_eq!(result.unwrap(), 0);
    }

    #[test]
    fn test_return_without_value_pushes_null() {
        let mut program = program_with_main(
            vec![
                Op::Call("noop".to_string(), 0),
                Op::Print,
                Op::PrintNewline,
                Op::Return,
            ],
            0,
        );
        program.functions.insert(
            "noop".to_string(),
            Function {
                name: "noop".to_string(),
                code: vec![Instruction::new(Op::Return, 1)],
                ..Function::default()
            },
        );
        let (out, _) = run_capture(&program);
        assert_eq!(out, "null\n");
    }

    #[test]
    fn test_argument_count_mismatch() {
        let mut program = program_with_main(vec![Op::Call("one_arg".to_string(), 0)], 0);
        program.functions.insert(
            "one_arg".to_string(),
            Function {
                name: "one_arg".to_string(),
                params: vec!["x".to_string()],
                param_types: vec!["number".to_string()],
                locals_count: 1,
                code: vec![Instruction::new(Op::Return, 1)],
                ..Function::default()
            },
        );
        let (_, result) = run_capture(&program);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("expects 1 arguments, got 0"));
    }

    #[test]
    fn test_unknown_function_is_an_error() {
        let program = program_with_main(vec![Op::Call("nope".to_string(), 0)], 0);
        let (_, result) = run_capture(&program);
        assert!(result.unwrap_err().to_string().contains("Unknown function: nope"));
    }

    #[test]
    fn test_pointer_into_parent_frame() {
        // main: x = 41 (slot 0); call bump(&x); print x
        let mut program = program_with_main(
            vec![
                Op::PushInt(41),
                Op::StoreLocal(0),
                Op::AddressOf(AddressTarget::Local(0)),
                Op::Call("bump".to_string(), 1),
                Op::Pop,
                Op::LoadLocal(0),
                Op::Print,
                Op::PrintNewline,
                Op::Return,
            ],
            1,
        );
        // bump(p): *p = *p + 1
        program.functions.insert(
            "bump".to_string(),
            Function {
                name: "bump".to_string(),
                params: vec!["p".to_string()],
                param_types: vec!["pointer:number".to_string()],
                code: vec![
                    Instruction::new(Op::LoadLocal(0), 1),
                    Instruction::new(Op::LoadLocal(0), 1),
                    Instruction::new(Op::LoadPtr, 1),
                    Instruction::new(Op::PushInt(1), 1),
                    Instruction::new(Op::Add, 1),
                    Instruction::new(Op::StorePtr, 1),
                    Instruction::new(Op::Return, 1),
                ],
                locals_count: 1,
                ..Function::default()
            },
        );
        let (out, result) = run_capture(&program);
        assert!(result.is_ok());
        assert_eq!(out, "42\n");
    }

    #[test]
    fn test_dangling_pointer_is_an_error() {
        // escape() returns the address of its own local; deref in main fails
        let mut program = program_with_main(
            vec![
                Op::Call("escape".to_string(), 0),
                Op::LoadPtr,
            ],
            0,
        );
        program.functions.insert(
            "escape".to_string(),
            Function {
                name: "escape".to_string(),
                code: vec![
                    Instruction::new(Op::PushInt(1), 1),
                    Instruction::new(Op::StoreLocal(0), 1),
                    Instruction::new(Op::AddressOf(AddressTarget::Local(0)), 1),
                    Instruction::new(Op::ReturnValue, 1),
                ],
                locals_count: 1,
                ..Function::default()
            },
        );
        let (_, result) = run_capture(&program);
        assert!(result.unwrap_err().to_string().contains("Dangling pointer"));
    }

    #[test]
    fn test_input_int_parses_or_zero() {
        let program = program_with_main(
            vec![
                Op::InputInt,
                Op::Print,
                Op::PrintNewline,
                Op::InputInt,
                Op::Print,
                Op::PrintNewline,
                Op::Return,
            ],
            0,
        );
        let mut out = Vec::new();
        let input = io::Cursor::new(b"12\nnot a number\n".to_vec());
        let result = {
            let mut vm = Vm::with_io(&program, Box::new(input), Box::new(&mut out));
            vm.execute()
        };
        assert!(result.is_ok());
        assert_eq!(String::from_utf8(out).unwrap(), "12\n0\n");
    }

    #[test]
    fn test_missing_entry_function() {
        let program = Program::new();
        let mut vm = Vm::new(&program);
        let err = vm.execute().unwrap_err();
        assert!(err.to_string().contains("No main function found"));
    }

    #[test]
    fn test_stack_underflow_is_reported() {
        let program = program_with_main(vec![Op::Pop], 0);
        let (_, result) = run_capture(&program);
        assert!(result.unwrap_err().to_string().contains("Stack underflow"));
    }
}
