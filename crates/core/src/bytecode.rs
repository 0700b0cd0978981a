//! Bytecode instruction set and program containers for the Zinc VM.
//!
//! The compiler lowers the AST to a flat `Vec<Instruction>` per function;
//! the VM executes it; the disassembler renders it. Programs persist to
//! `.znc` files through bincode.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A pooled compile-time constant. The pool only ever holds scalars;
/// aggregate values exist at run time only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    Int(i64),
    Float(f64),
    Str(String),
    Char(char),
    Bool(bool),
    Null,
}

/// Operand of an `ADDRESS_OF` instruction: which slot the pointer will
/// designate. The VM stamps local addresses with the current frame id when
/// the instruction executes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AddressTarget {
    Local(usize),
    Global(String),
}

/// A single VM instruction. Payload-bearing variants carry their operand.
///
/// Stack convention: for every binary operation the right operand is on top.
/// `ARRAY_SET` expects `[array, index, value]` and `STRUCT_SET` expects
/// `[struct, value]`, value on top in both cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Op {
    // Stack operations
    PushInt(i64),
    PushFloat(f64),
    PushString(String),
    PushChar(char),
    PushBool(bool),
    PushNull,
    Pop,
    Dup,

    // Variable operations
    LoadLocal(usize),
    StoreLocal(usize),
    LoadGlobal(String),
    StoreGlobal(String),

    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Neg,
    Pow,

    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Logical
    And,
    Or,
    Not,

    // Control flow (operands are instruction indices within the function)
    Jump(usize),
    JumpIfFalse(usize),
    JumpIfTrue(usize),

    // Functions
    Call(String, usize),
    Return,
    ReturnValue,

    // I/O
    Print,
    PrintNewline,
    InputInt,
    InputFloat,
    InputString,
    InputChar,

    // Math
    Sqrt,
    Abs,

    // Arrays
    CreateArray,
    ArrayLiteral(usize),
    ArrayGet,
    ArraySet,
    ArrayLength,

    // Structs
    CreateStruct(String),
    StructGet(String),
    StructSet(String),

    // Pointers / memory
    Alloc(String),
    Free,
    LoadPtr,
    StorePtr,
    AddressOf(AddressTarget),

    // Misc
    Random,
    Halt,
    Nop,
}

impl Op {
    /// Opcode mnemonic as it appears in disassembly.
    pub fn name(&self) -> &'static str {
        match self {
            Op::PushInt(_) => "PUSH_INT",
            Op::PushFloat(_) => "PUSH_FLOAT",
            Op::PushString(_) => "PUSH_STRING",
            Op::PushChar(_) => "PUSH_CHAR",
            Op::PushBool(_) => "PUSH_BOOL",
            Op::PushNull => "PUSH_NULL",
            Op::Pop => "POP",
            Op::Dup => "DUP",
            Op::LoadLocal(_) => "LOAD_LOCAL",
            Op::StoreLocal(_) => "STORE_LOCAL",
            Op::LoadGlobal(_) => "LOAD_GLOBAL",
            Op::StoreGlobal(_) => "STORE_GLOBAL",
            Op::Add => "ADD",
            Op::Sub => "SUB",
            Op::Mul => "MUL",
            Op::Div => "DIV",
            Op::Mod => "MOD",
            Op::Neg => "NEG",
            Op::Pow => "POW",
            Op::Eq => "EQ",
            Op::Ne => "NE",
            Op::Lt => "LT",
            Op::Le => "LE",
            Op::Gt => "GT",
            Op::Ge => "GE",
            Op::And => "AND",
            Op::Or => "OR",
            Op::Not => "NOT",
            Op::Jump(_) => "JUMP",
            Op::JumpIfFalse(_) => "JUMP_IF_FALSE",
            Op::JumpIfTrue(_) => "JUMP_IF_TRUE",
            Op::Call(_, _) => "CALL",
            Op::Return => "RETURN",
            Op::ReturnValue => "RETURN_VALUE",
            Op::Print => "PRINT",
            Op::PrintNewline => "PRINT_NEWLINE",
            Op::InputInt => "INPUT_INT",
            Op::InputFloat => "INPUT_FLOAT",
            Op::InputString => "INPUT_STRING",
            Op::InputChar => "INPUT_CHAR",
            Op::Sqrt => "SQRT",
            Op::Abs => "ABS",
            Op::CreateArray => "CREATE_ARRAY",
            Op::ArrayLiteral(_) => "ARRAY_LITERAL",
            Op::ArrayGet => "ARRAY_GET",
            Op::ArraySet => "ARRAY_SET",
            Op::ArrayLength => "ARRAY_LENGTH",
            Op::CreateStruct(_) => "CREATE_STRUCT",
            Op::StructGet(_) => "STRUCT_GET",
            Op::StructSet(_) => "STRUCT_SET",
            Op::Alloc(_) => "ALLOC",
            Op::Free => "FREE",
            Op::LoadPtr => "LOAD_PTR",
            Op::StorePtr => "STORE_PTR",
            Op::AddressOf(_) => "ADDRESS_OF",
            Op::Random => "RANDOM",
            Op::Halt => "HALT",
            Op::Nop => "NOP",
        }
    }

    /// Jump target, if this is a control-flow instruction.
    pub fn jump_target(&self) -> Option<usize> {
        match self {
            Op::Jump(t) | Op::JumpIfFalse(t) | Op::JumpIfTrue(t) => Some(*t),
            _ => None,
        }
    }

    /// Printable operand, if the instruction has one.
    fn operand_repr(&self) -> Option<String> {
        match self {
            Op::PushInt(n) => Some(n.to_string()),
            Op::PushFloat(x) => Some(crate::value::format_float(*x)),
            Op::PushString(s) => Some(format!("{:?}", s)),
            Op::PushChar(c) => Some(format!("{:?}", c)),
            Op::PushBool(b) => Some(b.to_string()),
            Op::LoadLocal(i) | Op::StoreLocal(i) => Some(i.to_string()),
            Op::LoadGlobal(name) | Op::StoreGlobal(name) => Some(format!("{:?}", name)),
            Op::Jump(t) | Op::JumpIfFalse(t) | Op::JumpIfTrue(t) => Some(t.to_string()),
            Op::Call(name, argc) => Some(format!("({:?}, {})", name, argc)),
            Op::ArrayLiteral(n) => Some(n.to_string()),
            Op::CreateStruct(name) | Op::StructGet(name) | Op::StructSet(name) => {
                Some(format!("{:?}", name))
            }
            Op::Alloc(ty) => Some(format!("{:?}", ty)),
            Op::AddressOf(target) => Some(match target {
                AddressTarget::Local(slot) => format!("(\"local\", {})", slot),
                AddressTarget::Global(name) => format!("(\"global\", {:?})", name),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operand_repr() {
            Some(operand) => write!(f, "{} {}", self.name(), operand),
            None => write!(f, "{}", self.name()),
        }
    }
}

/// An instruction plus the source line it was lowered from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub op: Op,
    pub line: usize,
}

impl Instruction {
    pub fn new(op: Op, line: usize) -> Self {
        Instruction { op, line }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.op)
    }
}

/// A compiled function.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    /// Parameter names; parameters occupy the first local slots in order.
    pub params: Vec<String>,
    pub param_types: Vec<String>,
    pub return_type: Option<String>,
    pub code: Vec<Instruction>,
    /// Highest local slot index used, plus one.
    pub locals_count: usize,
    pub is_main: bool,
}

/// A struct definition. Field order is declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructDef {
    pub name: String,
    pub fields: IndexMap<String, String>,
}

/// A complete compiled program.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub functions: IndexMap<String, Function>,
    pub structs: IndexMap<String, StructDef>,
    pub constants: Vec<Constant>,
    /// Name of the entry function (`do the main thing`), if one was defined.
    pub entry: Option<String>,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }

    /// Add a constant to the pool, reusing an existing slot for duplicates.
    pub fn add_constant(&mut self, value: Constant) -> usize {
        if let Some(index) = self.constants.iter().position(|c| c == &value) {
            return index;
        }
        self.constants.push(value);
        self.constants.len() - 1
    }

    /// Render a human-readable disassembly of the whole program.
    pub fn disassemble(&self) -> String {
        let mut lines = Vec::new();
        lines.push("=== Zinc Bytecode Disassembly ===\n".to_string());

        if !self.structs.is_empty() {
            lines.push("--- Structs ---".to_string());
            for (name, def) in &self.structs {
                lines.push(format!("struct {}:", name));
                for (field_name, field_type) in &def.fields {
                    lines.push(format!("  {} {}", field_type, field_name));
                }
            }
            lines.push(String::new());
        }

        lines.push("--- Functions ---".to_string());
        for (name, func) in &self.functions {
            lines.push(format!("\nfunction {}({}):", name, func.params.join(", ")));
            for (i, instr) in func.code.iter().enumerate() {
                lines.push(format!("  {:4}: {}", i, instr));
            }
        }

        lines.join("\n")
    }

    /// Serialize to the persisted `.znc` form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, String> {
        bincode::serialize(self).map_err(|e| format!("Failed to encode bytecode: {}", e))
    }

    /// Deserialize from the persisted `.znc` form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Program, String> {
        bincode::deserialize(bytes).map_err(|e| format!("Failed to decode bytecode: {}", e))
    }
}
