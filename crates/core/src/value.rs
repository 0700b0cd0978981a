//! Runtime value model for the Zinc VM.
//!
//! Arrays and struct instances are reference-counted shared cells: loading a
//! variable pushes a handle to the same object, so element and field
//! assignment through any alias is visible through every other. Values form
//! trees in practice, so plain `Rc` is enough and no cycle collector exists.

use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// What a pointer value refers to: a local slot in a specific call frame,
/// or a global variable by name.
///
/// Local pointers carry the unique id of the frame that owns the slot, so a
/// pointer passed down into a callee still resolves against the parent frame,
/// while a pointer that outlives its frame is detectably dangling.
#[derive(Debug, Clone, PartialEq)]
pub enum Address {
    Local { frame: u64, slot: usize },
    Global(String),
}

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Integer value
    Int(i64),

    /// Floating-point value (IEEE 754 double precision)
    Float(f64),

    /// Text value
    Str(String),

    /// Single character
    Char(char),

    /// Boolean value (`yes` / `no` in source)
    Bool(bool),

    /// The `null` value
    Null,

    /// Ordered sequence of values, shared by handle
    Array(Rc<RefCell<Vec<Value>>>),

    /// Struct instance: type name plus fields in declaration order,
    /// shared by handle
    Struct {
        name: String,
        fields: Rc<RefCell<IndexMap<String, Value>>>,
    },

    /// Pointer produced by `the address of`
    Pointer(Address),
}

impl Value {
    /// Build an array value from its elements.
    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    /// Build a struct instance from its (ordered) fields.
    pub fn struct_instance(name: impl Into<String>, fields: IndexMap<String, Value>) -> Value {
        Value::Struct {
            name: name.into(),
            fields: Rc::new(RefCell::new(fields)),
        }
    }

    /// Truthiness used by conditional jumps and logical operations.
    ///
    /// Booleans use their own value; numeric zero, the empty string, the
    /// empty array and null are false; everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Array(items) => !items.borrow().is_empty(),
            Value::Null => false,
            _ => true,
        }
    }

    /// Equality as seen by the `EQ` / `NE` instructions.
    ///
    /// Same-variant values compare component-wise; Int and Float compare
    /// numerically against each other; all other cross-variant pairs are
    /// unequal.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Float(b)) => *a as f64 == *b,
            (Value::Float(a), Value::Int(b)) => *a == *b as f64,
            _ => self == other,
        }
    }

    /// Uppercase variant name, used in runtime diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "INT",
            Value::Float(_) => "FLOAT",
            Value::Str(_) => "STRING",
            Value::Char(_) => "CHAR",
            Value::Bool(_) => "BOOL",
            Value::Null => "NULL",
            Value::Array(_) => "ARRAY",
            Value::Struct { .. } => "STRUCT",
            Value::Pointer(_) => "POINTER",
        }
    }
}

/// Format a float the way the language prints decimals: integral values keep
/// one fractional digit so a decimal never reads as a whole number.
pub fn format_float(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 {
        format!("{:.1}", x)
    } else {
        format!("{}", x)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", format_float(*x)),
            Value::Str(s) => write!(f, "{}", s),
            Value::Char(c) => write!(f, "{}", c),
            Value::Bool(b) => write!(f, "{}", if *b { "yes" } else { "no" }),
            Value::Null => write!(f, "null"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Struct { name, fields } => {
                write!(f, "{} {{ ", name)?;
                for (i, (field, value)) in fields.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", field, value)?;
                }
                write!(f, " }}")
            }
            Value::Pointer(addr) => match addr {
                Address::Local { frame, slot } => write!(f, "<pointer local {}:{}>", frame, slot),
                Address::Global(name) => write!(f, "<pointer global {}>", name),
            },
        }
    }
}
