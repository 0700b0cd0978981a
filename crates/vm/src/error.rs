//! Runtime error types for the Zinc VM.
//!
//! Errors are never swallowed: every fault stops execution and is reported
//! with the source line of the instruction that raised it.

use std::fmt;
use std::io;

/// Error raised while executing a single instruction.
#[derive(Debug)]
pub enum VmError {
    /// A fault in the executing program (bad index, missing function, ...)
    Fault(String),
    /// An I/O failure while reading input or writing output
    Io(io::Error),
}

impl VmError {
    pub fn fault(msg: impl Into<String>) -> VmError {
        VmError::Fault(msg.into())
    }
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmError::Fault(msg) => write!(f, "{}", msg),
            VmError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for VmError {}

impl From<String> for VmError {
    fn from(msg: String) -> Self {
        VmError::Fault(msg)
    }
}

impl From<io::Error> for VmError {
    fn from(e: io::Error) -> Self {
        VmError::Io(e)
    }
}

/// A `VmError` annotated with the source line of the faulting instruction.
#[derive(Debug)]
pub struct RuntimeError {
    pub line: usize,
    pub error: VmError,
}

impl RuntimeError {
    pub fn new(line: usize, msg: impl Into<String>) -> RuntimeError {
        RuntimeError {
            line,
            error: VmError::Fault(msg.into()),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Runtime error at line {}: {}", self.line, self.error)
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
