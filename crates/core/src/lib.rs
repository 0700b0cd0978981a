//! Zinc core — shared definitions for the compiler and the virtual machine.
//!
//! Holds the bytecode instruction set (`Op`, `Instruction`, `Function`,
//! `Program`) and the runtime value model (`Value`). Everything else in the
//! toolchain builds on this crate.

pub mod bytecode;
pub mod value;

pub use bytecode::{AddressTarget, Constant, Function, Instruction, Op, Program, StructDef};
pub use value::{Address, Value};
