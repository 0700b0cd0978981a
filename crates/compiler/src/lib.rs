//! Zinc compiler library.
//!
//! The pipeline is strictly linear: source text is tokenized by the phrase
//! lexer, parsed into an AST, and lowered to stack bytecode. The same AST
//! also feeds the C transpiler. Execution lives in the `zinc-vm` crate.

pub mod ast;
pub mod codegen;
pub mod lexer;
pub mod parser;
pub mod transpiler;

pub use codegen::Compiler;
pub use lexer::{tokenize, Lexer, Token, TokenKind};
pub use parser::{parse, Parser};

use std::fs;
use std::path::Path;

/// Compile source text to a bytecode program.
pub fn compile_source(source: &str) -> Result<zinc_core::Program, String> {
    let program = parser::parse(source)?;
    codegen::compile(&program)
}

/// Transpile source text to C.
pub fn transpile_source(source: &str) -> Result<String, String> {
    let program = parser::parse(source)?;
    Ok(transpiler::transpile(&program))
}

/// Read and compile a source file.
pub fn compile_file(path: &Path) -> Result<zinc_core::Program, String> {
    let source = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    compile_source(&source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_compiles_hello_world() {
        let program = compile_source(
            "include the standard input and output\n\nto do the main thing:\nsay \"Hello, World!\"\nend\n",
        )
        .unwrap();
        assert_eq!(program.entry.as_deref(), Some("main"));
        assert!(program.functions.contains_key("main"));
    }

    #[test]
    fn test_error_kinds_are_labelled() {
        // Lex error
        let err = compile_source("to do the main thing:\nsay \"oops\nend\n").unwrap_err();
        assert!(err.starts_with("Lexer error"), "got: {}", err);

        // Parse error
        let err = compile_source("to do the main thing:\nsay\nend\n").unwrap_err();
        assert!(err.starts_with("Parse error"), "got: {}", err);

        // Compile error
        let err =
            compile_source("to do the main thing:\nstop the loop\nend\n").unwrap_err();
        assert!(err.starts_with("Compile error"), "got: {}", err);
    }

    #[test]
    fn test_transpile_source_produces_c() {
        let c = transpile_source("to do the main thing:\nsay 1\nend\n").unwrap();
        assert!(c.contains("int main(void)"));
    }
}
