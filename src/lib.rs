//! Crate root: wires together the compilation pipeline.
//!
//! - `tokenizer` performs lexical analysis and produces a flat token stream.
//! - `parser` owns all syntactic knowledge and returns the program AST.
//! - `ty` and `env` resolve type annotations and stack addresses of bindings.
//! - `codegen` type-checks the AST and lowers it into [`Instruction`]s.
//! - `instruction` renders those instructions as NASM-style assembly.
//! - `error` centralises the error types shared by the other modules.

pub mod codegen;
pub mod env;
pub mod error;
pub mod instruction;
pub mod parser;
pub mod tokenizer;
pub mod ty;

pub use codegen::Compiler;
pub use env::{Binding, Environment};
pub use error::{CompileError, CompileResult, Error, Result};
pub use instruction::{Instruction, render};
pub use parser::{Program, Stmt};
pub use ty::{Type, TypeKind, TypeTable};

/// Tokenize and parse a source string.
pub fn parse_source(source: &str) -> Result<Program> {
  let tokens = tokenizer::tokenize(source)?;
  parser::parse(tokens, source)
}

/// Tokenize and parse a single statement, as typed at the REPL.
pub fn parse_statement(source: &str) -> Result<Stmt> {
  let tokens = tokenizer::tokenize(source)?;
  parser::parse_statement(tokens, source)
}

/// Lower a parsed program into instructions using a fresh compiler.
pub fn compile_program(program: &Program) -> Result<Vec<Instruction>> {
  codegen::compile(program)
}

/// Compile a source string into assembly text.
pub fn compile_source(source: &str) -> Result<String> {
  let program = parse_source(source)?;
  let instructions = compile_program(&program)?;
  Ok(render(&instructions))
}
