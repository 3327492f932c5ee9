//! Shared error types used across the compilation pipeline.
//!
//! Two layers exist: [`CompileError`] describes what went wrong while
//! lowering the AST and knows nothing about the source text, while [`Error`]
//! is what the pipeline hands back to callers and always carries the byte
//! offset the problem is anchored at.

use snafu::Snafu;

pub type CompileResult<T> = Result<T, CompileError>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Semantic failures raised by the type table, environment and compiler.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CompileError {
  #[snafu(display("unknown type `{name}`"))]
  UnknownType { name: String },

  #[snafu(display("type mismatch in {context}: expected {expected}, found {found}"))]
  TypeMismatch {
    context: String,
    expected: String,
    found: String,
  },

  #[snafu(display("unbound variable `{name}`"))]
  UnboundVariable { name: String },

  #[snafu(display("unsupported expression: {kind} cannot be compiled"))]
  UnsupportedExpression { kind: &'static str },
}

/// Error returned by the pipeline, anchored at a byte offset in the source.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
  #[snafu(display("{message}"))]
  Syntax { pos: usize, message: String },

  #[snafu(display("{source}"))]
  Compile { pos: usize, source: CompileError },
}

impl Error {
  /// Construct a syntax error anchored at a specific byte offset.
  pub fn at(pos: usize, message: impl Into<String>) -> Self {
    SyntaxSnafu { pos, message }.build()
  }

  pub fn pos(&self) -> usize {
    match self {
      Self::Syntax { pos, .. } | Self::Compile { pos, .. } => *pos,
    }
  }

  /// The semantic error, if this failure came from the compiler.
  pub fn compile_error(&self) -> Option<&CompileError> {
    match self {
      Self::Compile { source, .. } => Some(source),
      Self::Syntax { .. } => None,
    }
  }

  /// Format the error against `source`, pointing at the offending byte with
  /// a caret underneath the line that contains it.
  pub fn render(&self, source: &str) -> String {
    let mut loc = self.pos().min(source.len());
    while !source.is_char_boundary(loc) {
      loc -= 1;
    }

    let line_start = source[..loc].rfind('\n').map_or(0, |i| i + 1);
    let line_end = source[loc..].find('\n').map_or(source.len(), |i| loc + i);
    let line_no = source[..line_start].matches('\n').count() + 1;
    let line = source[line_start..line_end].trim_end_matches('\r');

    let prefix = format!("line {line_no}: ");
    let column = source[line_start..loc].chars().count();
    let marker = format!("{}^", " ".repeat(prefix.len() + column));
    format!("{prefix}{line}\n{marker} {self}")
  }
}
