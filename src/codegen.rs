//! Code generation: lower the parsed program into abstract assembly.
//!
//! The emitter uses a single accumulator: every expression leaves its value
//! in `rax`. Intermediate operands are pushed onto the machine stack, and the
//! environment is extended with an anonymous slot for each push so that
//! identifiers compiled underneath still resolve to the right offset.

use std::sync::Arc;

use snafu::ResultExt;
use tracing::{debug, instrument, trace};

use crate::env::Environment;
use crate::error::{
  CompileResult, CompileSnafu, Result, TypeMismatchSnafu, UnknownTypeSnafu,
  UnsupportedExpressionSnafu,
};
use crate::instruction::{Instruction, RAX, RDI, stack_slot};
use crate::parser::{BinaryOp, Block, Expr, LetStmt, Program, Stmt};
use crate::ty::{Type, TypeTable};

/// Exit syscall number of the target (macOS/BSD class numbering).
const SYS_EXIT: &str = "0x2000001";
const ENTRY: &str = "_start";

/// Compile a whole program with a fresh [`Compiler`].
pub fn compile(program: &Program) -> Result<Vec<Instruction>> {
  Compiler::new().compile_program(program)
}

/// State for a single compilation run. Only the label counter lives here;
/// environments are passed explicitly.
#[derive(Debug, Default)]
pub struct Compiler {
  next_label: usize,
}

impl Compiler {
  pub fn new() -> Self {
    Self::default()
  }

  fn fresh_label(&mut self, prefix: &str) -> String {
    let label = format!("{prefix}_{}", self.next_label);
    self.next_label += 1;
    label
  }

  /// Compile every statement in order and wrap the result in the entry
  /// point prologue and the exit syscall epilogue. Whatever is left in the
  /// accumulator becomes the exit status.
  #[instrument(level = "debug", skip_all, fields(statements = program.stmts.len()))]
  pub fn compile_program(&mut self, program: &Program) -> Result<Vec<Instruction>> {
    let mut asm = vec![
      Instruction::section(".text"),
      Instruction::global(ENTRY),
      Instruction::label(ENTRY),
    ];

    let mut env = Environment::new(Arc::new(TypeTable::new()));
    for stmt in &program.stmts {
      let (code, next) = self
        .compile_stmt(stmt, &env)
        .context(CompileSnafu { pos: stmt.pos() })?;
      trace!(pos = stmt.pos(), emitted = code.len(), "compiled statement");
      asm.extend(code);
      env = next;
    }

    asm.push(Instruction::mov(RDI, RAX));
    asm.push(Instruction::mov(RAX, SYS_EXIT));
    asm.push(Instruction::syscall());

    debug!(
      instructions = asm.len(),
      frame_size = env.frame_size(),
      labels = self.next_label,
      "compiled program"
    );
    Ok(asm)
  }

  /// Compile a statement, returning its code and the environment that
  /// statements after it see.
  pub fn compile_stmt(
    &mut self,
    stmt: &Stmt,
    env: &Environment,
  ) -> CompileResult<(Vec<Instruction>, Environment)> {
    match stmt {
      Stmt::Let(stmt) => self.compile_let(stmt, env),
    }
  }

  fn compile_let(
    &mut self,
    stmt: &LetStmt,
    env: &Environment,
  ) -> CompileResult<(Vec<Instruction>, Environment)> {
    let (mut code, found) = self.compile_expr(&stmt.value, env)?;

    let declared = env.lookup_type(&stmt.ty).ok_or_else(|| {
      UnknownTypeSnafu {
        name: stmt.ty_source.as_str(),
      }
      .build()
    })?;

    if found != declared {
      return TypeMismatchSnafu {
        context: format!("declaration `{}: {}`", stmt.name, stmt.ty_source),
        expected: declared.to_string(),
        found: found.to_string(),
      }
      .fail();
    }

    code.push(Instruction::push(RAX));
    Ok((code, env.bind(&stmt.name, declared)))
  }

  /// Compile an expression so that its value ends up in the accumulator.
  pub fn compile_expr(
    &mut self,
    expr: &Expr,
    env: &Environment,
  ) -> CompileResult<(Vec<Instruction>, Type)> {
    match expr {
      Expr::Int { value } => Ok((vec![Instruction::mov(RAX, &value.to_string())], Type::INT)),
      Expr::Bool { value } => {
        let bit = if *value { "1" } else { "0" };
        Ok((vec![Instruction::mov(RAX, bit)], Type::BOOL))
      }
      Expr::Ident { name } => {
        let (offset, ty) = env.lexical_address(name)?;
        Ok((vec![Instruction::mov(RAX, &stack_slot(offset))], ty))
      }
      Expr::Binary { op, lhs, rhs } if op.is_comparison() => {
        self.compile_comparison(*op, lhs, rhs, env)
      }
      Expr::Binary { op, lhs, rhs } => self.compile_arithmetic(*op, lhs, rhs, env),
      Expr::Block(block) => self.compile_block(block, env),
      Expr::Lambda { .. } => UnsupportedExpressionSnafu {
        kind: expr.kind_name(),
      }
      .fail(),
    }
  }

  /// Evaluate `first` and push it, then evaluate `second` into the
  /// accumulator. Returns both operand types in evaluation order.
  fn compile_operands(
    &mut self,
    first: &Expr,
    second: &Expr,
    env: &Environment,
  ) -> CompileResult<(Vec<Instruction>, Type, Type)> {
    let (mut code, first_ty) = self.compile_expr(first, env)?;
    code.push(Instruction::push(RAX));

    let pushed = env.add_never(first_ty.size());
    let (second_code, second_ty) = self.compile_expr(second, &pushed)?;
    code.extend(second_code);

    Ok((code, first_ty, second_ty))
  }

  fn compile_arithmetic(
    &mut self,
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
    env: &Environment,
  ) -> CompileResult<(Vec<Instruction>, Type)> {
    // `sub rax, [rsp]` computes accumulator minus stack top, so subtraction
    // evaluates its right operand first and leaves the left one in rax.
    let (first, second) = match op {
      BinaryOp::Sub => (rhs, lhs),
      _ => (lhs, rhs),
    };
    let (mut code, first_ty, second_ty) = self.compile_operands(first, second, env)?;
    let (lhs_ty, rhs_ty) = match op {
      BinaryOp::Sub => (second_ty, first_ty),
      _ => (first_ty, second_ty),
    };
    expect_int_operands(op, lhs_ty, rhs_ty)?;

    let top = stack_slot(0);
    code.push(match op {
      BinaryOp::Sub => Instruction::sub(RAX, &top),
      _ => Instruction::add(RAX, &top),
    });
    code.push(Instruction::pop_bytes(first_ty.size()));

    Ok((code, first_ty))
  }

  fn compile_comparison(
    &mut self,
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
    env: &Environment,
  ) -> CompileResult<(Vec<Instruction>, Type)> {
    let (mut code, lhs_ty, rhs_ty) = self.compile_operands(lhs, rhs, env)?;
    expect_int_operands(op, lhs_ty, rhs_ty)?;

    let taken = self.fresh_label("cmp_true");
    let done = self.fresh_label("cmp_done");

    code.push(Instruction::cmp(&stack_slot(0), RAX));
    code.push(match op {
      BinaryOp::Gt => Instruction::jg(&taken),
      _ => Instruction::jl(&taken),
    });
    code.push(Instruction::mov(RAX, "0"));
    code.push(Instruction::jmp(&done));
    code.push(Instruction::label(&taken));
    code.push(Instruction::mov(RAX, "1"));
    code.push(Instruction::label(&done));
    code.push(Instruction::pop_bytes(lhs_ty.size()));

    Ok((code, Type::BOOL))
  }

  /// Blocks start from an empty scope: bindings of the enclosing code are not
  /// visible inside. The block's own bindings are released once its final
  /// expression has been evaluated.
  fn compile_block(
    &mut self,
    block: &Block,
    env: &Environment,
  ) -> CompileResult<(Vec<Instruction>, Type)> {
    let mut scope = env.scope();
    let mut code = Vec::new();
    for stmt in &block.stmts {
      let (stmt_code, next) = self.compile_stmt(stmt, &scope)?;
      code.extend(stmt_code);
      scope = next;
    }

    let (result_code, ty) = self.compile_expr(&block.result, &scope)?;
    code.extend(result_code);

    // The enclosing environment never saw these pushes, so its offsets are
    // only valid again once they are popped.
    let frame = scope.frame_size();
    if frame > 0 {
      code.push(Instruction::pop_bytes(frame));
    }
    Ok((code, ty))
  }
}

fn expect_int_operands(op: BinaryOp, lhs: Type, rhs: Type) -> CompileResult<()> {
  if lhs.is_integer() && rhs.is_integer() {
    return Ok(());
  }
  TypeMismatchSnafu {
    context: format!("operator `{}`", op.symbol()),
    expected: "int and int",
    found: format!("{lhs} and {rhs}"),
  }
  .fail()
}
