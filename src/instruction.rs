//! Abstract assembly instructions and their NASM-flavoured text form.

use std::fmt;

pub const RAX: &str = "rax";
pub const RDI: &str = "rdi";
pub const RSP: &str = "rsp";

/// One line of assembly: a machine instruction (indented), a directive or a
/// label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
  opcode: String,
  operands: Vec<String>,
  indented: bool,
}

impl Instruction {
  pub fn new(opcode: impl Into<String>, operands: Vec<String>, indented: bool) -> Self {
    Self {
      opcode: opcode.into(),
      operands,
      indented,
    }
  }

  fn op(opcode: &str, operands: &[&str]) -> Self {
    Self::new(
      opcode,
      operands.iter().map(|s| s.to_string()).collect(),
      true,
    )
  }

  pub fn opcode(&self) -> &str {
    &self.opcode
  }

  pub fn operands(&self) -> &[String] {
    &self.operands
  }

  pub fn is_indented(&self) -> bool {
    self.indented
  }

  pub fn is_label(&self) -> bool {
    !self.indented && self.operands.is_empty()
  }

  pub fn section(name: &str) -> Self {
    Self::new("section", vec![name.to_string()], false)
  }

  pub fn global(symbol: &str) -> Self {
    Self::new("global", vec![symbol.to_string()], false)
  }

  pub fn label(name: &str) -> Self {
    Self::new(name, Vec::new(), false)
  }

  pub fn mov(dst: &str, src: &str) -> Self {
    Self::op("mov", &[dst, src])
  }

  pub fn push(src: &str) -> Self {
    Self::op("push", &[src])
  }

  pub fn add(dst: &str, src: &str) -> Self {
    Self::op("add", &[dst, src])
  }

  pub fn sub(dst: &str, src: &str) -> Self {
    Self::op("sub", &[dst, src])
  }

  pub fn cmp(lhs: &str, rhs: &str) -> Self {
    Self::op("cmp", &[lhs, rhs])
  }

  pub fn jmp(label: &str) -> Self {
    Self::op("jmp", &[label])
  }

  pub fn jl(label: &str) -> Self {
    Self::op("jl", &[label])
  }

  pub fn jg(label: &str) -> Self {
    Self::op("jg", &[label])
  }

  pub fn syscall() -> Self {
    Self::op("syscall", &[])
  }

  /// Release `bytes` from the top of the stack.
  pub fn pop_bytes(bytes: usize) -> Self {
    Self::add(RSP, &bytes.to_string())
  }
}

/// Memory operand `offset` bytes above the stack pointer.
pub fn stack_slot(offset: usize) -> String {
  if offset == 0 {
    format!("[{RSP}]")
  } else {
    format!("[{RSP}+{offset}]")
  }
}

impl fmt::Display for Instruction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_label() {
      return write!(f, "{}:", self.opcode);
    }
    if self.indented {
      f.write_str("\t")?;
    }
    f.write_str(&self.opcode)?;
    if !self.operands.is_empty() {
      write!(f, " {}", self.operands.join(", "))?;
    }
    Ok(())
  }
}

/// Serialise instructions one per line.
pub fn render(instructions: &[Instruction]) -> String {
  let mut asm = String::new();
  for instruction in instructions {
    asm.push_str(&instruction.to_string());
    asm.push('\n');
  }
  asm
}
