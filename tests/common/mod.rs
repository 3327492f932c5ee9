//! A tiny interpreter for the instruction subset the compiler emits, so
//! tests can check what generated code computes rather than how it looks.

use std::cmp::Ordering;
use std::collections::HashMap;

use stackc::Instruction;

const STACK_BASE: i64 = 0x10000;
const MAX_STEPS: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
  /// Value of `rdi` when the exit syscall ran.
  pub status: i64,
  /// Bytes still pushed on the stack at exit.
  pub stack_bytes: i64,
}

#[derive(Default)]
struct Machine {
  rax: i64,
  rdi: i64,
  rsp: i64,
  memory: HashMap<i64, i64>,
  flags: Option<Ordering>,
}

impl Machine {
  fn read(&self, operand: &str) -> i64 {
    match operand {
      "rax" => self.rax,
      "rdi" => self.rdi,
      "rsp" => self.rsp,
      _ if operand.starts_with('[') => {
        let addr = self.address(operand);
        *self
          .memory
          .get(&addr)
          .unwrap_or_else(|| panic!("read of uninitialised stack slot {operand}"))
      }
      _ => match operand.strip_prefix("0x") {
        Some(hex) => i64::from_str_radix(hex, 16).unwrap(),
        None => operand.parse().unwrap(),
      },
    }
  }

  fn write(&mut self, operand: &str, value: i64) {
    match operand {
      "rax" => self.rax = value,
      "rdi" => self.rdi = value,
      "rsp" => self.rsp = value,
      _ => {
        let addr = self.address(operand);
        self.memory.insert(addr, value);
      }
    }
  }

  fn address(&self, operand: &str) -> i64 {
    let inner = operand
      .strip_prefix("[rsp")
      .and_then(|s| s.strip_suffix(']'))
      .unwrap_or_else(|| panic!("unsupported memory operand {operand}"));
    let offset = match inner.strip_prefix('+') {
      Some(n) => n.parse::<i64>().unwrap(),
      None if inner.is_empty() => 0,
      None => panic!("unsupported memory operand {operand}"),
    };
    self.rsp + offset
  }
}

/// Execute from `_start` until the exit syscall.
pub fn run(instructions: &[Instruction]) -> Outcome {
  let labels: HashMap<&str, usize> = instructions
    .iter()
    .enumerate()
    .filter(|(_, i)| i.is_label())
    .map(|(pc, i)| (i.opcode(), pc))
    .collect();

  let mut m = Machine {
    rsp: STACK_BASE,
    ..Machine::default()
  };
  let mut pc = labels["_start"];

  for _ in 0..MAX_STEPS {
    let instruction = &instructions[pc];
    pc += 1;
    if !instruction.is_indented() {
      continue;
    }

    let ops = instruction.operands();
    match instruction.opcode() {
      "mov" => {
        let value = m.read(&ops[1]);
        m.write(&ops[0], value);
      }
      "push" => {
        let value = m.read(&ops[0]);
        m.rsp -= 8;
        m.memory.insert(m.rsp, value);
      }
      "add" => {
        let value = m.read(&ops[0]).wrapping_add(m.read(&ops[1]));
        m.write(&ops[0], value);
      }
      "sub" => {
        let value = m.read(&ops[0]).wrapping_sub(m.read(&ops[1]));
        m.write(&ops[0], value);
      }
      "cmp" => m.flags = Some(m.read(&ops[0]).cmp(&m.read(&ops[1]))),
      "jmp" => pc = labels[ops[0].as_str()],
      "jl" if m.flags == Some(Ordering::Less) => pc = labels[ops[0].as_str()],
      "jg" if m.flags == Some(Ordering::Greater) => pc = labels[ops[0].as_str()],
      "jl" | "jg" => {}
      "syscall" => {
        assert_eq!(m.rax, 0x2000001, "only the exit syscall is supported");
        return Outcome {
          status: m.rdi,
          stack_bytes: STACK_BASE - m.rsp,
        };
      }
      other => panic!("unsupported opcode {other}"),
    }
  }
  panic!("program did not exit within {MAX_STEPS} steps");
}

/// Compile `source` and run it.
pub fn eval(source: &str) -> Outcome {
  let program = stackc::parse_source(source).unwrap();
  run(&stackc::compile_program(&program).unwrap())
}
