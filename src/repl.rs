//! Interactive loop: each line is parsed as one statement and its AST (or
//! the syntax error) is printed back.

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

const PROMPT: &str = ">> ";

pub fn run() -> Result<(), ReadlineError> {
  let mut rl = DefaultEditor::new()?;

  loop {
    let line = match rl.readline(PROMPT) {
      Ok(line) => line,
      // Ctrl-C drops the current line only.
      Err(ReadlineError::Interrupted) => continue,
      Err(ReadlineError::Eof) => break,
      Err(err) => return Err(err),
    };

    if line.trim().is_empty() {
      continue;
    }
    let _ = rl.add_history_entry(line.as_str());
    debug!(bytes = line.len(), "repl line");

    println!("{}", describe(&line));
  }

  Ok(())
}

fn describe(line: &str) -> String {
  match stackc::parse_statement(line) {
    Ok(stmt) => format!("{stmt:#?}"),
    Err(err) => err.render(line),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn prints_statement_ast() {
    let out = describe("let x: bool = 5 < 4");
    assert!(out.starts_with("Let("));
    assert!(out.contains("name: \"x\""));
    assert!(out.contains("op: Lt"));
  }

  #[test]
  fn prints_caret_for_syntax_error() {
    assert_eq!(
      describe("let 1: int = 2"),
      "line 1: let 1: int = 2\n            ^ expected an identifier, but got \"1\""
    );
  }
}
