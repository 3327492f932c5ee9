use std::fs;
use assert_cmd::Command;

use predicates::prelude::*;
use tempfile::TempDir;

fn bin() -> Command {
  Command::new(assert_cmd::cargo::cargo_bin!("stackc"))
}

fn write_source(dir: &TempDir, contents: &str) -> std::path::PathBuf {
  let path = dir.path().join("main.sc");
  fs::write(&path, contents).expect("write source");
  path
}

#[test]
fn compiles_to_stdout() {
  let dir = TempDir::new().unwrap();
  let input = write_source(&dir, "let x: int = 10 - 3\n");

  bin()
    .arg(&input)
    .assert()
    .success()
    .stdout(predicate::str::starts_with("section .text\nglobal _start\n_start:\n"))
    .stdout(predicate::str::contains("\tsub rax, [rsp]\n"))
    .stdout(predicate::str::ends_with("\tsyscall\n"));
}

#[test]
fn writes_output_file() {
  let dir = TempDir::new().unwrap();
  let input = write_source(&dir, "let ok: bool = 1 < 2\n");
  let output = dir.path().join("main.asm");

  bin()
    .arg(&input)
    .arg("-o")
    .arg(&output)
    .assert()
    .success()
    .stdout(predicate::str::is_empty());

  let asm = fs::read_to_string(&output).unwrap();
  assert!(asm.contains("\tjl cmp_true_0\n"));
}

#[test]
fn reports_compile_error_with_caret() {
  let dir = TempDir::new().unwrap();
  let input = write_source(&dir, "let a: int = 1\nlet b: bool = a + 1\n");
  let output = dir.path().join("main.asm");

  bin()
    .arg(&input)
    .arg("--output")
    .arg(&output)
    .assert()
    .failure()
    .code(1)
    .stderr(predicate::str::contains("line 2: let b: bool = a + 1"))
    .stderr(predicate::str::contains(
      "^ type mismatch in declaration `b: bool`: expected bool, found int",
    ));

  assert!(!output.exists());
}

#[test]
fn reports_syntax_error() {
  let dir = TempDir::new().unwrap();
  let input = write_source(&dir, "let a: int = 1 * 2\n");

  bin()
    .arg(&input)
    .assert()
    .failure()
    .stderr(predicate::str::contains("invalid token: '*'"));
}

#[test]
fn missing_input_fails() {
  bin()
    .arg("does/not/exist.sc")
    .assert()
    .failure()
    .stderr(predicate::str::contains("cannot read does/not/exist.sc"));
}

#[test]
fn emits_tokens_and_ast() {
  let dir = TempDir::new().unwrap();
  let input = write_source(&dir, "let a: int = 1");

  bin()
    .arg(&input)
    .args(["--emit", "tokens"])
    .assert()
    .success()
    .stdout(predicate::str::contains("0\tKeyword\tlet\n"))
    .stdout(predicate::str::contains("14\tEof\t\n"));

  bin()
    .arg(&input)
    .args(["--emit", "ast"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Let("))
    .stdout(predicate::str::contains("name: \"a\""));
}

#[test]
fn repl_prints_one_statement_per_line() {
  bin()
    .arg("--repl")
    .write_stdin("let x: bool = 5 < 4\n\nlet 1: int = 2\n")
    .assert()
    .success()
    .stdout(predicate::str::contains("Let("))
    .stdout(predicate::str::contains("op: Lt"))
    .stdout(predicate::str::contains(
      "^ expected an identifier, but got \"1\"",
    ));
}

#[test]
fn repl_rejects_trailing_statement() {
  bin()
    .arg("--repl")
    .write_stdin("let a: int = 1 let b: int = 2\n")
    .assert()
    .success()
    .stdout(predicate::str::contains(
      "expected end of input, but got \"let\"",
    ));
}

#[test]
fn input_required_without_repl() {
  bin().assert().failure().stderr(predicate::str::contains("INPUT"));
}
