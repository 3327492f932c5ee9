use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use rustyline::error::ReadlineError;
use snafu::{ResultExt, Snafu};
use tracing::{debug, info};

use stackc::tokenizer::{self, token_text};

mod repl;

#[derive(Parser, Debug)]
#[command(name = "stackc", about = "Compile a stackc program to x86-64 assembly", version)]
struct Cli {
  /// Source file to compile
  #[arg(required_unless_present = "repl")]
  input: Option<PathBuf>,
  /// Read statements interactively and print their syntax trees
  #[arg(long, conflicts_with_all = ["input", "output"])]
  repl: bool,
  /// Where to write the result (stdout when omitted)
  #[arg(short, long)]
  output: Option<PathBuf>,
  /// What to produce
  #[arg(long, value_enum, default_value_t = Emit::Asm)]
  emit: Emit,
  /// Log level (trace|debug|info|warn|error); falls back to RUST_LOG
  #[arg(long)]
  log_level: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Emit {
  Tokens,
  Ast,
  Asm,
}

#[derive(Debug, Snafu)]
enum DriverError {
  #[snafu(display("cannot read {}: {source}", path.display()))]
  ReadInput {
    path: PathBuf,
    source: std::io::Error,
  },
  #[snafu(display("cannot write {}: {source}", path.display()))]
  WriteOutput {
    path: PathBuf,
    source: std::io::Error,
  },
  #[snafu(display("{}:\n{rendered}", path.display()))]
  Compile { path: PathBuf, rendered: String },
  #[snafu(display("repl: {source}"))]
  Repl { source: ReadlineError },
  #[snafu(display("no input file given"))]
  MissingInput,
}

fn init_logging(level: Option<&str>) {
  let directive = match level {
    Some(l) if !l.is_empty() => l.to_string(),
    _ => std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string()),
  };
  let filter = tracing_subscriber::EnvFilter::try_new(&directive).unwrap_or_else(|e| {
    eprintln!("WARN: invalid log level '{directive}': {e}; falling back to 'warn'");
    tracing_subscriber::EnvFilter::new("warn")
  });
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(true)
    .compact()
    .try_init();
}

fn emit(cli: &Cli, source: &str) -> stackc::Result<String> {
  match cli.emit {
    Emit::Tokens => {
      let tokens = tokenizer::tokenize(source)?;
      Ok(
        tokens
          .iter()
          .map(|t| format!("{}\t{:?}\t{}\n", t.loc, t.kind, token_text(t, source)))
          .collect(),
      )
    }
    Emit::Ast => Ok(format!("{:#?}\n", stackc::parse_source(source)?)),
    Emit::Asm => stackc::compile_source(source),
  }
}

fn run(cli: &Cli) -> Result<(), DriverError> {
  match &cli.input {
    _ if cli.repl => repl::run().context(ReplSnafu),
    Some(input) => compile_file(cli, input),
    None => MissingInputSnafu.fail(),
  }
}

fn compile_file(cli: &Cli, input: &Path) -> Result<(), DriverError> {
  let source = fs::read_to_string(input).context(ReadInputSnafu { path: input })?;
  debug!(path = %input.display(), bytes = source.len(), "read input");

  let output = match emit(cli, &source) {
    Ok(output) => output,
    Err(err) => {
      return CompileSnafu {
        path: input,
        rendered: err.render(&source),
      }
      .fail();
    }
  };

  match &cli.output {
    Some(path) => {
      fs::write(path, &output).context(WriteOutputSnafu { path })?;
      info!(path = %path.display(), bytes = output.len(), "wrote output");
    }
    None => print!("{output}"),
  }
  Ok(())
}

fn main() {
  let cli = Cli::parse();
  init_logging(cli.log_level.as_deref());

  if let Err(err) = run(&cli) {
    eprintln!("{err}");
    process::exit(1);
  }
}
