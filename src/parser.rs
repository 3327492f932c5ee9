//! Recursive-descent parser producing the statement list and expression AST.
//!
//! Precedence is handled by a small ladder of helpers (comparison, then
//! additive, then unary/primary). Every binary level loops, so operators are
//! left-associative. Statements have no terminator: an expression simply ends
//! at the first token that cannot continue it.

use std::fmt;

use crate::error::{Error, Result};
use crate::tokenizer::{Token, TokenKind, describe_token, token_text};

/// Binary operators recognised by the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Sub,
  Lt,
  Gt,
}

impl BinaryOp {
  pub fn symbol(self) -> &'static str {
    match self {
      Self::Add => "+",
      Self::Sub => "-",
      Self::Lt => "<",
      Self::Gt => ">",
    }
  }

  pub fn is_comparison(self) -> bool {
    matches!(self, Self::Lt | Self::Gt)
  }
}

/// Type annotation as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
  Named {
    name: String,
  },
  Arrow {
    params: Vec<TypeExpr>,
    returns: Box<TypeExpr>,
  },
}

impl TypeExpr {
  pub fn named(name: impl Into<String>) -> Self {
    Self::Named { name: name.into() }
  }

  pub fn arrow(params: Vec<TypeExpr>, returns: TypeExpr) -> Self {
    Self::Arrow {
      params,
      returns: Box::new(returns),
    }
  }
}

impl fmt::Display for TypeExpr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Named { name } => f.write_str(name),
      Self::Arrow { params, returns } => {
        f.write_str("(")?;
        for (i, param) in params.iter().enumerate() {
          if i > 0 {
            f.write_str(", ")?;
          }
          write!(f, "{param}")?;
        }
        write!(f, ") -> {returns}")
      }
    }
  }
}

/// A lambda parameter: `name: type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
  pub name: String,
  pub ty: TypeExpr,
}

/// `{ stmt* expr }`: a scope whose value is its trailing expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
  pub stmts: Vec<Stmt>,
  pub result: Box<Expr>,
}

/// Expression tree produced by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
  Ident {
    name: String,
  },
  Int {
    value: i64,
  },
  Bool {
    value: bool,
  },
  Binary {
    op: BinaryOp,
    lhs: Box<Expr>,
    rhs: Box<Expr>,
  },
  Block(Block),
  Lambda {
    params: Vec<Param>,
    returns: TypeExpr,
    body: Block,
  },
}

impl Expr {
  pub fn ident(name: impl Into<String>) -> Self {
    Self::Ident { name: name.into() }
  }

  pub fn int(value: i64) -> Self {
    Self::Int { value }
  }

  pub fn bool(value: bool) -> Self {
    Self::Bool { value }
  }

  pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
    Self::Binary {
      op,
      lhs: Box::new(lhs),
      rhs: Box::new(rhs),
    }
  }

  pub fn block(stmts: Vec<Stmt>, result: Expr) -> Self {
    Self::Block(Block {
      stmts,
      result: Box::new(result),
    })
  }

  /// Short name of the node kind, used in diagnostics.
  pub fn kind_name(&self) -> &'static str {
    match self {
      Self::Ident { .. } => "identifier",
      Self::Int { .. } => "integer literal",
      Self::Bool { .. } => "boolean literal",
      Self::Binary { .. } => "binary expression",
      Self::Block(_) => "block",
      Self::Lambda { .. } => "lambda",
    }
  }
}

/// `let name: ty = value`, anchored at the `let` keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetStmt {
  pub name: String,
  pub ty: TypeExpr,
  /// The annotation exactly as written, for diagnostics.
  pub ty_source: String,
  pub value: Expr,
  pub pos: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
  Let(LetStmt),
}

impl Stmt {
  pub fn let_(name: impl Into<String>, ty: TypeExpr, value: Expr, pos: usize) -> Self {
    Self::Let(LetStmt {
      name: name.into(),
      ty_source: ty.to_string(),
      ty,
      value,
      pos,
    })
  }

  pub fn pos(&self) -> usize {
    match self {
      Self::Let(stmt) => stmt.pos,
    }
  }
}

/// A whole source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
  pub stmts: Vec<Stmt>,
}

/// Parse a sequence of statements from the token stream.
pub fn parse(tokens: Vec<Token>, source: &str) -> Result<Program> {
  let mut stream = TokenStream::new(tokens, source);

  if stream.is_eof() {
    return Err(Error::at(0, "program is empty"));
  }

  let mut stmts = Vec::new();
  while !stream.is_eof() {
    stmts.push(parse_stmt(&mut stream)?);
  }

  Ok(Program { stmts })
}

/// Parse exactly one statement; anything after it is an error.
pub fn parse_statement(tokens: Vec<Token>, source: &str) -> Result<Stmt> {
  let mut stream = TokenStream::new(tokens, source);

  if stream.is_eof() {
    return Err(Error::at(0, "statement is empty"));
  }

  let stmt = parse_stmt(&mut stream)?;
  if !stream.is_eof() {
    return Err(stream.unexpected("end of input"));
  }
  Ok(stmt)
}

fn parse_stmt(stream: &mut TokenStream) -> Result<Stmt> {
  let pos = stream.loc();
  stream.skip("let")?;
  let (name, _) = stream.get_ident()?;
  stream.skip(":")?;
  let ty_start = stream.loc();
  let ty = parse_type(stream)?;
  let ty_source = stream.source[ty_start..stream.prev_end()].to_string();
  stream.skip("=")?;
  let value = parse_expr(stream)?;
  Ok(Stmt::Let(LetStmt {
    name,
    ty,
    ty_source,
    value,
    pos,
  }))
}

fn parse_type(stream: &mut TokenStream) -> Result<TypeExpr> {
  if stream.equal("(") {
    let mut params = Vec::new();
    if !stream.equal(")") {
      loop {
        params.push(parse_type(stream)?);
        if stream.equal(")") {
          break;
        }
        stream.skip(",")?;
      }
    }
    stream.skip("->")?;
    let returns = parse_type(stream)?;
    return Ok(TypeExpr::arrow(params, returns));
  }

  let (name, _) = stream.get_ident()?;
  Ok(TypeExpr::named(name))
}

fn parse_expr(stream: &mut TokenStream) -> Result<Expr> {
  parse_relational(stream)
}

fn parse_relational(stream: &mut TokenStream) -> Result<Expr> {
  let mut node = parse_add(stream)?;

  loop {
    let op = if stream.equal("<") {
      BinaryOp::Lt
    } else if stream.equal(">") {
      BinaryOp::Gt
    } else {
      break;
    };

    let rhs = parse_add(stream)?;
    node = Expr::binary(op, node, rhs);
  }

  Ok(node)
}

fn parse_add(stream: &mut TokenStream) -> Result<Expr> {
  let mut node = parse_unary(stream)?;

  loop {
    let op = if stream.equal("+") {
      BinaryOp::Add
    } else if stream.equal("-") {
      BinaryOp::Sub
    } else {
      break;
    };

    let rhs = parse_unary(stream)?;
    node = Expr::binary(op, node, rhs);
  }

  Ok(node)
}

fn parse_unary(stream: &mut TokenStream) -> Result<Expr> {
  // Only literals can be negated; there is no negation operator.
  if stream.equal("-") {
    let (value, _) = stream.get_number()?;
    return Ok(Expr::int(-value));
  }

  parse_primary(stream)
}

fn parse_primary(stream: &mut TokenStream) -> Result<Expr> {
  if stream.equal("(") {
    let node = parse_expr(stream)?;
    stream.skip(")")?;
    return Ok(node);
  }

  if stream.equal("{") {
    return parse_block_body(stream).map(Expr::Block);
  }

  if stream.equal("fn") {
    return parse_lambda(stream);
  }

  if stream.equal("true") {
    return Ok(Expr::bool(true));
  }

  if stream.equal("false") {
    return Ok(Expr::bool(false));
  }

  match stream.peek().map(|token| token.kind) {
    Some(TokenKind::Ident) => {
      let (name, _) = stream.get_ident()?;
      Ok(Expr::ident(name))
    }
    Some(TokenKind::Num) => {
      let (value, _) = stream.get_number()?;
      Ok(Expr::int(value))
    }
    _ => Err(stream.unexpected("an expression")),
  }
}

/// Parse the remainder of a block once the opening brace has been consumed.
fn parse_block_body(stream: &mut TokenStream) -> Result<Block> {
  let mut stmts = Vec::new();
  while stream.at("let") {
    stmts.push(parse_stmt(stream)?);
  }
  let result = parse_expr(stream)?;
  stream.skip("}")?;
  Ok(Block {
    stmts,
    result: Box::new(result),
  })
}

fn parse_lambda(stream: &mut TokenStream) -> Result<Expr> {
  stream.skip("(")?;
  let mut params = Vec::new();
  if !stream.equal(")") {
    loop {
      let (name, _) = stream.get_ident()?;
      stream.skip(":")?;
      let ty = parse_type(stream)?;
      params.push(Param { name, ty });
      if stream.equal(")") {
        break;
      }
      stream.skip(",")?;
    }
  }
  stream.skip("->")?;
  let returns = parse_type(stream)?;
  stream.skip("{")?;
  let body = parse_block_body(stream)?;
  Ok(Expr::Lambda {
    params,
    returns,
    body,
  })
}

/// Lightweight cursor over the token vector.
struct TokenStream<'a> {
  tokens: Vec<Token>,
  source: &'a str,
  pos: usize,
}

impl<'a> TokenStream<'a> {
  /// Take ownership of the token stream; the parser will advance `pos` as it consumes input.
  fn new(tokens: Vec<Token>, source: &'a str) -> Self {
    Self {
      tokens,
      source,
      pos: 0,
    }
  }

  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos)
  }

  /// Byte offset of the current token.
  fn loc(&self) -> usize {
    self.peek().map_or(self.source.len(), |token| token.loc)
  }

  /// Byte offset just past the most recently consumed token.
  fn prev_end(&self) -> usize {
    self
      .pos
      .checked_sub(1)
      .and_then(|i| self.tokens.get(i))
      .map_or(0, |token| token.loc + token.len)
  }

  /// Whether the current token is the given punctuator or keyword.
  fn at(&self, op: &str) -> bool {
    self.peek().is_some_and(|token| {
      matches!(token.kind, TokenKind::Punctuator | TokenKind::Keyword)
        && token_text(token, self.source) == op
    })
  }

  /// Consume the current token if it matches the provided punctuator or keyword.
  fn equal(&mut self, op: &str) -> bool {
    if self.at(op) {
      self.pos += 1;
      return true;
    }
    false
  }

  fn skip(&mut self, s: &str) -> Result<()> {
    if self.equal(s) {
      Ok(())
    } else {
      Err(self.unexpected(&format!("\"{s}\"")))
    }
  }

  fn unexpected(&self, expected: &str) -> Error {
    let got = describe_token(self.peek(), self.source);
    Error::at(self.loc(), format!("expected {expected}, but got \"{got}\""))
  }

  /// Parse the current token as an integer literal returning its value and location.
  fn get_number(&mut self) -> Result<(i64, usize)> {
    if let Some(token) = self.peek()
      && token.kind == TokenKind::Num
    {
      let value = token
        .value
        .ok_or_else(|| Error::at(token.loc, "internal error: numeric token missing value"))?;
      let loc = token.loc;
      self.pos += 1;
      return Ok((value, loc));
    }

    Err(self.unexpected("a number"))
  }

  /// Parse the current token as an identifier.
  fn get_ident(&mut self) -> Result<(String, usize)> {
    if let Some(token) = self.peek()
      && token.kind == TokenKind::Ident
    {
      let name = token_text(token, self.source).to_string();
      let loc = token.loc;
      self.pos += 1;
      return Ok((name, loc));
    }

    Err(self.unexpected("an identifier"))
  }

  fn is_eof(&self) -> bool {
    matches!(self.peek().map(|token| token.kind), Some(TokenKind::Eof) | None)
  }
}
