//! Lexical analysis: turns the raw input string into a vector of tokens.
//!
//! The tokenizer knows nothing about the grammar beyond recognising
//! keywords, identifiers, punctuators and integer literals. Multi-character
//! punctuators are matched before single-character ones to avoid ambiguity.

use crate::error::{Error, Result};

/// Words that can never be used as identifiers.
pub const KEYWORDS: [&str; 4] = ["let", "fn", "true", "false"];

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  Punctuator,
  Keyword,
  Ident,
  Num,
  Eof,
}

/// Thin wrapper for lexical information needed by later stages.
#[derive(Debug, Clone)]
pub struct Token {
  pub kind: TokenKind,
  pub value: Option<i64>,
  pub loc: usize,
  pub len: usize,
}

impl Token {
  /// Convenience constructor to keep the `tokenize` loop readable.
  pub fn new(kind: TokenKind, loc: usize, len: usize, value: Option<i64>) -> Self {
    Self {
      kind,
      value,
      loc,
      len,
    }
  }
}

/// Lex the input into a flat vector of tokens terminated by an `Eof` marker.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
  let mut tokens = Vec::new();
  let bytes = input.as_bytes();
  let mut i = 0;

  while i < bytes.len() {
    let c = bytes[i];
    if c.is_ascii_whitespace() {
      i += 1;
      continue;
    }

    if c.is_ascii_digit() {
      let start = i;
      i += 1;
      while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
      }
      let text = &input[start..i];
      let value = text
        .parse::<i64>()
        .map_err(|err| Error::at(start, format!("invalid number: {err}")))?;
      tokens.push(Token::new(TokenKind::Num, start, i - start, Some(value)));
      continue;
    }

    if c.is_ascii_alphabetic() || c == b'_' {
      let start = i;
      i += 1;
      while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
      }
      let kind = if KEYWORDS.contains(&&input[start..i]) {
        TokenKind::Keyword
      } else {
        TokenKind::Ident
      };
      tokens.push(Token::new(kind, start, i - start, None));
      continue;
    }

    if input[i..].starts_with("->") {
      tokens.push(Token::new(TokenKind::Punctuator, i, 2, None));
      i += 2;
      continue;
    }

    if matches!(
      c,
      b'+' | b'-' | b'<' | b'>' | b':' | b'=' | b'(' | b')' | b'{' | b'}' | b','
    ) {
      tokens.push(Token::new(TokenKind::Punctuator, i, 1, None));
      i += 1;
      continue;
    }

    let invalid_char = input[i..].chars().next().unwrap_or('\0');
    return Err(Error::at(i, format!("invalid token: '{invalid_char}'")));
  }

  tokens.push(Token::new(TokenKind::Eof, input.len(), 0, None));
  Ok(tokens)
}

/// Return the slice from the source that produced this token.
pub fn token_text<'a>(token: &Token, source: &'a str) -> &'a str {
  let end = token.loc + token.len;
  &source[token.loc..end]
}

/// Human-friendly description used in diagnostics.
pub fn describe_token(token: Option<&Token>, source: &str) -> String {
  match token {
    Some(t) => match t.kind {
      TokenKind::Eof => "EOF".to_string(),
      _ => token_text(t, source).to_string(),
    },
    None => "EOF".to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn kinds_and_text(source: &str) -> Vec<(TokenKind, &str)> {
    tokenize(source)
      .unwrap()
      .iter()
      .map(|t| (t.kind, token_text(t, source)))
      .collect()
  }

  #[test]
  fn lexes_let_statement() {
    assert_eq!(
      kinds_and_text("let foo: int = 123"),
      vec![
        (TokenKind::Keyword, "let"),
        (TokenKind::Ident, "foo"),
        (TokenKind::Punctuator, ":"),
        (TokenKind::Ident, "int"),
        (TokenKind::Punctuator, "="),
        (TokenKind::Num, "123"),
        (TokenKind::Eof, ""),
      ]
    );
  }

  #[test]
  fn arrow_wins_over_minus() {
    let tokens = kinds_and_text("(int)->bool - 1");
    assert_eq!(tokens[3], (TokenKind::Punctuator, "->"));
    assert_eq!(tokens[5], (TokenKind::Punctuator, "-"));
  }

  #[test]
  fn keywords_need_word_boundaries() {
    let tokens = kinds_and_text("letter true_ fn");
    assert_eq!(tokens[0], (TokenKind::Ident, "letter"));
    assert_eq!(tokens[1], (TokenKind::Ident, "true_"));
    assert_eq!(tokens[2], (TokenKind::Keyword, "fn"));
  }

  #[test]
  fn numbers_carry_values_and_offsets() {
    let tokens = tokenize("  42 7").unwrap();
    assert_eq!(tokens[0].value, Some(42));
    assert_eq!(tokens[0].loc, 2);
    assert_eq!(tokens[1].value, Some(7));
    assert_eq!(tokens[2].kind, TokenKind::Eof);
    assert_eq!(tokens[2].loc, 6);
  }

  #[test]
  fn rejects_unknown_characters() {
    let err = tokenize("let x: int = 3 * 4").unwrap_err();
    assert_eq!(err.pos(), 15);
    assert_eq!(err.to_string(), "invalid token: '*'");
  }

  #[test]
  fn rejects_overflowing_literal() {
    let err = tokenize("99999999999999999999").unwrap_err();
    assert!(err.to_string().starts_with("invalid number"));
  }
}
