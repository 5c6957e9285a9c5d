use std::fmt;

use super::TextSpan;

/// The lexical category of a [`Token`].
///
/// Mirrors `lrpy/parser/tokens.py::TokenType` one-for-one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
  ForeignBlock,
  String,
  Identifier,
  Newline,
  Eof,
  OpenParen,
  CloseParen,
  OpenBracket,
  CloseBracket,
  Colon,
  Plus,
  Star,
  Dollar,
  Arrow,
}

impl fmt::Display for TokenType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      TokenType::ForeignBlock => "foreign block",
      TokenType::String => "string",
      TokenType::Identifier => "identifier",
      TokenType::Newline => "newline",
      TokenType::Eof => "end of file",
      TokenType::OpenParen => "'('",
      TokenType::CloseParen => "')'",
      TokenType::OpenBracket => "'['",
      TokenType::CloseBracket => "']'",
      TokenType::Colon => "':'",
      TokenType::Plus => "'+'",
      TokenType::Star => "'*'",
      TokenType::Dollar => "'$'",
      TokenType::Arrow => "'=>'",
    };
    f.write_str(name)
  }
}

/// A single lexical token produced by the [`crate::scanner::Scanner`].
///
/// Only `Identifier`, `String`, and `ForeignBlock` carry `content`; all
/// other token types set it to `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub type_:  TokenType,
  pub span:   TextSpan,
  pub content: Option<String>,
}

impl Token {
  pub fn new(type_: TokenType, span: TextSpan) -> Self {
    Self { type_, span, content: None }
  }

  pub fn with_content(type_: TokenType, span: TextSpan, content: impl Into<String>) -> Self {
    Self { type_, span, content: Some(content.into()) }
  }

  /// The token's text content. Panics if this token type never carries
  /// content — callers match on `type_` first.
  pub fn content(&self) -> &str {
    self.content.as_deref().expect("token type does not carry content")
  }
}

impl fmt::Display for Token {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.content {
      Some(content) => write!(f, "<{} content={:?} {}>", self.type_, content, self.span),
      None => write!(f, "<{} {}>", self.type_, self.span),
    }
  }
}
