//! Converts grammar source text into a token stream.
//!
//! Grounded on `lrpy/parser/scanner.py::GrammarScanner`, extended per spec
//! §4.2 with brace-depth tracking inside foreign blocks (the original scans
//! to the first unescaped `}`, which cannot round-trip an action body that
//! itself contains a block-structured expression).

use log::trace;

use super::diagnostics::SourceMap;
use super::reader::{self, StringReader};
use super::types::{LrgenError, LrgenResult, TextSpan, Token, TokenType};

/// Token stream over a single grammar source buffer.
///
/// Tracks a `parenstack` of open-bracket token types so `)`/`]` can be
/// matched against the right opener, and a `newline` flag that collapses a
/// run of consecutive logical newlines into a single `NEWLINE` token.
pub struct Scanner<'src> {
  reader:     StringReader<'src>,
  map:        SourceMap<'src>,
  parenstack: Vec<TokenType>,
  newline:    bool,
}

impl<'src> Scanner<'src> {
  pub fn new(source: &'src str, filename: impl Into<String>) -> Self {
    Self {
      reader:     StringReader::new(source),
      map:        SourceMap::new(source, filename),
      parenstack: Vec::new(),
      newline:    false,
    }
  }

  pub fn source_map(&self) -> &SourceMap<'src> {
    &self.map
  }

  fn error(&self, message: impl Into<String>, span: TextSpan) -> LrgenError {
    LrgenError::invalid_grammar(&self.map, message, span)
  }

  /// Produces the next token, advancing the cursor past it.
  pub fn scan(&mut self) -> LrgenResult<Token> {
    loop {
      self.reader.skip_whitespace();

      if self.reader.at_eof() {
        let pos = self.reader.tell();
        return Ok(Token::new(TokenType::Eof, TextSpan::empty(pos)));
      }

      if self.reader.peek(0) == '#' {
        while !reader::is_linebreak(self.reader.peek(0)) && !self.reader.at_eof() {
          self.reader.advance(1);
        }
        continue;
      }

      let start = self.reader.tell();
      let c = self.reader.peek(0);

      if reader::is_linebreak(c) {
        self.reader.advance(1);

        if !self.parenstack.is_empty() || self.newline {
          continue;
        }

        self.newline = true;
        let token = Token::new(TokenType::Newline, TextSpan::new(start, self.reader.tell()));
        trace!("scanned {token}");
        return Ok(token);
      }

      self.newline = false;

      let token = if reader::is_identifier_start(c) {
        self.scan_identifier(start)
      } else if c == '\'' || c == '"' {
        self.scan_string(start, c)?
      } else if c == '{' {
        self.scan_foreign_block(start)?
      } else if c == '(' {
        self.reader.advance(1);
        self.parenstack.push(TokenType::OpenParen);
        Token::new(TokenType::OpenParen, self.span_from(start))
      } else if c == ')' {
        self.reader.advance(1);
        self.close_bracket(start, TokenType::OpenParen, "parenthesis")?
      } else if c == '[' {
        self.reader.advance(1);
        self.parenstack.push(TokenType::OpenBracket);
        Token::new(TokenType::OpenBracket, self.span_from(start))
      } else if c == ']' {
        self.reader.advance(1);
        self.close_bracket(start, TokenType::OpenBracket, "bracket")?
      } else if c == ':' {
        self.reader.advance(1);
        Token::new(TokenType::Colon, self.span_from(start))
      } else if c == '+' {
        self.reader.advance(1);
        Token::new(TokenType::Plus, self.span_from(start))
      } else if c == '*' {
        self.reader.advance(1);
        Token::new(TokenType::Star, self.span_from(start))
      } else if c == '$' {
        self.reader.advance(1);
        Token::new(TokenType::Dollar, self.span_from(start))
      } else if c == '=' && self.reader.peek(1) == '>' {
        self.reader.advance(2);
        Token::new(TokenType::Arrow, self.span_from(start))
      } else {
        return Err(self.error("Invalid Token", self.span_from(start)));
      };

      trace!("scanned {token}");
      return Ok(token);
    }
  }

  fn span_from(&self, start: usize) -> TextSpan {
    TextSpan::new(start, self.reader.tell())
  }

  fn scan_identifier(&mut self, start: usize) -> Token {
    self.reader.advance(1);
    self.reader.skip(reader::is_identifier_continue);
    let content = &self.reader.source()[start..self.reader.tell()];
    Token::with_content(TokenType::Identifier, self.span_from(start), content)
  }

  fn scan_string(&mut self, start: usize, terminator: char) -> LrgenResult<Token> {
    self.reader.advance(1);
    let content_start = self.reader.tell();

    loop {
      if reader::is_linebreak(self.reader.peek(0)) || self.reader.at_eof() {
        return Err(self.error("Unterminated string literal", self.span_from(start)));
      }

      if reader::is_escape(self.reader.peek(0)) {
        self.reader.advance(2);
        continue;
      }

      if self.reader.peek(0) == terminator {
        break;
      }

      self.reader.advance(1);
    }

    let content = self.reader.source()[content_start..self.reader.tell()].to_string();
    self.reader.advance(1);
    Ok(Token::with_content(TokenType::String, self.span_from(start), content))
  }

  fn scan_foreign_block(&mut self, start: usize) -> LrgenResult<Token> {
    self.reader.advance(1);
    let content_start = self.reader.tell();
    let mut depth = 0usize;

    loop {
      if self.reader.at_eof() {
        return Err(self.error("Unterminated block", self.span_from(start)));
      }

      match self.reader.peek(0) {
        '{' => {
          depth += 1;
          self.reader.advance(1);
        }
        '}' if depth == 0 => break,
        '}' => {
          depth -= 1;
          self.reader.advance(1);
        }
        _ => {
          self.reader.advance(1);
        }
      }
    }

    let content = self.reader.source()[content_start..self.reader.tell()].to_string();
    self.reader.advance(1);
    Ok(Token::with_content(TokenType::ForeignBlock, self.span_from(start), content))
  }

  fn close_bracket(&mut self, start: usize, expected: TokenType, name: &str) -> LrgenResult<Token> {
    let opened = self.parenstack.pop();
    if opened != Some(expected) {
      return Err(self.error(format!("Unmatched closing {name}"), self.span_from(start)));
    }

    let type_ = match expected {
      TokenType::OpenParen => TokenType::CloseParen,
      TokenType::OpenBracket => TokenType::CloseBracket,
      _ => unreachable!("close_bracket only called for paren/bracket openers"),
    };

    Ok(Token::new(type_, self.span_from(start)))
  }
}
