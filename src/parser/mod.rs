//! Recursive-descent construction of the AST from the scanner's token
//! stream.
//!
//! Grounded on `lrpy/parser/parser.py::GrammarParser`: the same
//! `peek_token`/`consume_token` buffering scheme and the same grammar of
//! `rule`/`alternative`/`item`/`atom`, translated one production at a time.

pub mod ast;

use std::collections::VecDeque;

use log::trace;

use super::diagnostics::SourceMap;
use super::scanner::Scanner;
use super::types::{LrgenError, LrgenResult, Token, TokenType};

pub struct Parser<'src> {
  scanner: Scanner<'src>,
  buffer:  VecDeque<Token>,
}

impl<'src> Parser<'src> {
  pub fn new(source: &'src str, filename: impl Into<String>) -> Self {
    Self { scanner: Scanner::new(source, filename), buffer: VecDeque::new() }
  }

  pub fn source_map(&self) -> &SourceMap<'src> {
    self.scanner.source_map()
  }

  fn peek_token(&mut self) -> LrgenResult<&Token> {
    if self.buffer.is_empty() {
      let token = self.scanner.scan()?;
      self.buffer.push_back(token);
    }
    Ok(self.buffer.front().expect("just pushed a token"))
  }

  fn consume_token(&mut self) -> LrgenResult<Token> {
    if let Some(token) = self.buffer.pop_front() {
      return Ok(token);
    }
    self.scanner.scan()
  }

  fn skip_newlines(&mut self) -> LrgenResult<()> {
    while self.peek_token()?.type_ == TokenType::Newline {
      self.consume_token()?;
    }
    Ok(())
  }

  fn expect(&mut self, expected: TokenType, message: &str) -> LrgenResult<Token> {
    let token = self.consume_token()?;
    if token.type_ != expected {
      return Err(LrgenError::invalid_grammar(self.source_map(), message, token.span));
    }
    Ok(token)
  }

  fn error(&self, message: impl Into<String>, token: &Token) -> LrgenError {
    LrgenError::invalid_grammar(self.source_map(), message, token.span)
  }

  /// `grammar = rule*`
  pub fn parse(&mut self) -> LrgenResult<ast::Grammar> {
    let mut rules = Vec::new();
    let start_span = self.peek_token()?.span;
    let mut last_span = start_span;

    loop {
      self.skip_newlines()?;
      if self.peek_token()?.type_ == TokenType::Eof {
        break;
      }
      let rule = self.parse_rule()?;
      last_span = rule.span;
      rules.push(rule);
    }

    let grammar = ast::Grammar { span: start_span.extend(last_span), rules };
    trace!("parsed grammar with {} rule(s)", grammar.rules.len());
    Ok(grammar)
  }

  /// `rule = 'rule' '$'? IDENT ':' alternative (NEWLINE* alternative)*`
  fn parse_rule(&mut self) -> LrgenResult<ast::Rule> {
    let rule_token = self.consume_token()?;
    if rule_token.type_ != TokenType::Identifier || rule_token.content() != "rule" {
      return Err(self.error("Expected 'rule'", &rule_token));
    }

    let toplevel = if self.peek_token()?.type_ == TokenType::Dollar {
      self.consume_token()?;
      true
    } else {
      false
    };

    let name_token = self.expect(TokenType::Identifier, "Expected identifier")?;
    self.expect(TokenType::Colon, "Expected colon")?;

    let mut alternatives = Vec::new();
    let first = self.parse_alternative()?;
    let mut span = rule_token.span.extend(first.span);
    alternatives.push(first);

    loop {
      self.skip_newlines()?;
      if self.peek_token()?.type_ == TokenType::OpenParen {
        let alternative = self.parse_alternative()?;
        span = span.extend(alternative.span);
        alternatives.push(alternative);
      } else {
        break;
      }
    }

    Ok(ast::Rule { span, toplevel, name: name_token.content().to_string(), alternatives })
  }

  /// `alternative = '(' item item* ')' ('=>' FOREIGN_BLOCK)?`
  fn parse_alternative(&mut self) -> LrgenResult<ast::Alternative> {
    self.skip_newlines()?;
    let open = self.expect(TokenType::OpenParen, "Expected open parenthesis")?;

    let first = self.parse_item(true)?;
    let mut span = open.span.extend(first.span());
    let mut items = vec![first];

    loop {
      let token = self.peek_token()?.clone();
      if token.type_ == TokenType::CloseParen {
        self.consume_token()?;
        span = span.extend(token.span);
        break;
      }
      let item = self.parse_item(true)?;
      span = span.extend(item.span());
      items.push(item);
    }

    let action = if self.peek_token()?.type_ == TokenType::Arrow {
      self.consume_token()?;
      let block = self.expect(TokenType::ForeignBlock, "Expected block")?;
      span = span.extend(block.span);
      Some(block.content().to_string())
    } else {
      None
    };

    Ok(ast::Alternative { span, items, action })
  }

  /// `item = atom ('+' | '*')?`
  fn parse_item(&mut self, named: bool) -> LrgenResult<ast::Item> {
    let atom = self.parse_atom(named)?;

    let token = self.peek_token()?.clone();
    match token.type_ {
      TokenType::Plus => {
        self.consume_token()?;
        Ok(ast::Item::Repeat { span: atom.span().extend(token.span), item: Box::new(atom) })
      }
      TokenType::Star => {
        self.consume_token()?;
        Ok(ast::Item::OptionalRepeat { span: atom.span().extend(token.span), item: Box::new(atom) })
      }
      _ => Ok(atom),
    }
  }

  /// ```text
  /// atom = '[' inner-item ']'
  ///      | STRING
  ///      | IDENT (':' inner-item)?       -- colon only at top level
  ///      | '(' inner-item+ ')'
  /// ```
  /// `named` is `true` only at the immediate item positions of an
  /// alternative; any nested occurrence passes `false`, which makes a
  /// `Named` item at that position a parse error.
  fn parse_atom(&mut self, named: bool) -> LrgenResult<ast::Item> {
    let token = self.consume_token()?;

    match token.type_ {
      TokenType::OpenBracket => {
        let inner = self.parse_item(false)?;
        let close = self.expect(TokenType::CloseBracket, "Expected close bracket")?;
        Ok(ast::Item::Optional { span: token.span.extend(close.span), item: Box::new(inner) })
      }

      TokenType::String => Ok(ast::Item::String { span: token.span, text: token.content().to_string() }),

      TokenType::Identifier => {
        if self.peek_token()?.type_ == TokenType::Colon {
          if !named {
            return Err(self.error("Named item is not allowed here", &token));
          }
          self.consume_token()?;
          let inner = self.parse_item(false)?;
          Ok(ast::Item::Named {
            span: token.span.extend(inner.span()),
            name: token.content().to_string(),
            item: Box::new(inner),
          })
        } else {
          Ok(ast::Item::Identifier { span: token.span, name: token.content().to_string() })
        }
      }

      TokenType::OpenParen => {
        let first = self.parse_item(false)?;
        let mut span = token.span.extend(first.span());
        let mut items = vec![first];

        loop {
          let next = self.peek_token()?.clone();
          if next.type_ == TokenType::CloseParen {
            self.consume_token()?;
            span = span.extend(next.span);
            break;
          }
          let item = self.parse_item(false)?;
          span = span.extend(item.span());
          items.push(item);
        }

        Ok(ast::Item::Group { span, items })
      }

      _ => Err(self.error("Unexpected token", &token)),
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;

  fn parse(source: &str) -> LrgenResult<ast::Grammar> {
    Parser::new(source, "<test>").parse()
  }

  #[test]
  fn parses_a_single_terminal_rule() {
    let grammar = parse("rule $S : ('a') => { return 1 }").unwrap();
    assert_eq!(grammar.rules.len(), 1);
    let rule = &grammar.rules[0];
    assert!(rule.toplevel);
    assert_eq!(rule.name, "S");
    assert_eq!(rule.alternatives.len(), 1);
    assert_eq!(rule.alternatives[0].items.len(), 1);
    assert_eq!(rule.alternatives[0].action.as_deref(), Some(" return 1 "));
  }

  #[test]
  fn parses_multiple_alternatives_across_newlines() {
    let grammar = parse("rule $S :\n    ('a')\n    ('b')\n").unwrap();
    assert_eq!(grammar.rules[0].alternatives.len(), 2);
  }

  #[test]
  fn parses_sugar_forms() {
    let grammar = parse("rule $S : ([a] b+ c* (d e))").unwrap();
    let items = &grammar.rules[0].alternatives[0].items;
    assert!(matches!(items[0], ast::Item::Optional { .. }));
    assert!(matches!(items[1], ast::Item::Repeat { .. }));
    assert!(matches!(items[2], ast::Item::OptionalRepeat { .. }));
    assert!(matches!(items[3], ast::Item::Group { .. }));
  }

  #[test]
  fn parses_named_items_at_top_level() {
    let grammar = parse("rule $S : (head: a tail: b)").unwrap();
    let items = &grammar.rules[0].alternatives[0].items;
    assert!(matches!(items[0], ast::Item::Named { .. }));
    assert!(matches!(items[1], ast::Item::Named { .. }));
  }

  #[test]
  fn named_item_nested_in_group_is_an_error() {
    let err = parse("rule $S : ((x: 'a'))").unwrap_err();
    assert!(err.to_string().contains("Named item is not allowed here"));
  }

  #[test]
  fn named_item_nested_in_optional_is_an_error() {
    let err = parse("rule $S : ([x: 'a'])").unwrap_err();
    assert!(err.to_string().contains("Named item is not allowed here"));
  }

  #[test]
  fn empty_alternative_is_a_parse_error() {
    let err = parse("rule $S : ()").unwrap_err();
    assert!(matches!(err, LrgenError::InvalidGrammar { .. }));
  }

  #[test]
  fn empty_source_parses_with_zero_rules() {
    let grammar = parse("").unwrap();
    assert!(grammar.rules.is_empty());
  }

  #[test]
  fn pretty_print_round_trips_through_reparse() {
    let grammar = parse("rule $S : ('a' b: [c] d+) => { return 1 }\n    (e* (f g))").unwrap();
    let printed = grammar.to_string();
    let reparsed = parse(&printed).unwrap();
    assert_eq!(grammar, reparsed);
  }
}
