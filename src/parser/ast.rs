//! Immutable tree of grammar-rule nodes produced by [`super::Parser`].
//!
//! Node shapes and the pretty-printing (`Display`) behavior are grounded on
//! `lrpy/parser/ast.py`'s `__str__` methods; `lrgen_core` reconstructs the
//! same grammar source shape so the round-trip property from spec §8 holds:
//! pretty-print → re-parse → structurally equal AST (modulo spans).

use std::fmt;

use crate::types::TextSpan;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
  pub span:  TextSpan,
  pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
  pub span:         TextSpan,
  pub toplevel:     bool,
  pub name:         String,
  pub alternatives: Vec<Alternative>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternative {
  pub span:   TextSpan,
  pub items:  Vec<Item>,
  pub action: Option<String>,
}

/// One of the seven item forms the surface grammar allows within an
/// alternative. Mirrors `lrpy/parser/ast.py`'s `ItemNode` union, collapsed
/// into a single enum per spec §3 rather than a family of node classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
  String { span: TextSpan, text: String },
  Identifier { span: TextSpan, name: String },
  Named { span: TextSpan, name: String, item: Box<Item> },
  Optional { span: TextSpan, item: Box<Item> },
  Repeat { span: TextSpan, item: Box<Item> },
  OptionalRepeat { span: TextSpan, item: Box<Item> },
  Group { span: TextSpan, items: Vec<Item> },
}

impl Item {
  pub fn span(&self) -> TextSpan {
    match self {
      Item::String { span, .. }
      | Item::Identifier { span, .. }
      | Item::Named { span, .. }
      | Item::Optional { span, .. }
      | Item::Repeat { span, .. }
      | Item::OptionalRepeat { span, .. }
      | Item::Group { span, .. } => *span,
    }
  }
}

impl fmt::Display for Grammar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let rules: Vec<String> = self.rules.iter().map(|r| r.to_string()).collect();
    write!(f, "{}", rules.join("\n\n"))
  }
}

impl fmt::Display for Rule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "rule {}{} :", if self.toplevel { "$" } else { "" }, self.name)?;
    for alternative in &self.alternatives {
      write!(f, "\n    {alternative}")?;
    }
    Ok(())
  }
}

impl fmt::Display for Alternative {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let items: Vec<String> = self.items.iter().map(|i| i.to_string()).collect();
    write!(f, "({})", items.join(" "))?;
    if let Some(action) = &self.action {
      write!(f, " => {{{action}}}")?;
    }
    Ok(())
  }
}

impl fmt::Display for Item {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Item::String { text, .. } => write!(f, "'{text}'"),
      Item::Identifier { name, .. } => f.write_str(name),
      Item::Named { name, item, .. } => write!(f, "{name}: {item}"),
      Item::Optional { item, .. } => write!(f, "[{item}]"),
      Item::Repeat { item, .. } => write!(f, "{item}+"),
      Item::OptionalRepeat { item, .. } => write!(f, "{item}*"),
      Item::Group { items, .. } => {
        let parts: Vec<String> = items.iter().map(|i| i.to_string()).collect();
        write!(f, "({})", parts.join(" "))
      }
    }
  }
}
