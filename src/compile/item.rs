//! `LRItem{production, position}`: a production paired with a dot marking
//! parse progress.
//!
//! Grounded on `radlr-core`'s item module and
//! `sherpa-core/grammar/new/compile/types/item.rs`'s `ItemRef`, reduced to the
//! LR(0) shape spec §3 calls for: items are compared and hashed by
//! `(production-id, position)` alone, never by a deep walk of the
//! production's symbols, since [`Production::id`](crate::grammar::Production::id)
//! is assigned once at build time (spec §9, "interning of item sets").

use std::collections::BTreeSet;

use crate::grammar::{Grammar, Production, Symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LrItem {
  pub production_id: u32,
  pub position:       usize,
}

/// An item set, compared and hashed as a whole by its sorted contents —
/// this is the canonical LR(0) state identity (spec §3).
pub type ItemSet = BTreeSet<LrItem>;

impl LrItem {
  pub fn start(production: &Production) -> Self {
    Self { production_id: production.id, position: 0 }
  }

  pub fn production<'g>(&self, grammar: &'g Grammar) -> &'g Production {
    grammar.production(self.production_id)
  }

  pub fn is_reducible(&self, grammar: &Grammar) -> bool {
    self.position == self.production(grammar).symbols.len()
  }

  pub fn symbol_at_dot<'g>(&self, grammar: &'g Grammar) -> Option<&'g Symbol> {
    self.production(grammar).symbols.get(self.position)
  }

  pub fn advance(&self) -> LrItem {
    LrItem { production_id: self.production_id, position: self.position + 1 }
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::grammar::builder::Builder;
  use crate::diagnostics::SourceMap;
  use crate::parser::Parser;
  use indexmap::IndexMap;

  fn grammar_of(source: &str, terminals: &[(&str, i64)]) -> Grammar {
    let ast = Parser::new(source, "<test>").parse().unwrap();
    let map = SourceMap::new(source, "<test>");
    let terminals: IndexMap<String, i64> = terminals.iter().map(|(n, v)| (n.to_string(), *v)).collect();
    Builder::new(terminals).build(&ast, &map).unwrap()
  }

  #[test]
  fn start_item_is_not_reducible_until_advanced_past_every_symbol() {
    let grammar = grammar_of("rule $S : ('a' 'b')", &[("a", 1), ("b", 2)]);
    let production = &grammar.nonterminals["S"].productions[0];
    let item = LrItem::start(production);
    assert!(!item.is_reducible(&grammar));
    let item = item.advance().advance();
    assert!(item.is_reducible(&grammar));
  }

  #[test]
  fn symbol_at_dot_tracks_position() {
    let grammar = grammar_of("rule $S : ('a' 'b')", &[("a", 1), ("b", 2)]);
    let production = &grammar.nonterminals["S"].productions[0];
    let item = LrItem::start(production);
    assert_eq!(item.symbol_at_dot(&grammar), Some(&Symbol::TerminalRef("a".to_string())));
    assert_eq!(item.advance().symbol_at_dot(&grammar), Some(&Symbol::TerminalRef("b".to_string())));
    assert_eq!(item.advance().advance().symbol_at_dot(&grammar), None);
  }
}
