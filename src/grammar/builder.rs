//! Lowers an [`ast::Grammar`](crate::parser::ast::Grammar) to a normalized
//! [`Grammar`](super::model::Grammar), synthesizing fresh nonterminals for
//! `?`/`*`/`+`/`(…)` sugar.
//!
//! Grounded on `lrpy/grammar/builder.py::Builder`: the two-pass seed/lower
//! structure is the same, though the synthetic-nonterminal naming follows
//! spec §4.4 (`@Optional<n>`/`@Repeat<n>`/`@Group<n>`) rather than the
//! original's single `@Expansion<n>` counter, and every sugar form gets its
//! own independent counter.

use indexmap::IndexMap;

use super::model::{Action, Grammar, Nonterminal, Production, Symbol, Terminal};
use crate::diagnostics::SourceMap;
use crate::parser::ast;
use crate::types::{LrgenError, LrgenResult};

pub struct Builder {
  terminals:    IndexMap<String, Terminal>,
  nonterminals: IndexMap<String, Nonterminal>,
  entrypoints:  Vec<String>,

  next_production_id: u32,
  optional_counter:    u32,
  repeat_counter:      u32,
  group_counter:       u32,
}

impl Builder {
  /// `terminals` is the externally supplied `name -> token value` mapping
  /// (spec §6, "Terminals input").
  pub fn new(terminals: IndexMap<String, i64>) -> Self {
    let terminals = terminals
      .into_iter()
      .map(|(name, value)| (name.clone(), Terminal { string: name, value }))
      .collect();

    Self {
      terminals,
      nonterminals: IndexMap::new(),
      entrypoints: Vec::new(),
      next_production_id: 0,
      optional_counter: 0,
      repeat_counter: 0,
      group_counter: 0,
    }
  }

  pub fn build(mut self, grammar: &ast::Grammar, map: &SourceMap) -> LrgenResult<Grammar> {
    self.seed(grammar);
    self.lower(grammar, map)?;

    if self.entrypoints.is_empty() {
      return Err(LrgenError::missing_entry_point(map));
    }

    Ok(Grammar { entrypoints: self.entrypoints, terminals: self.terminals, nonterminals: self.nonterminals })
  }

  /// Pass 1: register an empty `Nonterminal` per rule and record
  /// entrypoints. Terminals are already seeded in [`Builder::new`].
  fn seed(&mut self, grammar: &ast::Grammar) {
    for rule in &grammar.rules {
      self
        .nonterminals
        .insert(rule.name.clone(), Nonterminal { name: rule.name.clone(), productions: Vec::new() });
      if rule.toplevel {
        self.entrypoints.push(rule.name.clone());
      }
    }
  }

  /// Pass 2: lower each alternative of each rule to one [`Production`].
  fn lower(&mut self, grammar: &ast::Grammar, map: &SourceMap) -> LrgenResult<()> {
    for rule in &grammar.rules {
      for alternative in &rule.alternatives {
        let production = self.lower_alternative(&rule.name, alternative, map)?;
        self.nonterminals.get_mut(&rule.name).expect("seeded in pass 1").productions.push(production);
      }
    }
    Ok(())
  }

  fn lower_alternative(
    &mut self,
    nonterminal: &str,
    alternative: &ast::Alternative,
    map: &SourceMap,
  ) -> LrgenResult<Production> {
    let mut symbols = Vec::with_capacity(alternative.items.len());
    let mut names = Vec::new();

    for (position, item) in alternative.items.iter().enumerate() {
      let to_lower = match item {
        ast::Item::Named { name, item: inner, .. } => {
          names.push((position, name.clone()));
          inner.as_ref()
        }
        other => other,
      };
      symbols.push(self.lower_item(to_lower, map)?);
    }

    let action = alternative.action.as_ref().map(|body| Action { names, body: body.clone() });
    Ok(self.make_production(nonterminal, symbols, action))
  }

  /// Lowers any item except a top-level `Named` (handled by the caller,
  /// since `name:` binds a position in the *enclosing* production, not a
  /// symbol of its own). A `Named` reaching this function would mean the
  /// parser let one through in a nested position, which it never does.
  fn lower_item(&mut self, item: &ast::Item, map: &SourceMap) -> LrgenResult<Symbol> {
    match item {
      ast::Item::Identifier { name, span } => self.resolve(name, *span, map),
      ast::Item::String { text, span } => {
        if self.terminals.contains_key(text) {
          Ok(Symbol::TerminalRef(text.clone()))
        } else {
          Err(LrgenError::unknown_symbol(map, text.clone(), *span))
        }
      }
      ast::Item::Optional { item: inner, .. } => self.lower_optional(inner, map),
      ast::Item::Repeat { item: inner, .. } => self.lower_repeat(inner, map, false),
      ast::Item::OptionalRepeat { item: inner, .. } => self.lower_repeat(inner, map, true),
      ast::Item::Group { items, .. } => self.lower_group(items, map),
      ast::Item::Named { .. } => unreachable!("parser disallows a Named item outside top-level position"),
    }
  }

  fn resolve(&self, name: &str, span: crate::types::TextSpan, map: &SourceMap) -> LrgenResult<Symbol> {
    if self.nonterminals.contains_key(name) {
      Ok(Symbol::NonterminalRef(name.to_string()))
    } else if self.terminals.contains_key(name) {
      Ok(Symbol::TerminalRef(name.to_string()))
    } else {
      Err(LrgenError::unknown_symbol(map, name, span))
    }
  }

  fn lower_optional(&mut self, inner: &ast::Item, map: &SourceMap) -> LrgenResult<Symbol> {
    let symbol = self.lower_item(inner, map)?;
    let name = format!("@Optional{}", self.optional_counter);
    self.optional_counter += 1;

    let present = self.make_production(
      &name,
      vec![symbol],
      Some(Action { names: vec![(0, "value".to_string())], body: "return value".to_string() }),
    );
    let absent =
      self.make_production(&name, vec![], Some(Action { names: vec![], body: "return None".to_string() }));

    self.nonterminals.insert(name.clone(), Nonterminal { name: name.clone(), productions: vec![present, absent] });
    Ok(Symbol::NonterminalRef(name))
  }

  fn lower_repeat(&mut self, inner: &ast::Item, map: &SourceMap, optional: bool) -> LrgenResult<Symbol> {
    let symbol = self.lower_item(inner, map)?;
    let name = format!("@Repeat{}", self.repeat_counter);
    self.repeat_counter += 1;

    let base = self.make_production(
      &name,
      vec![symbol.clone()],
      Some(Action { names: vec![(0, "symbol".to_string())], body: "return [symbol]".to_string() }),
    );
    let recursive = self.make_production(
      &name,
      vec![Symbol::NonterminalRef(name.clone()), symbol],
      Some(Action {
        names: vec![(0, "symbols".to_string()), (1, "symbol".to_string())],
        body:  "symbols.append(symbol); return symbols".to_string(),
      }),
    );

    let mut productions = vec![base, recursive];
    if optional {
      productions.push(self.make_production(
        &name,
        vec![],
        Some(Action { names: vec![], body: "return None".to_string() }),
      ));
    }

    self.nonterminals.insert(name.clone(), Nonterminal { name: name.clone(), productions });
    Ok(Symbol::NonterminalRef(name))
  }

  fn lower_group(&mut self, items: &[ast::Item], map: &SourceMap) -> LrgenResult<Symbol> {
    let mut symbols = Vec::with_capacity(items.len());
    for item in items {
      symbols.push(self.lower_item(item, map)?);
    }

    let name = format!("@Group{}", self.group_counter);
    self.group_counter += 1;

    let production = self.make_production(&name, symbols, None);
    self.nonterminals.insert(name.clone(), Nonterminal { name: name.clone(), productions: vec![production] });
    Ok(Symbol::NonterminalRef(name))
  }

  fn make_production(&mut self, nonterminal: &str, symbols: Vec<Symbol>, action: Option<Action>) -> Production {
    let id = self.next_production_id;
    self.next_production_id += 1;
    Production { id, nonterminal: nonterminal.to_string(), symbols, action }
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::diagnostics::SourceMap;
  use crate::parser::Parser;

  fn build(source: &str, terminals: &[(&str, i64)]) -> LrgenResult<Grammar> {
    let ast = Parser::new(source, "<test>").parse().unwrap();
    let map = SourceMap::new(source, "<test>");
    let terminals: IndexMap<String, i64> = terminals.iter().map(|(n, v)| (n.to_string(), *v)).collect();
    Builder::new(terminals).build(&ast, &map)
  }

  #[test]
  fn seeds_one_production_per_alternative() {
    let grammar = build("rule $S : ('a')", &[("a", 1)]).unwrap();
    assert_eq!(grammar.entrypoints, vec!["S".to_string()]);
    assert_eq!(grammar.nonterminals["S"].productions.len(), 1);
    assert_eq!(grammar.nonterminals["S"].productions[0].symbols, vec![Symbol::TerminalRef("a".to_string())]);
  }

  #[test]
  fn unknown_symbol_is_reported_with_its_span() {
    let err = build("rule $S : (Nope)", &[]).unwrap_err();
    assert!(matches!(err, LrgenError::UnknownSymbol { ref name, .. } if name == "Nope"));
  }

  #[test]
  fn missing_entrypoint_when_no_rule_is_marked() {
    let err = build("rule S : ('a')", &[("a", 1)]).unwrap_err();
    assert!(matches!(err, LrgenError::MissingEntryPoint { .. }));
  }

  #[test]
  fn repeat_synthesizes_a_left_recursive_nonterminal() {
    let grammar = build("rule $S : (item* )", &[("item", 1)]).unwrap();
    assert_eq!(grammar.nonterminals["S"].productions[0].symbols, vec![Symbol::NonterminalRef("@Repeat0".to_string())]);
    let synthetic = &grammar.nonterminals["@Repeat0"];
    assert_eq!(synthetic.productions.len(), 3);
  }

  #[test]
  fn optional_synthesizes_two_productions() {
    let grammar = build("rule $S : ([a])", &[("a", 1)]).unwrap();
    let synthetic = &grammar.nonterminals["@Optional0"];
    assert_eq!(synthetic.productions.len(), 2);
    assert!(synthetic.productions[1].is_empty());
  }

  #[test]
  fn group_synthesizes_a_single_production() {
    let grammar = build("rule $S : ((a b))", &[("a", 1), ("b", 2)]).unwrap();
    let synthetic = &grammar.nonterminals["@Group0"];
    assert_eq!(synthetic.productions.len(), 1);
    assert_eq!(synthetic.productions[0].symbols.len(), 2);
  }

  #[test]
  fn named_item_records_its_binding_without_its_own_symbol() {
    let grammar = build("rule $S : (head: a) => { return head }", &[("a", 1)]).unwrap();
    let production = &grammar.nonterminals["S"].productions[0];
    assert_eq!(production.symbols, vec![Symbol::TerminalRef("a".to_string())]);
    let action = production.action.as_ref().unwrap();
    assert_eq!(action.names, vec![(0, "head".to_string())]);
  }

  #[test]
  fn counters_are_independent_per_sugar_kind() {
    let grammar = build("rule $S : ([a] [b] c* d*)", &[("a", 1), ("b", 2), ("c", 3), ("d", 4)]).unwrap();
    assert!(grammar.nonterminals.contains_key("@Optional0"));
    assert!(grammar.nonterminals.contains_key("@Optional1"));
    assert!(grammar.nonterminals.contains_key("@Repeat0"));
    assert!(grammar.nonterminals.contains_key("@Repeat1"));
  }
}
