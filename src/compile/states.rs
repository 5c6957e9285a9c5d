//! EMPTY and FIRST fixed points, item closures, and the canonical LR(0)
//! state graph.
//!
//! Grounded on `lrpy/generator/generator.py::LRGenerator`, with one
//! deliberate correctness fix over the original per spec §4.5: state
//! identity is the item set, interned in a map so two occurrence contexts
//! that close to the same item set collapse to one state (the original
//! creates a fresh state per occurrence and never merges).

use std::collections::VecDeque;

use indexmap::{IndexMap, IndexSet};
use log::{trace, warn};

use super::item::{ItemSet, LrItem};
use crate::grammar::{Grammar, Symbol};

/// The kind of ambiguity a state exposes. LR(0) has no lookahead to
/// disambiguate with, so any state mixing a reduction with a shift, or
/// carrying more than one reduction, is reported rather than resolved
/// (spec §4.5, "Conflict reporting").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictKind {
  ShiftReduce,
  ReduceReduce,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
  pub state:       u32,
  pub kind:        ConflictKind,
  pub productions: Vec<u32>,
}

/// One node of the LR(0) state graph.
#[derive(Debug, Clone)]
pub struct LrState {
  pub index:      u32,
  pub items:      ItemSet,
  /// Transitions on a terminal.
  pub shifts:     IndexMap<String, u32>,
  /// Transitions on a nonterminal. Kept separate from `shifts` so callers
  /// can distinguish a shift from a goto on lookup, per spec §4.5.
  pub gotos:      IndexMap<String, u32>,
  pub reductions: Vec<u32>,
  pub conflicts:  Vec<Conflict>,
}

/// The full result of generation: every reachable state plus the
/// entrypoint name to starting-state-index map (spec §6, "the core
/// returns `(Grammar, states, entrypoints: name->state-index)`").
#[derive(Debug, Clone)]
pub struct LrAutomaton {
  pub states:      Vec<LrState>,
  pub entrypoints: IndexMap<String, u32>,
}

impl LrAutomaton {
  pub fn conflicts(&self) -> impl Iterator<Item = &Conflict> {
    self.states.iter().flat_map(|s| s.conflicts.iter())
  }
}

pub struct LrGenerator<'g> {
  grammar: &'g Grammar,
  empty:   IndexSet<String>,
  first:   IndexMap<String, IndexSet<String>>,
}

impl<'g> LrGenerator<'g> {
  pub fn new(grammar: &'g Grammar) -> Self {
    let empty = compute_empty(grammar);
    let first = compute_first(grammar, &empty);
    Self { grammar, empty, first }
  }

  pub fn empty_set(&self) -> &IndexSet<String> {
    &self.empty
  }

  pub fn first_set(&self) -> &IndexMap<String, IndexSet<String>> {
    &self.first
  }

  fn items_of(&self, nonterminal: &str) -> ItemSet {
    self.grammar.nonterminals[nonterminal].productions.iter().map(LrItem::start).collect()
  }

  /// The smallest superset of `items` such that every nonterminal at a dot
  /// has its own start items included (spec §4.5, "Items and closure").
  fn closure(&self, items: ItemSet) -> ItemSet {
    let mut closure = items;
    let mut worklist: Vec<LrItem> = closure.iter().copied().collect();

    while let Some(item) = worklist.pop() {
      if let Some(Symbol::NonterminalRef(name)) = item.symbol_at_dot(self.grammar) {
        for production in &self.grammar.nonterminals[name].productions {
          let seed = LrItem::start(production);
          if closure.insert(seed) {
            worklist.push(seed);
          }
        }
      }
    }

    closure
  }

  /// Groups every non-reducible item of `items` by its symbol at the dot,
  /// advancing each into the successor item set for that symbol (spec
  /// §4.5, "Transitions").
  fn transitions(&self, items: &ItemSet) -> IndexMap<Symbol, ItemSet> {
    let mut out: IndexMap<Symbol, ItemSet> = IndexMap::new();
    for item in items {
      if let Some(symbol) = item.symbol_at_dot(self.grammar) {
        out.entry(symbol.clone()).or_default().insert(item.advance());
      }
    }
    out
  }

  fn intern(&self, items: ItemSet, states: &mut IndexMap<ItemSet, u32>, worklist: &mut VecDeque<u32>) -> u32 {
    if let Some(&index) = states.get(&items) {
      return index;
    }
    let index = states.len() as u32;
    states.insert(items, index);
    worklist.push_back(index);
    index
  }

  /// Runs the worklist algorithm of spec §4.5, "State enumeration".
  pub fn generate(&self) -> LrAutomaton {
    let mut states: IndexMap<ItemSet, u32> = IndexMap::new();
    let mut worklist: VecDeque<u32> = VecDeque::new();
    let mut entrypoints: IndexMap<String, u32> = IndexMap::new();

    for entry in &self.grammar.entrypoints {
      let index = self.intern(self.items_of(entry), &mut states, &mut worklist);
      entrypoints.insert(entry.clone(), index);
    }

    let mut shifts: Vec<IndexMap<String, u32>> = vec![IndexMap::new(); states.len()];
    let mut gotos: Vec<IndexMap<String, u32>> = vec![IndexMap::new(); states.len()];
    let mut reductions: Vec<Vec<u32>> = vec![Vec::new(); states.len()];

    while let Some(index) = worklist.pop_front() {
      grow(&mut shifts, index as usize);
      grow(&mut gotos, index as usize);
      grow(&mut reductions, index as usize);

      let items = states.get_index(index as usize).expect("index was just interned").0.clone();
      let closed = self.closure(items);

      for item in &closed {
        if item.is_reducible(self.grammar) {
          reductions[index as usize].push(item.production_id);
        }
      }

      for (symbol, next_items) in self.transitions(&closed) {
        let next_index = self.intern(next_items, &mut states, &mut worklist);
        match symbol {
          Symbol::TerminalRef(name) => {
            shifts[index as usize].insert(name, next_index);
          }
          Symbol::NonterminalRef(name) => {
            gotos[index as usize].insert(name, next_index);
          }
        }
      }
    }

    let mut result = Vec::with_capacity(states.len());
    for (index, (items, _)) in states.into_iter().enumerate() {
      let conflicts = detect_conflicts(index as u32, &shifts[index], &reductions[index]);
      for conflict in &conflicts {
        warn!("state {}: {:?} conflict over production(s) {:?}", index, conflict.kind, conflict.productions);
      }
      result.push(LrState {
        index: index as u32,
        items,
        shifts: std::mem::take(&mut shifts[index]),
        gotos: std::mem::take(&mut gotos[index]),
        reductions: std::mem::take(&mut reductions[index]),
        conflicts,
      });
    }

    trace!("generated {} state(s) from {} entrypoint(s)", result.len(), entrypoints.len());
    LrAutomaton { states: result, entrypoints }
  }
}

fn grow<T: Default>(v: &mut Vec<T>, index: usize) {
  while v.len() <= index {
    v.push(T::default());
  }
}

fn detect_conflicts(state: u32, shifts: &IndexMap<String, u32>, reductions: &[u32]) -> Vec<Conflict> {
  let mut conflicts = Vec::new();
  if !reductions.is_empty() && !shifts.is_empty() {
    conflicts.push(Conflict { state, kind: ConflictKind::ShiftReduce, productions: reductions.to_vec() });
  }
  if reductions.len() > 1 {
    conflicts.push(Conflict { state, kind: ConflictKind::ReduceReduce, productions: reductions.to_vec() });
  }
  conflicts
}

/// Fixed-point EMPTY: a nonterminal is in EMPTY iff it has an
/// ε-production, or some production of it has every symbol in EMPTY
/// (spec §4.5, "EMPTY set").
fn compute_empty(grammar: &Grammar) -> IndexSet<String> {
  let mut empty: IndexSet<String> = IndexSet::new();

  loop {
    let mut changed = false;
    for (name, nonterminal) in &grammar.nonterminals {
      if empty.contains(name) {
        continue;
      }
      let derives_empty = nonterminal.productions.iter().any(|p| {
        p.symbols.iter().all(|s| match s {
          Symbol::NonterminalRef(n) => empty.contains(n),
          Symbol::TerminalRef(_) => false,
        })
      });
      if derives_empty {
        empty.insert(name.clone());
        changed = true;
      }
    }
    if !changed {
      break;
    }
  }

  empty
}

/// Fixed-point FIRST, seeded with terminals mapping to themselves, then
/// each nonterminal's leading-symbol walk, then repeatedly substituting
/// nonterminal members by their own FIRST set until stable (spec §4.5,
/// "FIRST set").
fn compute_first(grammar: &Grammar, empty: &IndexSet<String>) -> IndexMap<String, IndexSet<String>> {
  let mut first: IndexMap<String, IndexSet<String>> = IndexMap::new();

  for name in grammar.terminals.keys() {
    first.insert(name.clone(), std::iter::once(name.clone()).collect());
  }
  for name in grammar.nonterminals.keys() {
    first.insert(name.clone(), IndexSet::new());
  }

  for (name, nonterminal) in &grammar.nonterminals {
    let set = first.get_mut(name).expect("seeded above");
    for production in &nonterminal.productions {
      for symbol in &production.symbols {
        let symbol_name = symbol_name(symbol);
        set.insert(symbol_name.to_string());
        let is_empty = matches!(symbol, Symbol::NonterminalRef(n) if empty.contains(n));
        if !is_empty {
          break;
        }
      }
    }
  }

  loop {
    let snapshot = first.clone();
    let mut changed = false;

    for name in grammar.nonterminals.keys() {
      let members: Vec<String> = snapshot[name].iter().cloned().collect();
      for member in members {
        if let Some(member_first) = snapshot.get(&member) {
          if grammar.nonterminals.contains_key(&member) {
            let set = first.get_mut(name).expect("seeded above");
            if set.shift_remove(&member) {
              changed = true;
            }
            for terminal in member_first {
              if set.insert(terminal.clone()) {
                changed = true;
              }
            }
          }
        }
      }
    }

    if !changed {
      break;
    }
  }

  first
}

fn symbol_name(symbol: &Symbol) -> &str {
  match symbol {
    Symbol::TerminalRef(name) => name,
    Symbol::NonterminalRef(name) => name,
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::diagnostics::SourceMap;
  use crate::grammar::builder::Builder;
  use crate::parser::Parser;

  fn grammar_of(source: &str, terminals: &[(&str, i64)]) -> Grammar {
    let ast = Parser::new(source, "<test>").parse().unwrap();
    let map = SourceMap::new(source, "<test>");
    let terminals: IndexMap<String, i64> = terminals.iter().map(|(n, v)| (n.to_string(), *v)).collect();
    Builder::new(terminals).build(&ast, &map).unwrap()
  }

  #[test]
  fn single_terminal_grammar_yields_two_states() {
    let grammar = grammar_of("rule $S : ('a') => { return 1 }", &[("a", 1)]);
    let automaton = LrGenerator::new(&grammar).generate();
    assert_eq!(automaton.states.len(), 2);

    let start = automaton.entrypoints["S"];
    assert_eq!(automaton.states[start as usize].reductions.len(), 0);
    assert_eq!(automaton.states[start as usize].shifts.len(), 1);

    let next = automaton.states[start as usize].shifts["a"];
    assert_eq!(automaton.states[next as usize].reductions.len(), 1);
    assert!(automaton.states[next as usize].shifts.is_empty());
  }

  #[test]
  fn equal_item_sets_collapse_to_one_state() {
    let grammar = grammar_of("rule $S : (A '+' A)\nrule A : ('x')", &[("+", 1), ("x", 2)]);
    let automaton = LrGenerator::new(&grammar).generate();
    assert_eq!(automaton.states.len(), 5);
  }

  #[test]
  fn repeat_sugar_creates_the_expected_single_production_on_the_host_rule() {
    let grammar = grammar_of("rule $S : (item* )", &[("item", 1)]);
    assert_eq!(grammar.nonterminals["S"].productions.len(), 1);
    assert_eq!(grammar.nonterminals["S"].productions[0].symbols.len(), 1);
  }

  #[test]
  fn empty_is_a_fixed_point_for_an_optional_item() {
    let grammar = grammar_of("rule $S : ([a])", &[("a", 1)]);
    let generator = LrGenerator::new(&grammar);
    assert!(generator.empty_set().contains("@Optional0"));
    assert!(!generator.empty_set().contains("S"));
  }

  #[test]
  fn first_of_a_nonterminal_includes_its_terminal_leaders() {
    let grammar = grammar_of("rule $S : (A)\nrule A : ('a')", &[("a", 1)]);
    let generator = LrGenerator::new(&grammar);
    assert!(generator.first_set()["S"].contains("a"));
    assert!(generator.first_set()["A"].contains("a"));
  }

  #[test]
  fn shift_reduce_conflict_is_reported_not_silently_resolved() {
    // `@Optional0`'s ε-production is reducible in the same state where its
    // other production still has a pending shift on `a`: a tiny but
    // genuine shift/reduce ambiguity.
    let grammar = grammar_of("rule $S : ([a] a)", &[("a", 1)]);
    let automaton = LrGenerator::new(&grammar).generate();
    assert!(automaton.conflicts().any(|c| c.kind == ConflictKind::ShiftReduce));
  }
}
