//! The normalized grammar: terminals, nonterminals, productions, and the
//! symbols/actions that tie them together.
//!
//! Grounded on `radlr-core/types/parser_db.rs`'s `ParserDatabase` and on
//! `sherpa-core/grammar/new/types/grammar.rs`'s `Rule`/`Production` split,
//! but flattened to plain owned values per spec §3: productions reference
//! nonterminals by name rather than by an interned key, so the whole
//! `Grammar` stays a single acyclic value tree.

use indexmap::IndexMap;

/// A lexical symbol the generated parser consumes, carrying the externally
/// supplied integer value the caller's lexer produces for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terminal {
  pub string: String,
  pub value:  i64,
}

/// A grammar symbol defined by one or more [`Production`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nonterminal {
  pub name:        String,
  pub productions: Vec<Production>,
}

/// One symbol on the right-hand side of a production.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
  TerminalRef(String),
  NonterminalRef(String),
}

/// A `(position, binding-name)` pair plus the opaque action body text.
/// `position` indexes into the enclosing production's `symbols`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
  pub names: Vec<(usize, String)>,
  pub body:  String,
}

/// An ordered sequence of symbols a nonterminal may reduce to.
///
/// Each production carries a stable `id`, assigned at build time, so
/// [`crate::compile::item::LrItem`] can hash and compare by `(id, position)`
/// instead of by a deep structural comparison (spec §9, "interning of item
/// sets").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
  pub id:          u32,
  pub nonterminal: String,
  pub symbols:     Vec<Symbol>,
  pub action:      Option<Action>,
}

impl Production {
  pub fn is_empty(&self) -> bool {
    self.symbols.is_empty()
  }
}

/// The fully lowered grammar a [`crate::compile::states::LrGenerator`]
/// consumes. Maps are insertion-ordered (`indexmap::IndexMap`) so repeated
/// builds of the same source produce byte-identical iteration order, per
/// spec §3's "generation order must be reproducible" invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
  pub entrypoints:  Vec<String>,
  pub terminals:    IndexMap<String, Terminal>,
  pub nonterminals: IndexMap<String, Nonterminal>,
}

impl Grammar {
  pub fn production(&self, id: u32) -> &Production {
    self
      .nonterminals
      .values()
      .flat_map(|nt| &nt.productions)
      .find(|p| p.id == id)
      .expect("production id must exist in the grammar that produced it")
  }
}
