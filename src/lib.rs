//! Core of a parser-generator toolchain: reads an EBNF-like grammar source
//! string and produces the canonical LR(0) state machine a bottom-up parser
//! driver needs — item sets, shift transitions on terminals, goto
//! transitions on nonterminals, and reduction sets.
//!
//! The pipeline is strictly linear and fails fast on the first error:
//!
//! ```text
//! text -> tokens -> AST -> Grammar -> LR states
//! ```
//!
//! Source-file encoding detection, file I/O, CLI plumbing, target-language
//! code emission, the runtime parser driver, and interpretation of
//! semantic-action bodies are all external collaborators; this crate never
//! touches a filesystem, a network socket, or process-global state, so
//! independent pipelines may run on independent inputs from separate
//! threads without coordination.

pub mod compile;
pub mod diagnostics;
pub mod grammar;
pub mod parser;
pub mod reader;
pub mod scanner;
pub mod types;

use indexmap::IndexMap;
use log::debug;

pub use compile::{Conflict, ConflictKind, LrAutomaton, LrGenerator, LrItem, LrState};
pub use diagnostics::SourceMap;
pub use grammar::{Builder, Grammar};
pub use parser::Parser;
pub use parser::ast;
pub use types::{LrgenError, LrgenResult, TextSpan, Token, TokenType};

/// Runs the whole pipeline over a single grammar source buffer: scan,
/// parse, lower, generate.
///
/// `filename` is only used to label diagnostics. `terminals` is the
/// externally supplied `name -> token value` mapping (spec §6). On
/// success, returns the normalized grammar and the generated automaton,
/// matching the interface spec §6 names: `(Grammar, states,
/// entrypoints: name->state-index)`, with `states`/`entrypoints` carried
/// together on [`LrAutomaton`].
pub fn compile(
  source: &str,
  filename: impl Into<String>,
  terminals: IndexMap<String, i64>,
) -> LrgenResult<(Grammar, LrAutomaton)> {
  let filename = filename.into();
  let mut parser = Parser::new(source, filename.clone());
  let ast = match parser.parse() {
    Ok(ast) => ast,
    Err(err) => return Err(print_and_return(err)),
  };
  debug!("parsed '{filename}': {} rule(s)", ast.rules.len());

  let map = SourceMap::new(source, filename);
  let grammar = match Builder::new(terminals).build(&ast, &map) {
    Ok(grammar) => grammar,
    Err(err) => return Err(print_and_return(err)),
  };
  debug!(
    "lowered grammar: {} terminal(s), {} nonterminal(s), {} entrypoint(s)",
    grammar.terminals.len(),
    grammar.nonterminals.len(),
    grammar.entrypoints.len()
  );

  let automaton = LrGenerator::new(&grammar).generate();
  debug!("generated {} state(s)", automaton.states.len());

  Ok((grammar, automaton))
}

/// With the `auto_print_errors` feature, every pipeline failure is echoed to
/// stderr as it propagates, so a caller gets the caret diagnostic on the
/// console even before deciding what to do with the returned `Err`.
fn print_and_return(err: LrgenError) -> LrgenError {
  #[cfg(feature = "auto_print_errors")]
  eprintln!("{err}");
  err
}

#[cfg(test)]
mod test {
  use super::*;

  fn terminals(pairs: &[(&str, i64)]) -> IndexMap<String, i64> {
    pairs.iter().map(|(n, v)| (n.to_string(), *v)).collect()
  }

  #[test]
  fn compiles_a_single_terminal_grammar_to_two_states() {
    let (grammar, automaton) = compile("rule $S : ('a') => { return 1 }", "g.grammar", terminals(&[("a", 1)])).unwrap();
    assert_eq!(grammar.entrypoints, vec!["S".to_string()]);
    assert_eq!(automaton.states.len(), 2);
  }

  #[test]
  fn empty_source_parses_but_has_no_entrypoint() {
    let err = compile("", "g.grammar", IndexMap::new()).unwrap_err();
    assert!(matches!(err, LrgenError::MissingEntryPoint { .. }));
  }

  #[test]
  fn unterminated_string_surfaces_as_invalid_grammar() {
    let err = compile("rule $S : ('abc)", "g.grammar", terminals(&[("a", 1)])).unwrap_err();
    assert!(matches!(err, LrgenError::InvalidGrammar { .. }));
    assert!(err.to_string().contains("Unterminated string literal"));
  }

  #[test]
  fn unknown_symbol_surfaces_with_its_name() {
    let err = compile("rule $S : (Nope)", "g.grammar", IndexMap::new()).unwrap_err();
    assert!(matches!(err, LrgenError::UnknownSymbol { ref name, .. } if name == "Nope"));
  }
}
