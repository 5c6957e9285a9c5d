//! Terminals, nonterminals, productions, symbols, and actions: the
//! normalized grammar the LR generator consumes, plus the builder that
//! produces one from an AST.

pub mod builder;
pub mod model;

pub use builder::Builder;
pub use model::{Action, Grammar, Nonterminal, Production, Symbol, Terminal};
