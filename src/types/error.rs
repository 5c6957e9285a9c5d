use std::fmt;

use super::TextSpan;
use crate::diagnostics::SourceMap;

/// Every failure the `lrgen_core` pipeline can produce. Grounded on the
/// teacher's `SherpaError` (`source/lib/sherpa-core/types/error.rs`): a flat
/// enum with a `Display` impl that renders the full caret diagnostic, rather
/// than a tree of nested error types. Unlike `SherpaError`, `lrgen_core`
/// implements `std::error::Error` directly, since this crate has no
/// `Journal`/`Report` aggregation layer for a caller to collect errors
/// through instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LrgenError {
  /// Raised only by an external encoding-detection collaborator; `lrgen_core`
  /// never constructs this variant itself (see SPEC_FULL.md).
  InvalidEncodingDeclaration { message: String, rendered: String },

  /// Any scanner or parser failure: unterminated string, unterminated
  /// block, unmatched bracket, invalid token, unexpected token, a named
  /// item in a disallowed position, or a missing keyword/colon/parenthesis.
  InvalidGrammar { message: String, span: TextSpan, rendered: String },

  /// A builder-stage reference to a name that resolves to neither a
  /// terminal nor a declared nonterminal.
  UnknownSymbol { name: String, span: TextSpan, rendered: String },

  /// No rule in the grammar was marked with `$`.
  MissingEntryPoint { rendered: String },
}

impl LrgenError {
  pub fn invalid_grammar(map: &SourceMap, message: impl Into<String>, span: TextSpan) -> Self {
    let message = message.into();
    let rendered = map.render(span, &message);
    LrgenError::InvalidGrammar { message, span, rendered }
  }

  pub fn unknown_symbol(map: &SourceMap, name: impl Into<String>, span: TextSpan) -> Self {
    let name = name.into();
    let rendered = map.render(span, &format!("Unknown symbol '{name}'"));
    LrgenError::UnknownSymbol { name, span, rendered }
  }

  pub fn missing_entry_point(map: &SourceMap) -> Self {
    let rendered = format!(
      "File '{}': MissingEntryPoint: no rule in this grammar is marked with '$'",
      map.filename()
    );
    LrgenError::MissingEntryPoint { rendered }
  }

  /// The pre-rendered caret diagnostic. Every variant carries one so a
  /// caller can print it directly, per spec §7.
  pub fn rendered(&self) -> &str {
    match self {
      LrgenError::InvalidEncodingDeclaration { rendered, .. } => rendered,
      LrgenError::InvalidGrammar { rendered, .. } => rendered,
      LrgenError::UnknownSymbol { rendered, .. } => rendered,
      LrgenError::MissingEntryPoint { rendered } => rendered,
    }
  }
}

impl fmt::Display for LrgenError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.rendered())
  }
}

impl std::error::Error for LrgenError {}

pub type LrgenResult<T> = Result<T, LrgenError>;

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn display_prints_the_rendered_diagnostic() {
    let map = SourceMap::new("rule $S : (Nope)\n", "g.grammar");
    let err = LrgenError::unknown_symbol(&map, "Nope", TextSpan::new(11, 15));
    assert_eq!(err.to_string(), err.rendered());
    assert!(err.to_string().contains("Unknown symbol 'Nope'"));
  }

  #[test]
  fn missing_entry_point_has_no_span() {
    let map = SourceMap::new("rule S : ('a')\n", "g.grammar");
    let err = LrgenError::missing_entry_point(&map);
    assert!(err.to_string().contains("MissingEntryPoint"));
  }
}
