//! Rendering of one-line source excerpts with carets.
//!
//! `lrpy`'s `BaseScanner` tracks `linestarts` as it reads the source
//! line-by-line and renders errors through `scanner.fmterror(...)`
//! (`lrpy/parser/scanner.py`, `lrpy/parser/parser.py`). `lrgen_core`
//! precomputes the full line-start table once up front instead (the whole
//! source is buffered in memory per spec §5, so there is no streaming
//! benefit to computing it lazily), and shares it between the scanner,
//! parser, and builder stages so each can render a diagnostic without
//! re-deriving line numbers from scratch.

use super::types::TextSpan;

/// Precomputed line-start offsets for a single source buffer, plus the
/// buffer and a display name for it. Shared (by reference) across the
/// scanner, parser, and builder stages of one pipeline run.
pub struct SourceMap<'src> {
  source:      &'src str,
  filename:    String,
  line_starts: Vec<usize>,
}

impl<'src> SourceMap<'src> {
  pub fn new(source: &'src str, filename: impl Into<String>) -> Self {
    let mut line_starts = vec![0];
    for (i, b) in source.bytes().enumerate() {
      if b == b'\n' {
        line_starts.push(i + 1);
      }
    }

    Self { source, filename: filename.into(), line_starts }
  }

  pub fn filename(&self) -> &str {
    &self.filename
  }

  /// 1-indexed line number containing byte offset `pos`, found by binary
  /// search over the precomputed line-start table.
  pub fn line_of(&self, pos: usize) -> usize {
    match self.line_starts.binary_search(&pos) {
      Ok(i) => i + 1,
      Err(i) => i,
    }
  }

  fn line_text(&self, lineno: usize) -> &'src str {
    let start = self.line_starts[lineno - 1];
    let end = self.line_starts.get(lineno).copied().unwrap_or(self.source.len());
    self.source[start..end].trim_end_matches(['\n', '\r'])
  }

  /// Renders:
  /// ```text
  /// File '<name>', line <L>: <message>
  /// <the offending line of source>
  /// <spaces>^^^…^^^
  /// ```
  /// The underline spans `span`'s length, clamped to a minimum of 1 caret.
  pub fn render(&self, span: TextSpan, message: &str) -> String {
    let lineno = self.line_of(span.startpos);
    let line_start = self.line_starts[lineno - 1];
    let line = self.line_text(lineno);
    let column = span.startpos.saturating_sub(line_start);
    let underline_len = span.len().max(1);

    format!(
      "File '{}', line {}: {}\n{}\n{}{}",
      self.filename,
      lineno,
      message,
      line,
      " ".repeat(column),
      "^".repeat(underline_len),
    )
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn line_of_finds_containing_line() {
    let map = SourceMap::new("abc\ndef\nghi", "<test>");
    assert_eq!(map.line_of(0), 1);
    assert_eq!(map.line_of(3), 1);
    assert_eq!(map.line_of(4), 2);
    assert_eq!(map.line_of(8), 3);
  }

  #[test]
  fn render_underlines_the_span() {
    let map = SourceMap::new("rule $S : ('abc)\n", "g.grammar");
    let rendered = map.render(TextSpan::new(11, 16), "Unterminated string literal");
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines[0], "File 'g.grammar', line 1: Unterminated string literal");
    assert_eq!(lines[1], "rule $S : ('abc)");
    assert_eq!(lines[2], "           ^^^^^");
  }

  #[test]
  fn render_minimum_one_caret() {
    let map = SourceMap::new("x", "<t>");
    let rendered = map.render(TextSpan::empty(1), "eof");
    assert!(rendered.ends_with('^'));
    assert_eq!(rendered.lines().last().unwrap().len(), 2);
  }
}
