//! Ordered, append-only diagnostics for one compilation unit.
//!
//! Three sequences accumulate during a transform: errors (fatal: a
//! non-empty list makes the rewritten tree unusable), warnings (advisory)
//! and used names (an audit trail of load-context name references). Entries
//! are line-tagged and render as `Line {n}: {message}`.

use rustpython_parser::text_size::TextSize;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single line-tagged diagnostic entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 1-based source line of the offending node.
    pub line: u32,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}: {}", self.line, self.message)
    }
}

/// Accumulated diagnostics for one compilation unit.
///
/// Freshly allocated per transformer instance; never shared across units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostics {
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
    used_names: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            used_names: Vec::new(),
        }
    }

    pub(crate) fn error(&mut self, line: u32, message: impl Into<String>) {
        let entry = Diagnostic {
            line,
            message: message.into(),
        };
        log::debug!("rejected: {entry}");
        self.errors.push(entry);
    }

    pub(crate) fn warn(&mut self, line: u32, message: impl Into<String>) {
        self.warnings.push(Diagnostic {
            line,
            message: message.into(),
        });
    }

    pub(crate) fn use_name(&mut self, line: u32, name: &str) {
        self.used_names.push(Diagnostic {
            line,
            message: name.to_string(),
        });
    }

    /// Fatal rejections, in source-walk order.
    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    /// Advisory findings; never block use of the result.
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Audit trail of names read from the surrounding scope.
    pub fn used_names(&self) -> &[Diagnostic] {
        &self.used_names
    }

    /// True if the rewritten tree must not be compiled or executed.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps byte offsets in the original source to 1-based line numbers.
///
/// `rustpython_parser` nodes carry byte ranges; diagnostics are line-tagged,
/// so the index is built once per compilation unit from the source text.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<TextSize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![TextSize::from(0)];
        for (offset, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(TextSize::from(offset as u32 + 1));
            }
        }
        Self { line_starts }
    }

    /// 1-based line containing `offset`.
    pub fn line_of(&self, offset: TextSize) -> u32 {
        match self.line_starts.binary_search(&offset) {
            Ok(index) => index as u32 + 1,
            Err(index) => index as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn diagnostics_render_line_tagged() {
        let entry = Diagnostic {
            line: 3,
            message: "Eval calls are not allowed.".to_string(),
        };
        assert_eq!(entry.to_string(), "Line 3: Eval calls are not allowed.");
    }

    #[test]
    fn diagnostics_preserve_insertion_order() {
        let mut sink = Diagnostics::new();
        sink.error(2, "second line");
        sink.error(1, "first line");
        let lines: Vec<u32> = sink.errors().iter().map(|d| d.line).collect();
        assert_eq!(lines, vec![2, 1]);
        assert!(sink.has_errors());
    }

    #[test]
    fn line_index_maps_offsets() {
        let index = LineIndex::new("a = 1\nb = 2\nc = 3\n");
        assert_eq!(index.line_of(TextSize::from(0)), 1);
        assert_eq!(index.line_of(TextSize::from(4)), 1);
        assert_eq!(index.line_of(TextSize::from(6)), 2);
        assert_eq!(index.line_of(TextSize::from(12)), 3);
    }

    #[test]
    fn line_index_handles_sourceless_input() {
        let index = LineIndex::new("");
        assert_eq!(index.line_of(TextSize::from(0)), 1);
    }
}
