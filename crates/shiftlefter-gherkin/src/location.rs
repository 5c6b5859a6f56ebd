//! Source positions and token-index spans.
//!
//! [`Location`] is the `(line, column)` pair attached to every token, node,
//! error and pickle. [`Span`] identifies the half-open token range a node was
//! built from, so callers holding the token vector can rebuild the exact
//! source of any subtree.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::token::Token;

/// A 1-based line and column position in a feature file.
///
/// Columns count Unicode scalar values, not bytes. Ordering compares the line
/// first and the column second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number; `0` when the column is unknown.
    pub column: usize,
}

impl Location {
    /// Construct a location from its line and column.
    ///
    /// # Examples
    ///
    /// ```
    /// use shiftlefter_gherkin::Location;
    ///
    /// let loc = Location::new(3, 5);
    /// assert_eq!(loc.to_string(), "3:5");
    /// ```
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Half-open range of token indices, `start` inclusive and `end` exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Index of the first token covered by the node.
    pub start: usize,
    /// Index one past the last token covered by the node.
    pub end: usize,
}

impl Span {
    /// Construct a span, clamping `end` so it never precedes `start`.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        let end = if end < start { start } else { end };
        Self { start, end }
    }

    /// Number of tokens covered.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the span covers no tokens.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the token at `index` lies inside the span.
    #[must_use]
    pub const fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }

    /// Rebuild the exact source text covered by the span.
    ///
    /// Concatenates the `raw` text of every covered token, line terminators
    /// included. Indices beyond the end of `tokens` are ignored.
    #[must_use]
    pub fn source_text(&self, tokens: &[Token]) -> String {
        tokens
            .get(self.start..self.end.min(tokens.len()))
            .unwrap_or_default()
            .iter()
            .map(|token| token.raw.as_str())
            .collect()
    }
}
