//! Structured parse errors.
//!
//! Parsing never fails outright. Every defect becomes a [`ParseError`] in the
//! returned list, next to a best-effort AST.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::location::Location;

/// Closed set of parse error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParseErrorKind {
    /// Content appeared before any `Feature:` header.
    MissingFeature,
    /// A second `Feature:` header was found.
    DuplicateFeature,
    /// A `# language:` header named an unknown dialect.
    InvalidKeyword,
    /// A line cannot appear where it was found.
    UnexpectedToken,
    /// A docstring was opened but never closed.
    IncompleteDocstring,
    /// A tag line contained something other than tags.
    InvalidTagLine,
}

impl ParseErrorKind {
    /// Kebab-case identifier of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MissingFeature => "missing-feature",
            Self::DuplicateFeature => "duplicate-feature",
            Self::InvalidKeyword => "invalid-keyword",
            Self::UnexpectedToken => "unexpected-token",
            Self::IncompleteDocstring => "incomplete-docstring",
            Self::InvalidTagLine => "invalid-tag-line",
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recoverable defect found while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("({location}): {message}")]
pub struct ParseError {
    /// Error kind.
    #[serde(rename = "type")]
    pub kind: ParseErrorKind,
    /// Human-readable description.
    pub message: String,
    /// Position of the offending line.
    pub location: Location,
}

impl ParseError {
    /// Construct an error.
    #[must_use]
    pub fn new(kind: ParseErrorKind, message: impl Into<String>, location: Location) -> Self {
        Self {
            kind,
            message: message.into(),
            location,
        }
    }
}

/// Stable-sort errors by `(line, column)`.
pub fn sort_errors(errors: &mut [ParseError]) {
    errors.sort_by_key(|error| error.location);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_location_prefix() {
        let error = ParseError::new(
            ParseErrorKind::UnexpectedToken,
            "unexpected step-line",
            Location::new(4, 3),
        );
        assert_eq!(error.to_string(), "(4:3): unexpected step-line");
    }

    #[test]
    fn serialises_kind_as_type() {
        let error = ParseError::new(ParseErrorKind::MissingFeature, "m", Location::new(1, 1));
        let json = serde_json::to_value(&error).unwrap_or_default();
        assert_eq!(json.get("type").and_then(|v| v.as_str()), Some("missing-feature"));
    }

    #[test]
    fn sorting_is_stable_within_a_location() {
        let at = Location::new(2, 1);
        let mut errors = vec![
            ParseError::new(ParseErrorKind::InvalidTagLine, "second", Location::new(5, 1)),
            ParseError::new(ParseErrorKind::UnexpectedToken, "a", at),
            ParseError::new(ParseErrorKind::MissingFeature, "b", at),
        ];
        sort_errors(&mut errors);
        let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["a", "b", "second"]);
    }
}
