//! Token model produced by the lexer.
//!
//! One token is produced per physical line plus a trailing [`TokenKind::Eof`].
//! Each token keeps the untouched line in [`Token::raw`], terminator included,
//! so concatenating the raw text of a token stream reproduces the input
//! byte for byte.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::keyword::StepKeyword;
use crate::location::Location;

/// Docstring fence style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Fence {
    /// `"""`
    TripleQuote,
    /// `` ``` ``
    Backtick,
}

impl Fence {
    /// The three-character delimiter.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TripleQuote => "\"\"\"",
            Self::Backtick => "```",
        }
    }

    /// The character repeated to form the delimiter. Inside a docstring it
    /// must be backslash-escaped to appear literally next to another one.
    #[must_use]
    pub const fn delimiter(&self) -> char {
        match self {
            Self::TripleQuote => '"',
            Self::Backtick => '`',
        }
    }

    /// Detect a fence at the start of `body`.
    #[must_use]
    pub fn detect(body: &str) -> Option<Self> {
        [Self::TripleQuote, Self::Backtick]
            .into_iter()
            .find(|fence| body.starts_with(fence.as_str()))
    }
}

impl fmt::Display for Fence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `@tag` on a tag line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagToken {
    /// Tag name including the leading `@`.
    pub name: String,
    /// 1-based column of the `@`.
    pub column: usize,
}

/// A decoded table cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellToken {
    /// Cell value with escapes decoded and surrounding whitespace trimmed.
    pub value: String,
    /// 1-based column of the first character of the value.
    pub column: usize,
}

/// Classification of a line, with the payload the parser needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TokenKind {
    /// Empty or whitespace-only line.
    Blank,
    /// `#` comment that is not a language header.
    Comment {
        /// Comment text without leading indentation or line terminator.
        text: String,
    },
    /// `# language: xx` header.
    LanguageHeader {
        /// Requested language code.
        code: String,
    },
    /// Line of `@tags`.
    TagLine {
        /// Tags in source order.
        tags: Vec<TagToken>,
        /// Description of trailing content that is not a tag, if any.
        error: Option<String>,
    },
    /// `Feature:` header.
    FeatureLine {
        /// Name after the colon.
        name: String,
    },
    /// `Background:` header.
    BackgroundLine {
        /// Name after the colon.
        name: String,
    },
    /// `Scenario:` / `Example:` header.
    ScenarioLine {
        /// Name after the colon.
        name: String,
    },
    /// `Scenario Outline:` header.
    ScenarioOutlineLine {
        /// Name after the colon.
        name: String,
    },
    /// `Rule:` header.
    RuleLine {
        /// Name after the colon.
        name: String,
    },
    /// `Examples:` header.
    ExamplesLine {
        /// Name after the colon.
        name: String,
    },
    /// Step line.
    StepLine {
        /// Semantic keyword.
        keyword: StepKeyword,
        /// Step text after the keyword.
        text: String,
    },
    /// Opening or closing docstring fence.
    DocstringSeparator {
        /// Fence style.
        fence: Fence,
        /// Media type after an opening fence, e.g. `json`.
        media_type: Option<String>,
    },
    /// `| a | b |` row.
    TableRow {
        /// Decoded cells in source order.
        cells: Vec<CellToken>,
    },
    /// Anything else: description text, docstring content, stray prose.
    UnknownLine {
        /// Line text after the leading indentation, terminator excluded.
        text: String,
    },
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Stable kebab-case name of the kind, used in diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Blank => "blank",
            Self::Comment { .. } => "comment",
            Self::LanguageHeader { .. } => "language-header",
            Self::TagLine { .. } => "tag-line",
            Self::FeatureLine { .. } => "feature-line",
            Self::BackgroundLine { .. } => "background-line",
            Self::ScenarioLine { .. } => "scenario-line",
            Self::ScenarioOutlineLine { .. } => "scenario-outline-line",
            Self::RuleLine { .. } => "rule-line",
            Self::ExamplesLine { .. } => "examples-line",
            Self::StepLine { .. } => "step-line",
            Self::DocstringSeparator { .. } => "docstring-separator",
            Self::TableRow { .. } => "table-row",
            Self::UnknownLine { .. } => "unknown-line",
            Self::Eof => "eof",
        }
    }

    /// Lines that carry no structure: blanks, comments and language headers.
    #[must_use]
    pub const fn is_trivia(&self) -> bool {
        matches!(
            self,
            Self::Blank | Self::Comment { .. } | Self::LanguageHeader { .. }
        )
    }
}

/// One line of input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Classification and payload.
    #[serde(flatten)]
    pub kind: TokenKind,
    /// Line and column of the first non-whitespace character.
    pub location: Location,
    /// Indentation preceding the content, spaces and tabs as written.
    pub leading_ws: String,
    /// Position of the token in the stream, starting at zero.
    pub index: usize,
    /// Exact source line including its terminator.
    pub raw: String,
    /// Keyword as spelled in the source, for keyword lines.
    pub keyword_text: Option<String>,
}

impl Token {
    /// Whether this is the end-of-input token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// The raw line without its terminator.
    #[must_use]
    pub fn line_text(&self) -> &str {
        self.raw
            .strip_suffix("\r\n")
            .or_else(|| self.raw.strip_suffix('\n'))
            .or_else(|| self.raw.strip_suffix('\r'))
            .unwrap_or(&self.raw)
    }

    /// Header name for block keyword lines.
    #[must_use]
    pub fn block_name(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::FeatureLine { name }
            | TokenKind::BackgroundLine { name }
            | TokenKind::ScenarioLine { name }
            | TokenKind::ScenarioOutlineLine { name }
            | TokenKind::RuleLine { name }
            | TokenKind::ExamplesLine { name } => Some(name),
            _ => None,
        }
    }
}
