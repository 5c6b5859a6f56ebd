//! Line-oriented lexer with lossless token output.
//!
//! [`Lexer`] is an iterator that produces one [`Token`] per input line and a
//! final [`TokenKind::Eof`]. Between lines it carries exactly two pieces of
//! state: the active dialect, switched by `# language:` headers, and the
//! docstring fence currently open, if any. Taking a prefix of the iterator
//! therefore yields the same tokens as lexing the whole input.

use std::sync::LazyLock;

use log::trace;
use regex::Regex;

use crate::config::GherkinConfig;
use crate::dialect::{self, Dialect};
use crate::keyword::BlockKeyword;
use crate::location::Location;
use crate::token::{CellToken, Fence, TagToken, Token, TokenKind};

static LANGUAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Safe: The regex pattern is a compile-time constant and is valid.
    Regex::new(r"(?i)^\s*#\s*language\s*:\s*(.*?)\s*$")
        .unwrap_or_else(|_| unreachable!("language header regex is valid"))
});

/// Streaming tokenizer over a borrowed source string.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    rest: &'a str,
    line: usize,
    index: usize,
    dialect: &'static Dialect,
    docstring: Option<Fence>,
    finished: bool,
}

impl<'a> Lexer<'a> {
    /// Create a lexer using the default configuration.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self::with_config(input, &GherkinConfig::default())
    }

    /// Create a lexer whose initial dialect comes from `config`.
    #[must_use]
    pub fn with_config(input: &'a str, config: &GherkinConfig) -> Self {
        Self {
            rest: input,
            line: 1,
            index: 0,
            dialect: dialect::lookup(&config.default_language),
            docstring: None,
            finished: false,
        }
    }

    /// Dialect that will be used for the next line.
    #[must_use]
    pub fn dialect(&self) -> &'static Dialect {
        self.dialect
    }

    /// Fence of the docstring currently open, if any.
    #[must_use]
    pub fn open_docstring(&self) -> Option<Fence> {
        self.docstring
    }

    fn next_line(&mut self) -> (&'a str, &'a str) {
        let rest = self.rest;
        let Some(pos) = rest.find(['\r', '\n']) else {
            self.rest = "";
            return (rest, rest);
        };
        let terminator_len = if rest.get(pos..pos.saturating_add(2)) == Some("\r\n") {
            2
        } else {
            1
        };
        let split = pos.saturating_add(terminator_len);
        let (raw, tail) = rest.split_at_checked(split).unwrap_or((rest, ""));
        let content = rest.get(..pos).unwrap_or(raw);
        self.rest = tail;
        (raw, content)
    }

    fn classify(&mut self, content: &str, column: usize) -> (TokenKind, Option<String>) {
        let body = content.trim_start();

        if let Some(fence) = self.docstring {
            return classify_docstring_line(body, fence).map_or_else(
                || (unknown_or_blank(body), None),
                |kind| {
                    self.docstring = None;
                    (kind, None)
                },
            );
        }

        if body.trim().is_empty() {
            return (TokenKind::Blank, None);
        }

        if body.starts_with('#') {
            return (self.classify_hash_line(content, body), None);
        }

        if body.starts_with('@') {
            let (tags, error) = scan_tags(body, column);
            return (TokenKind::TagLine { tags, error }, None);
        }

        if let Some(fence) = Fence::detect(body) {
            self.docstring = Some(fence);
            let media_type = body
                .strip_prefix(fence.as_str())
                .map(str::trim)
                .filter(|media| !media.is_empty())
                .map(str::to_string);
            return (TokenKind::DocstringSeparator { fence, media_type }, None);
        }

        if let Some(row) = body.strip_prefix('|') {
            let cells = scan_cells(row, column.saturating_add(1));
            return (TokenKind::TableRow { cells }, None);
        }

        if let Some(found) = self.dialect.match_block_keyword(body) {
            let name = found.name;
            let kind = match found.keyword {
                BlockKeyword::Feature => TokenKind::FeatureLine { name },
                BlockKeyword::Background => TokenKind::BackgroundLine { name },
                BlockKeyword::Rule => TokenKind::RuleLine { name },
                BlockKeyword::Scenario => TokenKind::ScenarioLine { name },
                BlockKeyword::ScenarioOutline => TokenKind::ScenarioOutlineLine { name },
                BlockKeyword::Examples => TokenKind::ExamplesLine { name },
            };
            return (kind, Some(found.keyword_text.to_string()));
        }

        if let Some(found) = self.dialect.match_step_keyword(body) {
            let kind = TokenKind::StepLine {
                keyword: found.keyword,
                text: found.text,
            };
            return (kind, Some(found.keyword_text.to_string()));
        }

        (unknown_or_blank(body), None)
    }

    fn classify_hash_line(&mut self, content: &str, body: &str) -> TokenKind {
        let code = LANGUAGE_RE
            .captures(content)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());
        let Some(code) = code else {
            return TokenKind::Comment {
                text: body.to_string(),
            };
        };
        self.dialect = dialect::lookup(&code);
        trace!(
            "line {}: switching dialect to {code:?} ({} keywords known)",
            self.line,
            self.dialect.block_keywords().count()
        );
        TokenKind::LanguageHeader { code }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let index = self.index;
        self.index = self.index.saturating_add(1);

        if self.rest.is_empty() {
            self.finished = true;
            return Some(Token {
                kind: TokenKind::Eof,
                location: Location::new(self.line, 1),
                leading_ws: String::new(),
                index,
                raw: String::new(),
                keyword_text: None,
            });
        }

        let line = self.line;
        let (raw, content) = self.next_line();
        let body = content.trim_start();
        let leading_ws = content
            .get(..content.len().saturating_sub(body.len()))
            .unwrap_or_default();
        let column = leading_ws.chars().count().saturating_add(1);
        let (kind, keyword_text) = self.classify(content, column);
        self.line = self.line.saturating_add(1);

        Some(Token {
            kind,
            location: Location::new(line, column),
            leading_ws: leading_ws.to_string(),
            index,
            raw: raw.to_string(),
            keyword_text,
        })
    }
}

fn classify_docstring_line(body: &str, fence: Fence) -> Option<TokenKind> {
    body.starts_with(fence.as_str())
        .then_some(TokenKind::DocstringSeparator {
            fence,
            media_type: None,
        })
}

fn unknown_or_blank(body: &str) -> TokenKind {
    if body.trim().is_empty() {
        TokenKind::Blank
    } else {
        TokenKind::UnknownLine {
            text: body.to_string(),
        }
    }
}

/// Split a tag line into tags.
///
/// Tags are separated by whitespace or by a following `@`. A `#` preceded by
/// whitespace starts a trailing comment. Anything else that is not part of a
/// tag is reported through the returned error string.
fn scan_tags(body: &str, first_column: usize) -> (Vec<TagToken>, Option<String>) {
    let mut tags = Vec::new();
    let mut current: Option<TagToken> = None;
    let mut error = None;
    let mut previous_was_space = false;

    for (offset, (byte_idx, ch)) in body.char_indices().enumerate() {
        let column = first_column.saturating_add(offset);
        if ch == '#' && previous_was_space {
            break;
        }
        previous_was_space = ch.is_whitespace();
        if ch == '@' {
            flush_tag(&mut tags, current.take(), &mut error);
            current = Some(TagToken {
                name: String::from('@'),
                column,
            });
        } else if ch.is_whitespace() {
            flush_tag(&mut tags, current.take(), &mut error);
        } else if let Some(tag) = current.as_mut() {
            tag.name.push(ch);
        } else {
            let stray = body.get(byte_idx..).unwrap_or_default().trim_end();
            error = Some(format!(
                "non-tag content at column {column}: {stray:?}"
            ));
            break;
        }
    }
    flush_tag(&mut tags, current, &mut error);
    (tags, error)
}

fn flush_tag(tags: &mut Vec<TagToken>, tag: Option<TagToken>, error: &mut Option<String>) {
    let Some(tag) = tag else {
        return;
    };
    if tag.name.len() > 1 {
        tags.push(tag);
    } else if error.is_none() {
        *error = Some(format!("empty tag at column {}", tag.column));
    }
}

struct CellChar {
    ch: char,
    column: usize,
    escaped: bool,
}

impl CellChar {
    fn is_padding(&self) -> bool {
        !self.escaped && self.ch.is_whitespace()
    }
}

/// Decode the cells of a table row.
///
/// `row` is the text after the opening pipe and `first_column` the column of
/// its first character. Text after the final pipe is not a cell.
fn scan_cells(row: &str, first_column: usize) -> Vec<CellToken> {
    let mut cells = Vec::new();
    let mut pending: Vec<CellChar> = Vec::new();
    let mut cell_column = first_column;
    let mut column = first_column;
    let mut chars = row.chars().peekable();

    while let Some(ch) = chars.next() {
        let here = column;
        column = column.saturating_add(1);
        if ch == '|' {
            cells.push(finish_cell(&pending, cell_column));
            pending.clear();
            cell_column = column;
            continue;
        }
        let decoded = if ch == '\\' {
            match chars.peek() {
                Some('|') => Some('|'),
                Some('\\') => Some('\\'),
                Some('n') => Some('\n'),
                _ => None,
            }
        } else {
            None
        };
        let escaped = decoded.is_some();
        if escaped {
            chars.next();
            column = column.saturating_add(1);
        }
        pending.push(CellChar {
            ch: decoded.unwrap_or(ch),
            column: here,
            escaped,
        });
    }
    cells
}

fn finish_cell(chars: &[CellChar], cell_column: usize) -> CellToken {
    let start = chars
        .iter()
        .position(|c| !c.is_padding())
        .unwrap_or(chars.len());
    let end = chars
        .iter()
        .rposition(|c| !c.is_padding())
        .map_or(start, |idx| idx.saturating_add(1));
    let kept = chars.get(start..end).unwrap_or_default();
    CellToken {
        value: kept.iter().map(|c| c.ch).collect(),
        column: kept.first().map_or(cell_column, |c| c.column),
    }
}

/// Lex `input` with the default configuration.
///
/// # Examples
///
/// ```
/// use shiftlefter_gherkin::{lex, TokenKind};
///
/// let tokens = lex("Feature: Login\n  Scenario: OK\n");
/// assert_eq!(tokens.len(), 3);
/// assert!(matches!(tokens[0].kind, TokenKind::FeatureLine { .. }));
/// assert!(tokens[2].is_eof());
/// ```
#[must_use]
pub fn lex(input: &str) -> Vec<Token> {
    Lexer::new(input).collect()
}

/// Lex `input` with an explicit configuration.
#[must_use]
pub fn lex_with(input: &str, config: &GherkinConfig) -> Vec<Token> {
    Lexer::with_config(input, config).collect()
}

/// Concatenate the raw text of `tokens` in order.
///
/// For any token stream produced by [`lex`] this returns the lexed input.
#[must_use]
pub fn reconstruct(tokens: &[Token]) -> String {
    tokens.iter().map(|token| token.raw.as_str()).collect()
}
