//! Error-recovering recursive descent parser.
//!
//! The parser consumes a token vector and never fails: a line that cannot be
//! placed is reported as an [`ParseErrorKind::UnexpectedToken`] and skipped,
//! so one bad line costs one error and the rest of the document still parses.
//! Errors are sorted by location before they are returned.
//!
//! Parsing depends only on the token shape, so callers may filter or mutate a
//! token stream and parse it again.

use std::mem;

use log::debug;

use crate::ast::{
    Background, Blank, Comment, DataTable, Docstring, Examples, Feature, FeatureChild, MacroStep,
    Node, Rule, RuleChild, Scenario, ScenarioOutline, Step, StepArgument, StepNode, TableCell,
    TableRow, Tag,
};
use crate::config::GherkinConfig;
use crate::dialect;
use crate::error::{ParseError, ParseErrorKind, sort_errors};
use crate::keyword::StepKeyword;
use crate::lexer::lex_with;
use crate::location::{Location, Span};
use crate::token::{Fence, Token, TokenKind};

/// Output of a parse: the best-effort AST, every error found, the token
/// vector the spans refer to, and the file's comments.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ParseResult {
    /// Top-level nodes: the feature plus comments and blanks outside it.
    pub ast: Vec<Node>,
    /// Errors sorted by location.
    pub errors: Vec<ParseError>,
    /// The parsed tokens; node spans index into this vector.
    pub tokens: Vec<Token>,
    /// Every comment line in source order.
    pub comments: Vec<Comment>,
}

impl ParseResult {
    /// Whether parsing produced no errors.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// The first feature in the document.
    #[must_use]
    pub fn feature(&self) -> Option<&Feature> {
        self.features().next()
    }

    /// Every feature node, including duplicates kept for diagnostics.
    pub fn features(&self) -> impl Iterator<Item = &Feature> {
        self.ast.iter().filter_map(|node| match node {
            Node::Feature(feature) => Some(feature),
            _ => None,
        })
    }

    /// Rebuild the exact source covered by `span`.
    #[must_use]
    pub fn source_text(&self, span: Span) -> String {
        span.source_text(&self.tokens)
    }
}

/// Parse a token vector with the default configuration.
#[must_use]
pub fn parse(tokens: Vec<Token>) -> ParseResult {
    parse_with(tokens, &GherkinConfig::default())
}

/// Parse a token vector with an explicit configuration.
#[must_use]
pub fn parse_with(tokens: Vec<Token>, config: &GherkinConfig) -> ParseResult {
    let (ast, mut errors) = {
        let mut parser = Parser::new(&tokens, config);
        let ast = parser.parse_document();
        (ast, parser.errors)
    };
    errors.extend(validate_language_headers(&tokens));
    sort_errors(&mut errors);
    let comments = collect_comments(&tokens);
    ParseResult {
        ast,
        errors,
        tokens,
        comments,
    }
}

/// Lex and parse `input` with the default configuration.
///
/// # Examples
///
/// ```
/// use shiftlefter_gherkin::parse_str;
///
/// let result = parse_str("Feature: Login\n  Scenario: OK\n    Given a user\n");
/// assert!(result.is_clean());
/// assert_eq!(result.feature().map(|f| f.name.as_str()), Some("Login"));
/// ```
#[must_use]
pub fn parse_str(input: &str) -> ParseResult {
    parse_str_with(input, &GherkinConfig::default())
}

/// Lex and parse `input` with an explicit configuration.
#[must_use]
pub fn parse_str_with(input: &str, config: &GherkinConfig) -> ParseResult {
    parse_with(lex_with(input, config), config)
}

fn validate_language_headers(tokens: &[Token]) -> Vec<ParseError> {
    tokens
        .iter()
        .filter_map(|token| match &token.kind {
            TokenKind::LanguageHeader { code } if dialect::lookup_known(code).is_none() => {
                let message = if code.is_empty() {
                    "language header names no language".to_string()
                } else {
                    format!("language not supported: {code}")
                };
                Some(ParseError::new(
                    ParseErrorKind::InvalidKeyword,
                    message,
                    token.location,
                ))
            }
            _ => None,
        })
        .collect()
}

fn collect_comments(tokens: &[Token]) -> Vec<Comment> {
    tokens
        .iter()
        .enumerate()
        .filter_map(|(idx, token)| match &token.kind {
            TokenKind::Comment { text } => Some(Comment {
                text: text.clone(),
                location: token.location,
                span: Span::new(idx, idx.saturating_add(1)),
            }),
            _ => None,
        })
        .collect()
}

struct Header {
    keyword: String,
    name: String,
    location: Location,
    source_text: String,
    tags: Vec<Tag>,
    start: usize,
}

enum ScenarioBlock {
    Plain(Scenario),
    Outline(ScenarioOutline),
}

impl From<ScenarioBlock> for FeatureChild {
    fn from(block: ScenarioBlock) -> Self {
        match block {
            ScenarioBlock::Plain(scenario) => Self::Scenario(scenario),
            ScenarioBlock::Outline(outline) => Self::ScenarioOutline(outline),
        }
    }
}

impl From<ScenarioBlock> for RuleChild {
    fn from(block: ScenarioBlock) -> Self {
        match block {
            ScenarioBlock::Plain(scenario) => Self::Scenario(scenario),
            ScenarioBlock::Outline(outline) => Self::ScenarioOutline(outline),
        }
    }
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    /// One past the last non-trivia token consumed.
    consumed_end: usize,
    /// `consumed_end` as it was before the pending tags were collected.
    tag_rewind: usize,
    pending_tags: Vec<Tag>,
    pending_tags_start: Option<usize>,
    errors: Vec<ParseError>,
    macro_marker: Option<String>,
    language: String,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token], config: &GherkinConfig) -> Self {
        Self {
            tokens,
            pos: 0,
            consumed_end: 0,
            tag_rewind: 0,
            pending_tags: Vec::new(),
            pending_tags_start: None,
            errors: Vec::new(),
            macro_marker: config.macro_marker.clone(),
            language: config.default_language.clone(),
        }
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos).filter(|token| !token.is_eof())
    }

    fn next_significant_index(&self) -> Option<usize> {
        let offset = self
            .tokens
            .get(self.pos..)?
            .iter()
            .position(|token| !token.kind.is_trivia())?;
        let index = self.pos.saturating_add(offset);
        self.tokens
            .get(index)
            .filter(|token| !token.is_eof())
            .map(|_| index)
    }

    fn next_significant(&self) -> Option<&'t Token> {
        self.next_significant_index()
            .and_then(|index| self.tokens.get(index))
    }

    fn advance(&mut self) {
        let Some(token) = self.tokens.get(self.pos) else {
            return;
        };
        self.pos = self.pos.saturating_add(1);
        if let TokenKind::LanguageHeader { code } = &token.kind {
            self.language.clone_from(code);
        }
        if !token.kind.is_trivia() {
            self.consumed_end = self.pos;
        }
    }

    fn span_end(&self) -> usize {
        if self.pending_tags.is_empty() {
            self.consumed_end
        } else {
            self.tag_rewind
        }
    }

    fn eof_location(&self) -> Location {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|token| token.location)
            .unwrap_or_default()
    }

    fn error(&mut self, kind: ParseErrorKind, message: String, location: Location) {
        debug!("parse error {kind} at {location}: {message}");
        self.errors.push(ParseError::new(kind, message, location));
    }

    /// Record an error for the current token and skip it.
    ///
    /// A stray docstring is skipped as a whole so its content lines do not
    /// produce one error each.
    fn reject(&mut self, kind: ParseErrorKind, message: String) {
        let Some(token) = self.peek() else {
            return;
        };
        self.error(kind, message, token.location);
        self.advance();
        if let TokenKind::DocstringSeparator { fence, .. } = token.kind {
            while let Some(inner) = self.peek() {
                self.advance();
                if matches!(inner.kind, TokenKind::DocstringSeparator { fence: f, .. } if f == fence)
                {
                    break;
                }
            }
            debug!("skipped stray docstring opened at {}", token.location);
        }
    }

    fn unexpected(&mut self, token: &Token, expected: &str) {
        self.pending_tags.clear();
        self.pending_tags_start = None;
        self.reject(
            ParseErrorKind::UnexpectedToken,
            format!("unexpected {}, expected {expected}", token.kind.name()),
        );
    }

    fn collect_tag_line(&mut self, token: &Token) {
        let TokenKind::TagLine { tags, error } = &token.kind else {
            return;
        };
        if self.pending_tags.is_empty() {
            self.pending_tags_start = Some(self.pos);
            self.tag_rewind = self.consumed_end;
        }
        self.pending_tags.extend(tags.iter().map(|tag| Tag {
            name: tag.name.clone(),
            location: Location::new(token.location.line, tag.column),
        }));
        if let Some(detail) = error {
            self.error(
                ParseErrorKind::InvalidTagLine,
                format!("invalid tag line: {detail}"),
                token.location,
            );
        }
        self.advance();
    }

    fn take_tags(&mut self) -> (Vec<Tag>, Option<usize>) {
        (
            mem::take(&mut self.pending_tags),
            self.pending_tags_start.take(),
        )
    }

    fn drop_orphan_tags(&mut self, found: &Token) {
        if self.pending_tags.is_empty() {
            return;
        }
        let first = self
            .pending_tags
            .first()
            .map_or(found.location, |tag| tag.location);
        self.pending_tags.clear();
        self.pending_tags_start = None;
        self.error(
            ParseErrorKind::UnexpectedToken,
            format!(
                "tags at {first} must precede a Feature, Rule, Scenario or Examples, found {}",
                found.kind.name()
            ),
            found.location,
        );
    }

    fn parse_document(&mut self) -> Vec<Node> {
        let mut ast = Vec::new();
        let mut seen_feature = false;
        let mut reported_missing = false;

        while let Some(token) = self.peek() {
            match &token.kind {
                TokenKind::Blank
                | TokenKind::Comment { .. }
                | TokenKind::LanguageHeader { .. } => {
                    ast.extend(trivia_node(token, self.pos));
                    self.advance();
                }
                TokenKind::TagLine { .. } => self.collect_tag_line(token),
                TokenKind::FeatureLine { .. } => {
                    if seen_feature {
                        self.error(
                            ParseErrorKind::DuplicateFeature,
                            "only one Feature is allowed per file".to_string(),
                            token.location,
                        );
                    }
                    seen_feature = true;
                    let feature = self.parse_feature(token);
                    let trailing = feature.span.end..self.pos;
                    ast.push(Node::Feature(feature));
                    for idx in trailing {
                        if let Some(trailing_token) = self.tokens.get(idx) {
                            ast.extend(trivia_node(trailing_token, idx));
                        }
                    }
                }
                _ if !seen_feature && !reported_missing => {
                    reported_missing = true;
                    self.pending_tags.clear();
                    self.pending_tags_start = None;
                    self.reject(
                        ParseErrorKind::MissingFeature,
                        format!("expected a Feature header, found {}", token.kind.name()),
                    );
                }
                _ => self.unexpected(token, "a Feature"),
            }
        }

        if let Some(first) = self.pending_tags.first() {
            let message = format!("tags at {} are not followed by a Feature", first.location);
            self.error(
                ParseErrorKind::UnexpectedToken,
                message,
                self.eof_location(),
            );
        }
        ast
    }

    fn header(&mut self, token: &Token, taggable: bool) -> Header {
        let (tags, tags_start) = if taggable {
            self.take_tags()
        } else {
            self.drop_orphan_tags(token);
            (Vec::new(), None)
        };
        let start = tags_start.unwrap_or(self.pos);
        self.advance();
        Header {
            keyword: token.keyword_text.clone().unwrap_or_default(),
            name: token.block_name().unwrap_or_default().to_string(),
            location: token.location,
            source_text: token.line_text().to_string(),
            tags,
            start,
        }
    }

    fn parse_description(&mut self) -> Option<String> {
        let mut lines: Vec<&str> = Vec::new();
        while let Some(token) = self.peek() {
            if !matches!(token.kind, TokenKind::UnknownLine { .. } | TokenKind::Blank) {
                break;
            }
            lines.push(token.line_text());
            self.advance();
        }
        trim_blank_lines(&lines)
    }

    fn parse_feature(&mut self, token: &'t Token) -> Feature {
        let language = self.language.clone();
        let header = self.header(token, true);
        let description = self.parse_description();
        let mut children: Vec<FeatureChild> = Vec::new();
        let mut seen_background = false;
        let mut seen_scenarios = false;

        while let Some(token) = self.peek() {
            match &token.kind {
                kind if kind.is_trivia() => self.advance(),
                TokenKind::TagLine { .. } => self.collect_tag_line(token),
                TokenKind::BackgroundLine { .. } => {
                    self.check_background_position(token, seen_background, seen_scenarios);
                    seen_background = true;
                    children.push(FeatureChild::Background(self.parse_background(token)));
                }
                TokenKind::RuleLine { .. } => {
                    seen_scenarios = true;
                    children.push(FeatureChild::Rule(self.parse_rule(token)));
                }
                TokenKind::ScenarioLine { .. } | TokenKind::ScenarioOutlineLine { .. } => {
                    seen_scenarios = true;
                    children.push(self.parse_scenario(token).into());
                }
                TokenKind::FeatureLine { .. } => break,
                _ => self.unexpected(token, "a Background, Rule or Scenario"),
            }
        }

        Feature {
            keyword: header.keyword,
            name: header.name,
            description,
            tags: header.tags,
            language,
            children,
            location: header.location,
            span: Span::new(header.start, self.span_end()),
            source_text: header.source_text,
        }
    }

    fn check_background_position(
        &mut self,
        token: &Token,
        seen_background: bool,
        seen_scenarios: bool,
    ) {
        let message = if seen_background {
            "a second Background is not allowed"
        } else if seen_scenarios {
            "Background must precede every Rule and Scenario"
        } else {
            return;
        };
        self.error(
            ParseErrorKind::UnexpectedToken,
            message.to_string(),
            token.location,
        );
    }

    fn parse_rule(&mut self, token: &'t Token) -> Rule {
        let header = self.header(token, true);
        let description = self.parse_description();
        let mut children: Vec<RuleChild> = Vec::new();
        let mut seen_background = false;
        let mut seen_scenarios = false;

        while let Some(token) = self.peek() {
            match &token.kind {
                kind if kind.is_trivia() => self.advance(),
                TokenKind::TagLine { .. } => self.collect_tag_line(token),
                TokenKind::BackgroundLine { .. } => {
                    self.check_background_position(token, seen_background, seen_scenarios);
                    seen_background = true;
                    children.push(RuleChild::Background(self.parse_background(token)));
                }
                TokenKind::ScenarioLine { .. } | TokenKind::ScenarioOutlineLine { .. } => {
                    seen_scenarios = true;
                    children.push(self.parse_scenario(token).into());
                }
                TokenKind::RuleLine { .. } | TokenKind::FeatureLine { .. } => break,
                _ => self.unexpected(token, "a Background or Scenario"),
            }
        }

        Rule {
            keyword: header.keyword,
            name: header.name,
            description,
            tags: header.tags,
            children,
            location: header.location,
            span: Span::new(header.start, self.span_end()),
            source_text: header.source_text,
        }
    }

    fn parse_background(&mut self, token: &'t Token) -> Background {
        let header = self.header(token, false);
        let description = self.parse_description();
        let (steps, _) = self.parse_step_section(false);
        Background {
            keyword: header.keyword,
            name: header.name,
            description,
            steps,
            location: header.location,
            span: Span::new(header.start, self.span_end()),
            source_text: header.source_text,
        }
    }

    fn parse_scenario(&mut self, token: &'t Token) -> ScenarioBlock {
        let outline_keyword = matches!(token.kind, TokenKind::ScenarioOutlineLine { .. });
        let header = self.header(token, true);
        let description = self.parse_description();
        let (steps, examples) = self.parse_step_section(true);
        let span = Span::new(header.start, self.span_end());

        if outline_keyword || !examples.is_empty() {
            ScenarioBlock::Outline(ScenarioOutline {
                keyword: header.keyword,
                name: header.name,
                description,
                tags: header.tags,
                steps,
                examples,
                location: header.location,
                span,
                source_text: header.source_text,
            })
        } else {
            ScenarioBlock::Plain(Scenario {
                keyword: header.keyword,
                name: header.name,
                description,
                tags: header.tags,
                steps,
                location: header.location,
                span,
                source_text: header.source_text,
            })
        }
    }

    /// Parse steps and, for scenarios, trailing Examples blocks.
    ///
    /// Stops at the next block header, leaving it for the caller.
    fn parse_step_section(&mut self, allow_examples: bool) -> (Vec<StepNode>, Vec<Examples>) {
        let mut steps = Vec::new();
        let mut examples = Vec::new();

        while let Some(token) = self.peek() {
            match &token.kind {
                kind if kind.is_trivia() => self.advance(),
                TokenKind::TagLine { .. } => self.collect_tag_line(token),
                TokenKind::StepLine { .. } if !examples.is_empty() => {
                    self.unexpected(token, "Examples or a new Scenario after Examples");
                }
                TokenKind::StepLine { keyword, text } => {
                    self.drop_orphan_tags(token);
                    steps.push(self.parse_step(token, *keyword, text));
                }
                TokenKind::ExamplesLine { .. } if allow_examples => {
                    examples.push(self.parse_examples(token));
                }
                TokenKind::FeatureLine { .. }
                | TokenKind::BackgroundLine { .. }
                | TokenKind::RuleLine { .. }
                | TokenKind::ScenarioLine { .. }
                | TokenKind::ScenarioOutlineLine { .. } => break,
                _ => self.unexpected(token, "a step"),
            }
        }
        (steps, examples)
    }

    fn parse_examples(&mut self, token: &'t Token) -> Examples {
        let header = self.header(token, true);
        let description = self.parse_description();
        let mut rows = self.parse_table_rows().into_iter();
        let table_header_row = rows.next();
        let table_body_rows = rows.collect();
        Examples {
            keyword: header.keyword,
            name: header.name,
            description,
            tags: header.tags,
            table_header_row,
            table_body_rows,
            location: header.location,
            span: Span::new(header.start, self.span_end()),
            source_text: header.source_text,
        }
    }

    fn parse_step(&mut self, token: &'t Token, keyword: StepKeyword, text: &str) -> StepNode {
        let start = self.pos;
        self.advance();
        let argument = self.parse_argument();
        let step = Step {
            keyword,
            keyword_text: token
                .keyword_text
                .clone()
                .unwrap_or_else(|| format!("{keyword} ")),
            text: text.to_string(),
            location: token.location,
            span: Span::new(start, self.consumed_end),
            source_text: token.line_text().to_string(),
            argument,
            provenance: None,
        };
        let Some(key) = self.macro_key(&step.text) else {
            return StepNode::Step(step);
        };
        StepNode::Macro(MacroStep { key, step })
    }

    fn macro_key(&self, text: &str) -> Option<String> {
        let marker = self.macro_marker.as_deref()?;
        let head = text.trim_end().strip_suffix(marker)?;
        if !head.ends_with(char::is_whitespace) {
            return None;
        }
        let key = head.trim();
        (!key.is_empty()).then(|| key.to_string())
    }

    fn parse_argument(&mut self) -> Option<StepArgument> {
        let start = self.next_significant_index()?;
        let token = self.tokens.get(start)?;
        match &token.kind {
            TokenKind::TableRow { .. } => {
                let rows = self.parse_table_rows();
                Some(StepArgument::DataTable(DataTable {
                    rows,
                    location: token.location,
                    span: Span::new(start, self.consumed_end),
                }))
            }
            TokenKind::DocstringSeparator { fence, media_type } => {
                while self.pos < start {
                    self.advance();
                }
                let docstring = self.parse_docstring(token, *fence, media_type.clone());
                Some(StepArgument::Docstring(docstring))
            }
            _ => None,
        }
    }

    /// Consume consecutive table rows, skipping blanks and comments only when
    /// another row follows them.
    fn parse_table_rows(&mut self) -> Vec<TableRow> {
        let mut rows = Vec::new();
        while let Some(TokenKind::TableRow { cells }) = self.next_significant().map(|t| &t.kind) {
            while self.peek().is_some_and(|token| token.kind.is_trivia()) {
                self.advance();
            }
            let Some(token) = self.peek() else {
                break;
            };
            rows.push(TableRow {
                cells: cells
                    .iter()
                    .map(|cell| TableCell {
                        value: cell.value.clone(),
                        location: Location::new(token.location.line, cell.column),
                    })
                    .collect(),
                location: token.location,
                source_text: token.line_text().to_string(),
            });
            self.advance();
        }
        rows
    }

    fn parse_docstring(
        &mut self,
        opener: &'t Token,
        fence: Fence,
        media_type: Option<String>,
    ) -> Docstring {
        let start = self.pos;
        let indent = opener.leading_ws.chars().count();
        self.advance();

        let mut lines: Vec<String> = Vec::new();
        let mut closed = false;
        while let Some(token) = self.peek() {
            self.advance();
            if matches!(token.kind, TokenKind::DocstringSeparator { fence: f, .. } if f == fence) {
                closed = true;
                break;
            }
            lines.push(unescape_docstring_line(
                dedent(token.line_text(), indent),
                fence,
            ));
        }
        if !closed {
            self.error(
                ParseErrorKind::IncompleteDocstring,
                format!("docstring opened with {fence} is never closed"),
                opener.location,
            );
        }

        Docstring {
            content: lines.join("\n"),
            fence,
            media_type,
            location: opener.location,
            span: Span::new(start, self.consumed_end),
        }
    }
}

fn trivia_node(token: &Token, index: usize) -> Option<Node> {
    let span = Span::new(index, index.saturating_add(1));
    match &token.kind {
        TokenKind::Blank => Some(Node::Blank(Blank {
            location: token.location,
            span,
        })),
        TokenKind::Comment { text } => Some(Node::Comment(Comment {
            text: text.clone(),
            location: token.location,
            span,
        })),
        TokenKind::LanguageHeader { .. } => Some(Node::Comment(Comment {
            text: token.line_text().trim().to_string(),
            location: token.location,
            span,
        })),
        _ => None,
    }
}

fn trim_blank_lines(lines: &[&str]) -> Option<String> {
    let first = lines.iter().position(|line| !line.trim().is_empty())?;
    let last = lines.iter().rposition(|line| !line.trim().is_empty())?;
    lines
        .get(first..=last)
        .map(|kept| kept.join("\n"))
}

/// Remove up to `indent` leading whitespace characters.
fn dedent(line: &str, indent: usize) -> &str {
    let cut = line
        .char_indices()
        .take(indent)
        .take_while(|(_, ch)| ch.is_whitespace())
        .last()
        .map_or(0, |(idx, ch)| idx.saturating_add(ch.len_utf8()));
    line.get(cut..).unwrap_or(line)
}

/// Resolve `\\` and backslash-escaped delimiter characters of `fence`.
///
/// Any other backslash is kept as written.
fn unescape_docstring_line(line: &str, fence: Fence) -> String {
    let delimiter = fence.delimiter();
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        let escaped = if ch == '\\' {
            chars.next_if(|&next| next == '\\' || next == delimiter)
        } else {
            None
        };
        out.push(escaped.unwrap_or(ch));
    }
    out
}
