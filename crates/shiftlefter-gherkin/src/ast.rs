//! Typed syntax tree built by the parser.
//!
//! Structural nodes carry their [`Location`], the token [`Span`] they were
//! built from and the raw header line as `source_text`. Children are stored
//! in source order, so walks over the tree are deterministic.

use serde::{Deserialize, Serialize};

use crate::keyword::StepKeyword;
use crate::location::{Location, Span};
use crate::token::Fence;

/// A single `@tag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Name including the leading `@`.
    pub name: String,
    /// Position of the `@`.
    pub location: Location,
}

/// A comment line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment text as written, indentation excluded.
    pub text: String,
    /// Position of the `#`.
    pub location: Location,
    /// The comment's own token.
    pub span: Span,
}

/// A blank line outside any feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blank {
    /// Position of the line.
    pub location: Location,
    /// The blank line's own token.
    pub span: Span,
}

/// The root of a feature file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    /// Keyword as written, e.g. `Fonctionnalité`.
    pub keyword: String,
    /// Name after the colon.
    pub name: String,
    /// Free text below the header.
    pub description: Option<String>,
    /// Tags preceding the header.
    pub tags: Vec<Tag>,
    /// Dialect code in effect at the header.
    pub language: String,
    /// Backgrounds, rules and scenarios in source order.
    pub children: Vec<FeatureChild>,
    /// Position of the header.
    pub location: Location,
    /// Tokens from the first tag line to the last child.
    pub span: Span,
    /// Raw header line.
    pub source_text: String,
}

impl Feature {
    /// The first feature-level background, if any.
    #[must_use]
    pub fn background(&self) -> Option<&Background> {
        self.children.iter().find_map(|child| match child {
            FeatureChild::Background(background) => Some(background),
            _ => None,
        })
    }

    /// Visit every node below and including the feature.
    ///
    /// Children are visited before their container: a step's argument before
    /// the step, steps before the scenario, tags after the children they
    /// share a container with and immediately before that container.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(NodeRef<'a>)) {
        for child in &self.children {
            match child {
                FeatureChild::Background(background) => walk_background(background, visit),
                FeatureChild::Rule(rule) => rule.walk(visit),
                FeatureChild::Scenario(scenario) => walk_scenario(scenario, visit),
                FeatureChild::ScenarioOutline(outline) => walk_outline(outline, visit),
            }
        }
        walk_tags(&self.tags, visit);
        visit(NodeRef::Feature(self));
    }
}

/// Direct child of a [`Feature`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FeatureChild {
    /// Feature-level background.
    Background(Background),
    /// Rule grouping scenarios.
    Rule(Rule),
    /// Plain scenario.
    Scenario(Scenario),
    /// Scenario with Examples.
    ScenarioOutline(ScenarioOutline),
}

impl FeatureChild {
    /// Token span of the child.
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Background(node) => node.span,
            Self::Rule(node) => node.span,
            Self::Scenario(node) => node.span,
            Self::ScenarioOutline(node) => node.span,
        }
    }
}

/// A `Rule:` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Keyword as written.
    pub keyword: String,
    /// Name after the colon.
    pub name: String,
    /// Free text below the header.
    pub description: Option<String>,
    /// Tags preceding the header.
    pub tags: Vec<Tag>,
    /// Background and scenarios in source order.
    pub children: Vec<RuleChild>,
    /// Position of the header.
    pub location: Location,
    /// Tokens from the first tag line to the last child.
    pub span: Span,
    /// Raw header line.
    pub source_text: String,
}

impl Rule {
    /// The first rule-level background, if any.
    #[must_use]
    pub fn background(&self) -> Option<&Background> {
        self.children.iter().find_map(|child| match child {
            RuleChild::Background(background) => Some(background),
            _ => None,
        })
    }

    /// Visit every node below and including the rule, children first.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(NodeRef<'a>)) {
        for child in &self.children {
            match child {
                RuleChild::Background(background) => walk_background(background, visit),
                RuleChild::Scenario(scenario) => walk_scenario(scenario, visit),
                RuleChild::ScenarioOutline(outline) => walk_outline(outline, visit),
            }
        }
        walk_tags(&self.tags, visit);
        visit(NodeRef::Rule(self));
    }
}

/// Direct child of a [`Rule`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RuleChild {
    /// Rule-level background.
    Background(Background),
    /// Plain scenario.
    Scenario(Scenario),
    /// Scenario with Examples.
    ScenarioOutline(ScenarioOutline),
}

/// A `Background:` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Background {
    /// Keyword as written.
    pub keyword: String,
    /// Name after the colon.
    pub name: String,
    /// Free text below the header.
    pub description: Option<String>,
    /// Steps in source order.
    pub steps: Vec<StepNode>,
    /// Position of the header.
    pub location: Location,
    /// Tokens from the header to the last step.
    pub span: Span,
    /// Raw header line.
    pub source_text: String,
}

/// A `Scenario:` block without Examples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Keyword as written.
    pub keyword: String,
    /// Name after the colon.
    pub name: String,
    /// Free text below the header.
    pub description: Option<String>,
    /// Tags preceding the header.
    pub tags: Vec<Tag>,
    /// Steps in source order.
    pub steps: Vec<StepNode>,
    /// Position of the header.
    pub location: Location,
    /// Tokens from the first tag line to the last step.
    pub span: Span,
    /// Raw header line.
    pub source_text: String,
}

/// A scenario parameterised by one or more Examples blocks.
///
/// A `Scenario:` header followed by Examples is also an outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioOutline {
    /// Keyword as written.
    pub keyword: String,
    /// Name after the colon, placeholders unexpanded.
    pub name: String,
    /// Free text below the header.
    pub description: Option<String>,
    /// Tags preceding the header.
    pub tags: Vec<Tag>,
    /// Template steps in source order.
    pub steps: Vec<StepNode>,
    /// Examples blocks in source order.
    pub examples: Vec<Examples>,
    /// Position of the header.
    pub location: Location,
    /// Tokens from the first tag line to the last Examples row.
    pub span: Span,
    /// Raw header line.
    pub source_text: String,
}

/// An `Examples:` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Examples {
    /// Keyword as written.
    pub keyword: String,
    /// Name after the colon.
    pub name: String,
    /// Free text below the header.
    pub description: Option<String>,
    /// Tags preceding the header.
    pub tags: Vec<Tag>,
    /// First table row, naming the placeholders.
    pub table_header_row: Option<TableRow>,
    /// Remaining rows, one pickle each.
    pub table_body_rows: Vec<TableRow>,
    /// Position of the header.
    pub location: Location,
    /// Tokens from the first tag line to the last row.
    pub span: Span,
    /// Raw header line.
    pub source_text: String,
}

/// A step line with its optional argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Semantic keyword.
    pub keyword: StepKeyword,
    /// Keyword as written, trailing space included.
    pub keyword_text: String,
    /// Text after the keyword.
    pub text: String,
    /// Position of the keyword.
    pub location: Location,
    /// Tokens from the step line to the end of its argument.
    pub span: Span,
    /// Raw step line.
    pub source_text: String,
    /// Attached table or docstring.
    pub argument: Option<StepArgument>,
    /// Macro bookkeeping, set by the expander.
    pub provenance: Option<Provenance>,
}

/// A step whose text ends with the macro marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroStep {
    /// Registry key: the step text without the marker.
    pub key: String,
    /// The call as written.
    pub step: Step,
}

/// Either a plain step or a macro call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StepNode {
    /// Plain step.
    Step(Step),
    /// Macro call awaiting expansion.
    Macro(MacroStep),
}

impl StepNode {
    /// The underlying step line.
    #[must_use]
    pub const fn step(&self) -> &Step {
        match self {
            Self::Step(step) => step,
            Self::Macro(call) => &call.step,
        }
    }

    /// Whether this is a macro call.
    #[must_use]
    pub const fn is_macro(&self) -> bool {
        matches!(self, Self::Macro(_))
    }
}

/// Argument attached to a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StepArgument {
    /// Table argument.
    DataTable(DataTable),
    /// Docstring argument.
    Docstring(Docstring),
}

/// Role of a step in macro expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProvenanceRole {
    /// The macro call itself, kept when it could not be expanded.
    Call,
    /// A step produced by expanding a macro.
    Expanded,
}

/// Where an expanded step came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Call or expansion.
    pub role: ProvenanceRole,
    /// Macro key.
    pub key: String,
    /// Location of the macro call.
    pub call_site: Location,
    /// Location of the step inside the macro definition.
    pub definition_step: Option<Location>,
}

/// A pipe-delimited table attached to a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataTable {
    /// Rows in source order; cell counts are not checked here.
    pub rows: Vec<TableRow>,
    /// Position of the first row.
    pub location: Location,
    /// Tokens from the first to the last row.
    pub span: Span,
}

/// One table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    /// Cells in source order.
    pub cells: Vec<TableCell>,
    /// Position of the opening pipe.
    pub location: Location,
    /// Raw row line.
    pub source_text: String,
}

impl TableRow {
    /// Cell values in order.
    #[must_use]
    pub fn values(&self) -> Vec<&str> {
        self.cells.iter().map(|cell| cell.value.as_str()).collect()
    }
}

/// One table cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCell {
    /// Decoded, trimmed value.
    pub value: String,
    /// Position of the first character of the value.
    pub location: Location,
}

/// A fenced docstring attached to a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Docstring {
    /// Content with fence indentation removed and escaped fences resolved.
    pub content: String,
    /// Fence style.
    pub fence: Fence,
    /// Media type after the opening fence.
    pub media_type: Option<String>,
    /// Position of the opening fence.
    pub location: Location,
    /// Tokens from the opening to the closing fence.
    pub span: Span,
}

/// Any node kind, as stored in [`crate::ParseResult::ast`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Node {
    /// Comment outside a feature.
    Comment(Comment),
    /// Blank line outside a feature.
    Blank(Blank),
    /// Feature root.
    Feature(Feature),
    /// Background block.
    Background(Background),
    /// Rule block.
    Rule(Rule),
    /// Scenario block.
    Scenario(Scenario),
    /// Scenario outline block.
    ScenarioOutline(ScenarioOutline),
    /// Examples block.
    Examples(Examples),
    /// Step.
    Step(Step),
    /// Macro call.
    MacroStep(MacroStep),
    /// Data table.
    DataTable(DataTable),
    /// Docstring.
    Docstring(Docstring),
    /// Tag.
    Tag(Tag),
}

impl Node {
    /// Position of the node.
    #[must_use]
    pub const fn location(&self) -> Location {
        match self {
            Self::Comment(node) => node.location,
            Self::Blank(node) => node.location,
            Self::Feature(node) => node.location,
            Self::Background(node) => node.location,
            Self::Rule(node) => node.location,
            Self::Scenario(node) => node.location,
            Self::ScenarioOutline(node) => node.location,
            Self::Examples(node) => node.location,
            Self::Step(node) => node.location,
            Self::MacroStep(node) => node.step.location,
            Self::DataTable(node) => node.location,
            Self::Docstring(node) => node.location,
            Self::Tag(node) => node.location,
        }
    }

    /// Token span of the node; tags have none.
    #[must_use]
    pub const fn span(&self) -> Option<Span> {
        match self {
            Self::Comment(node) => Some(node.span),
            Self::Blank(node) => Some(node.span),
            Self::Feature(node) => Some(node.span),
            Self::Background(node) => Some(node.span),
            Self::Rule(node) => Some(node.span),
            Self::Scenario(node) => Some(node.span),
            Self::ScenarioOutline(node) => Some(node.span),
            Self::Examples(node) => Some(node.span),
            Self::Step(node) => Some(node.span),
            Self::MacroStep(node) => Some(node.step.span),
            Self::DataTable(node) => Some(node.span),
            Self::Docstring(node) => Some(node.span),
            Self::Tag(_) => None,
        }
    }
}

/// Borrowed view of a node, yielded by [`Feature::walk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRef<'a> {
    /// Feature root.
    Feature(&'a Feature),
    /// Background block.
    Background(&'a Background),
    /// Rule block.
    Rule(&'a Rule),
    /// Scenario block.
    Scenario(&'a Scenario),
    /// Scenario outline block.
    ScenarioOutline(&'a ScenarioOutline),
    /// Examples block.
    Examples(&'a Examples),
    /// Step.
    Step(&'a Step),
    /// Macro call.
    MacroStep(&'a MacroStep),
    /// Data table.
    DataTable(&'a DataTable),
    /// Docstring.
    Docstring(&'a Docstring),
    /// Tag.
    Tag(&'a Tag),
}

fn walk_tags<'a>(tags: &'a [Tag], visit: &mut dyn FnMut(NodeRef<'a>)) {
    for tag in tags {
        visit(NodeRef::Tag(tag));
    }
}

fn walk_steps<'a>(steps: &'a [StepNode], visit: &mut dyn FnMut(NodeRef<'a>)) {
    for node in steps {
        match &node.step().argument {
            Some(StepArgument::DataTable(table)) => visit(NodeRef::DataTable(table)),
            Some(StepArgument::Docstring(docstring)) => visit(NodeRef::Docstring(docstring)),
            None => {}
        }
        match node {
            StepNode::Step(step) => visit(NodeRef::Step(step)),
            StepNode::Macro(call) => visit(NodeRef::MacroStep(call)),
        }
    }
}

fn walk_background<'a>(background: &'a Background, visit: &mut dyn FnMut(NodeRef<'a>)) {
    walk_steps(&background.steps, visit);
    visit(NodeRef::Background(background));
}

fn walk_scenario<'a>(scenario: &'a Scenario, visit: &mut dyn FnMut(NodeRef<'a>)) {
    walk_steps(&scenario.steps, visit);
    walk_tags(&scenario.tags, visit);
    visit(NodeRef::Scenario(scenario));
}

fn walk_outline<'a>(outline: &'a ScenarioOutline, visit: &mut dyn FnMut(NodeRef<'a>)) {
    walk_steps(&outline.steps, visit);
    for examples in &outline.examples {
        walk_tags(&examples.tags, visit);
        visit(NodeRef::Examples(examples));
    }
    walk_tags(&outline.tags, visit);
    visit(NodeRef::ScenarioOutline(outline));
}
