//! Phase one of pickling: the structural plan.
//!
//! [`ast_to_pickle_plan`] flattens a feature into one [`PlannedScenario`]
//! per Scenario or Scenario Outline, resolving which Background applies and
//! collecting tags tier by tier. It assigns no identifiers and performs no
//! substitution, so structural tests stay independent of both.

use serde::Serialize;
use shiftlefter_gherkin::{
    Background, Examples, Feature, FeatureChild, Location, Provenance, Rule, RuleChild, Scenario,
    ScenarioOutline, StepArgument, StepKeyword, StepNode, TableRow, Tag,
};

/// Where a tag was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TagTier {
    /// On the Feature header.
    Feature,
    /// On the enclosing Rule.
    Rule,
    /// On the Scenario or Scenario Outline.
    Scenario,
    /// On the Examples block supplying the row.
    Examples,
}

/// A tag together with the tier that declared it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickleTag {
    /// Tag text including the leading `@`.
    pub name: String,
    /// Source position of the tag.
    pub location: Location,
    /// Declaring tier.
    pub tier: TagTier,
}

fn tier_tags(tags: &[Tag], tier: TagTier) -> impl Iterator<Item = PickleTag> + '_ {
    tags.iter().map(move |tag| PickleTag {
        name: tag.name.clone(),
        location: tag.location,
        tier,
    })
}

/// Which block contributed a pickle step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepOrigin {
    /// The feature-level Background.
    FeatureBackground,
    /// The enclosing Rule's Background.
    RuleBackground,
    /// The scenario itself.
    Scenario,
}

/// A step as it will appear in a pickle, before substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedStep {
    /// Keyword as parsed.
    pub keyword: StepKeyword,
    /// Step text, placeholders intact.
    pub text: String,
    /// Source position.
    pub location: Location,
    /// Table or docstring argument.
    pub argument: Option<StepArgument>,
    /// Contributing block.
    pub origin: StepOrigin,
    /// Macro bookkeeping carried over from expansion.
    pub provenance: Option<Provenance>,
    /// Key of a macro call that expansion left unresolved.
    pub unresolved_macro: Option<String>,
}

impl PlannedStep {
    fn from_node(node: &StepNode, origin: StepOrigin) -> Self {
        let step = node.step();
        Self {
            keyword: step.keyword,
            text: step.text.clone(),
            location: step.location,
            argument: step.argument.clone(),
            origin,
            provenance: step.provenance.clone(),
            unresolved_macro: match node {
                StepNode::Macro(call) => Some(call.key.clone()),
                StepNode::Step(_) => None,
            },
        }
    }
}

/// A table row of an Examples block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedRow {
    /// Cell values in order.
    pub cells: Vec<String>,
    /// Position of the row.
    pub location: Location,
}

/// One Examples block of an outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedExamples {
    /// Examples name.
    pub name: String,
    /// Header position.
    pub location: Location,
    /// Tags declared on the block.
    pub tags: Vec<PickleTag>,
    /// Column names; `None` when the block has no table.
    pub header: Option<PlannedRow>,
    /// Body rows.
    pub rows: Vec<PlannedRow>,
}

impl PlannedExamples {
    fn from_examples(examples: &Examples) -> Self {
        let to_row = |row: &TableRow| PlannedRow {
            cells: row.cells.iter().map(|cell| cell.value.clone()).collect(),
            location: row.location,
        };
        Self {
            name: examples.name.clone(),
            location: examples.location,
            tags: tier_tags(&examples.tags, TagTier::Examples).collect(),
            header: examples.table_header_row.as_ref().map(to_row),
            rows: if examples.table_header_row.is_some() {
                examples.table_body_rows.iter().map(to_row).collect()
            } else {
                Vec::new()
            },
        }
    }
}

/// Everything needed to generate the pickles of one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedScenario {
    /// Scenario name, placeholders intact.
    pub name: String,
    /// Header position.
    pub location: Location,
    /// Feature, rule and scenario tags in that order.
    pub tags: Vec<PickleTag>,
    /// Steps of the applicable Background.
    pub background: Vec<PlannedStep>,
    /// The scenario's own steps.
    pub steps: Vec<PlannedStep>,
    /// Examples blocks; `Some` exactly for outlines.
    pub examples: Option<Vec<PlannedExamples>>,
}

impl PlannedScenario {
    /// Whether the scenario is an outline.
    #[must_use]
    pub const fn is_outline(&self) -> bool {
        self.examples.is_some()
    }
}

/// Structural plan for a whole feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PicklePlan {
    /// Dialect the feature was written in.
    pub language: String,
    /// Scenarios in source order, rules flattened.
    pub scenarios: Vec<PlannedScenario>,
}

/// Build the structural plan for `feature`.
///
/// A Rule's Background replaces the feature Background for the scenarios
/// inside that Rule; the two are never combined.
#[must_use]
pub fn ast_to_pickle_plan(feature: &Feature) -> PicklePlan {
    let feature_background =
        background_steps(feature.background(), StepOrigin::FeatureBackground);
    let feature_tags: Vec<PickleTag> = tier_tags(&feature.tags, TagTier::Feature).collect();
    let mut scenarios = Vec::new();

    for child in &feature.children {
        match child {
            FeatureChild::Background(_) => {}
            FeatureChild::Scenario(scenario) => {
                scenarios.push(plan_scenario(scenario, &feature_tags, &feature_background));
            }
            FeatureChild::ScenarioOutline(outline) => {
                scenarios.push(plan_outline(outline, &feature_tags, &feature_background));
            }
            FeatureChild::Rule(rule) => {
                plan_rule(rule, &feature_tags, &feature_background, &mut scenarios);
            }
        }
    }

    PicklePlan {
        language: feature.language.clone(),
        scenarios,
    }
}

fn plan_rule(
    rule: &Rule,
    feature_tags: &[PickleTag],
    feature_background: &[PlannedStep],
    scenarios: &mut Vec<PlannedScenario>,
) {
    let rule_background = rule
        .background()
        .map(|background| background_steps(Some(background), StepOrigin::RuleBackground));
    let background = rule_background.as_deref().unwrap_or(feature_background);
    let mut tags = feature_tags.to_vec();
    tags.extend(tier_tags(&rule.tags, TagTier::Rule));

    for child in &rule.children {
        match child {
            RuleChild::Background(_) => {}
            RuleChild::Scenario(scenario) => {
                scenarios.push(plan_scenario(scenario, &tags, background));
            }
            RuleChild::ScenarioOutline(outline) => {
                scenarios.push(plan_outline(outline, &tags, background));
            }
        }
    }
}

fn background_steps(background: Option<&Background>, origin: StepOrigin) -> Vec<PlannedStep> {
    background
        .map(|background| {
            background
                .steps
                .iter()
                .map(|node| PlannedStep::from_node(node, origin))
                .collect()
        })
        .unwrap_or_default()
}

fn own_steps(steps: &[StepNode]) -> Vec<PlannedStep> {
    steps
        .iter()
        .map(|node| PlannedStep::from_node(node, StepOrigin::Scenario))
        .collect()
}

fn plan_scenario(
    scenario: &Scenario,
    inherited_tags: &[PickleTag],
    background: &[PlannedStep],
) -> PlannedScenario {
    let mut tags = inherited_tags.to_vec();
    tags.extend(tier_tags(&scenario.tags, TagTier::Scenario));
    PlannedScenario {
        name: scenario.name.clone(),
        location: scenario.location,
        tags,
        background: background.to_vec(),
        steps: own_steps(&scenario.steps),
        examples: None,
    }
}

fn plan_outline(
    outline: &ScenarioOutline,
    inherited_tags: &[PickleTag],
    background: &[PlannedStep],
) -> PlannedScenario {
    let mut tags = inherited_tags.to_vec();
    tags.extend(tier_tags(&outline.tags, TagTier::Scenario));
    PlannedScenario {
        name: outline.name.clone(),
        location: outline.location,
        tags,
        background: background.to_vec(),
        steps: own_steps(&outline.steps),
        examples: Some(
            outline
                .examples
                .iter()
                .map(PlannedExamples::from_examples)
                .collect(),
        ),
    }
}
