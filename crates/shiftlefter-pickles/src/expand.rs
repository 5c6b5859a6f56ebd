//! Macro expansion over a parsed feature.
//!
//! Every [`StepNode::Macro`] call whose key is registered is replaced in
//! place by the definition's steps. Expansion is a single pass: steps coming
//! out of a definition are never expanded again, so a definition cannot
//! recurse into itself. Calls with no definition stay in the tree, marked
//! with a [`ProvenanceRole::Call`] provenance, and produce a [`MacroError`].

use log::{debug, warn};
use shiftlefter_gherkin::{
    Feature, FeatureChild, MacroStep, Provenance, ProvenanceRole, RuleChild, Step, StepNode,
};

use crate::error::MacroError;
use crate::registry::MacroRegistry;

/// A feature with its macro calls expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    /// The rewritten feature.
    pub feature: Feature,
    /// One error per call that could not be resolved, in source order.
    pub errors: Vec<MacroError>,
}

/// Expand every macro call in `feature` using `registry`.
///
/// # Examples
///
/// ```
/// use shiftlefter_gherkin::parse_str;
/// use shiftlefter_pickles::{expand, MacroRegistry};
///
/// let result = parse_str("Feature: F\n  Scenario: S\n    Given log in +\n");
/// let feature = result.feature().cloned().unwrap_or_else(|| unreachable!());
/// let expansion = expand(&feature, &MacroRegistry::new());
/// assert_eq!(expansion.errors.len(), 1);
/// ```
#[must_use]
pub fn expand(feature: &Feature, registry: &MacroRegistry) -> Expansion {
    let mut errors = Vec::new();
    let mut expanded = feature.clone();
    for child in &mut expanded.children {
        match child {
            FeatureChild::Background(background) => {
                background.steps = expand_steps(&background.steps, registry, &mut errors);
            }
            FeatureChild::Scenario(scenario) => {
                scenario.steps = expand_steps(&scenario.steps, registry, &mut errors);
            }
            FeatureChild::ScenarioOutline(outline) => {
                outline.steps = expand_steps(&outline.steps, registry, &mut errors);
            }
            FeatureChild::Rule(rule) => {
                for rule_child in &mut rule.children {
                    let steps = match rule_child {
                        RuleChild::Background(background) => &mut background.steps,
                        RuleChild::Scenario(scenario) => &mut scenario.steps,
                        RuleChild::ScenarioOutline(outline) => &mut outline.steps,
                    };
                    *steps = expand_steps(steps, registry, &mut errors);
                }
            }
        }
    }
    errors.sort_by_key(MacroError::location);
    Expansion {
        feature: expanded,
        errors,
    }
}

/// Expand one step list, appending an error for each unresolved call.
#[must_use]
pub fn expand_steps(
    steps: &[StepNode],
    registry: &MacroRegistry,
    errors: &mut Vec<MacroError>,
) -> Vec<StepNode> {
    let mut out = Vec::with_capacity(steps.len());
    for node in steps {
        match node {
            StepNode::Step(_) => out.push(node.clone()),
            StepNode::Macro(call) => {
                let Some(definition) = registry.get(&call.key) else {
                    warn!("unresolved macro {:?} at {}", call.key, call.step.location);
                    errors.push(MacroError::UnresolvedMacro {
                        key: call.key.clone(),
                        location: call.step.location,
                    });
                    out.push(StepNode::Macro(unresolved_call(call)));
                    continue;
                };
                debug!(
                    "expanding macro {:?} at {} into {} steps",
                    call.key,
                    call.step.location,
                    definition.steps.len()
                );
                out.extend(
                    definition
                        .steps
                        .iter()
                        .map(|step| StepNode::Step(expanded_step(call, step))),
                );
            }
        }
    }
    out
}

/// A definition step relocated to the call site.
///
/// The call's span is kept so the expanded step still maps onto the tokens
/// of the line that produced it.
fn expanded_step(call: &MacroStep, definition_step: &Step) -> Step {
    Step {
        location: call.step.location,
        span: call.step.span,
        provenance: Some(Provenance {
            role: ProvenanceRole::Expanded,
            key: call.key.clone(),
            call_site: call.step.location,
            definition_step: Some(definition_step.location),
        }),
        ..definition_step.clone()
    }
}

fn unresolved_call(call: &MacroStep) -> MacroStep {
    let mut kept = call.clone();
    kept.step.provenance = Some(Provenance {
        role: ProvenanceRole::Call,
        key: call.key.clone(),
        call_site: call.step.location,
        definition_step: None,
    });
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MacroDefinition;
    use shiftlefter_gherkin::{Location, StepKeyword, parse_str};

    #[expect(clippy::expect_used, reason = "test helper with descriptive failures")]
    fn feature(source: &str) -> Feature {
        parse_str(source).feature().cloned().expect("source declares a feature")
    }

    fn registry_with_login() -> MacroRegistry {
        let defs = feature(
            "Feature: macros\n  Scenario: log in\n    Given I open the login page\n    When I submit valid credentials\n",
        );
        let steps: Vec<Step> = match defs.children.first() {
            Some(FeatureChild::Scenario(scenario)) => {
                scenario.steps.iter().map(|n| n.step().clone()).collect()
            }
            _ => Vec::new(),
        };
        [MacroDefinition::new("log in", steps, Location::new(2, 3)).with_source("macros.feature")]
            .into_iter()
            .collect()
    }

    fn scenario_steps(feature: &Feature) -> Vec<StepNode> {
        match feature.children.first() {
            Some(FeatureChild::Scenario(scenario)) => scenario.steps.clone(),
            _ => Vec::new(),
        }
    }

    #[test]
    fn replaces_calls_with_definition_steps() {
        let source = feature("Feature: F\n  Scenario: S\n    Given log in +\n    Then I see my dashboard\n");
        let expansion = expand(&source, &registry_with_login());
        assert!(expansion.errors.is_empty());

        let steps = scenario_steps(&expansion.feature);
        let texts: Vec<&str> = steps.iter().map(|n| n.step().text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "I open the login page",
                "I submit valid credentials",
                "I see my dashboard"
            ]
        );
        let expanded = steps.first().map(StepNode::step);
        assert_eq!(expanded.map(|s| s.keyword), Some(StepKeyword::Given));
        assert_eq!(expanded.map(|s| s.location), Some(Location::new(3, 5)));
        assert_eq!(
            expanded.and_then(|s| s.provenance.clone()),
            Some(Provenance {
                role: ProvenanceRole::Expanded,
                key: "log in".into(),
                call_site: Location::new(3, 5),
                definition_step: Some(Location::new(3, 5)),
            })
        );
        assert_eq!(
            steps
                .get(1)
                .and_then(|n| n.step().provenance.as_ref())
                .and_then(|p| p.definition_step),
            Some(Location::new(4, 5))
        );
        assert!(steps.get(2).is_some_and(|n| n.step().provenance.is_none()));
    }

    #[test]
    fn unresolved_calls_are_kept_and_reported() {
        let source = feature(
            "Feature: F\n  Background:\n    Given warm up +\n  Rule: R\n    Scenario: S\n      Given log in +\n      When missing +\n",
        );
        let expansion = expand(&source, &registry_with_login());
        let keys: Vec<(String, usize)> = expansion
            .errors
            .iter()
            .map(|e| match e {
                MacroError::UnresolvedMacro { key, location } => (key.clone(), location.line),
            })
            .collect();
        assert_eq!(
            keys,
            vec![("warm up".to_string(), 3), ("missing".to_string(), 7)]
        );

        let Some(FeatureChild::Rule(rule)) = expansion.feature.children.get(1) else {
            panic!("expected a rule");
        };
        let Some(RuleChild::Scenario(scenario)) = rule.children.first() else {
            panic!("expected a scenario");
        };
        assert_eq!(scenario.steps.len(), 3);
        let kept = scenario.steps.get(2);
        assert!(kept.is_some_and(StepNode::is_macro));
        assert_eq!(
            kept.and_then(|n| n.step().provenance.as_ref()).map(|p| p.role),
            Some(ProvenanceRole::Call)
        );
    }

    #[test]
    fn definition_steps_are_not_expanded_again() {
        let inner = feature("Feature: d\n  Scenario: loop\n    Given loop +\n");
        let steps: Vec<Step> = scenario_steps(&inner)
            .iter()
            .map(|n| n.step().clone())
            .collect();
        let registry: MacroRegistry = [MacroDefinition::new("loop", steps, Location::new(2, 3))]
            .into_iter()
            .collect();
        let expansion = expand(&inner, &registry);
        let out = scenario_steps(&expansion.feature);
        assert_eq!(out.len(), 1);
        assert!(out.iter().all(|n| !n.is_macro()));
        assert!(expansion.errors.is_empty());
    }
}
