//! End-to-end pickling through the public API.
#![expect(clippy::expect_used, reason = "tests fail loudly on missing pickles")]

use rstest::{fixture, rstest};
use shiftlefter_gherkin::{GherkinConfig, Location, ProvenanceRole, parse_str};
use shiftlefter_pickles::{
    Compilation, MacroDefinition, MacroError, MacroRegistry, PickleConfig, PickleError, StepOrigin,
    TagTier, compile, pickles,
};

const LOGIN: &str = "Feature: Login\n  Scenario: OK\n    Given I have 12 cucumbers\n    When I eat 5\n    Then I should have 7 left\n";

const MACROS: &str = "\
Feature: shared steps
  Scenario: sign in
    Given I open the login page
    When I submit valid credentials
";

#[fixture]
fn registry() -> MacroRegistry {
    let result = parse_str(MACROS);
    let feature = result.feature().expect("macro file declares a feature");
    let Some(shiftlefter_gherkin::FeatureChild::Scenario(scenario)) = feature.children.first()
    else {
        panic!("macro file should hold one scenario");
    };
    let steps = scenario.steps.iter().map(|n| n.step().clone()).collect();
    [MacroDefinition::new("sign in", steps, scenario.location).with_source("shared.feature")]
        .into_iter()
        .collect()
}

fn compiled(source: &str, registry: Option<&MacroRegistry>) -> Compilation {
    compile(source, registry, &PickleConfig::new("test.feature"))
}

#[test]
fn login_scenario_end_to_end() {
    let result = compiled(LOGIN, None);
    assert!(result.is_clean());
    let pickles = &result.output.pickles;
    assert_eq!(pickles.len(), 1);
    let pickle = pickles.first().expect("one pickle");
    assert_eq!(pickle.name, "OK");
    let texts: Vec<&str> = pickle.steps.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(
        texts,
        vec!["I have 12 cucumbers", "I eat 5", "I should have 7 left"]
    );
}

#[test]
fn rule_background_supersedes_feature_background() {
    let source = "\
Feature: F
  Background:
    Given feature step
  Rule: R
    Background:
      Given rule step
    Scenario: S
      When scenario step
";
    let result = compiled(source, None);
    let pickle = result.output.pickles.first().expect("one pickle");
    let steps: Vec<(StepOrigin, &str)> = pickle
        .steps
        .iter()
        .map(|s| (s.origin, s.text.as_str()))
        .collect();
    assert_eq!(
        steps,
        vec![
            (StepOrigin::RuleBackground, "rule step"),
            (StepOrigin::Scenario, "scenario step"),
        ]
    );
}

#[test]
fn tags_concatenate_in_tier_order() {
    let source = "@web\nFeature: F\n  @slow\n  Rule: R\n    @ui\n    Scenario: S\n      Given x\n";
    let result = compiled(source, None);
    let pickle = result.output.pickles.first().expect("one pickle");
    let tags: Vec<(&str, TagTier, Location)> = pickle
        .tags
        .iter()
        .map(|t| (t.name.as_str(), t.tier, t.location))
        .collect();
    assert_eq!(
        tags,
        vec![
            ("@web", TagTier::Feature, Location::new(1, 1)),
            ("@slow", TagTier::Rule, Location::new(3, 3)),
            ("@ui", TagTier::Scenario, Location::new(5, 5)),
        ]
    );
}

#[rstest]
fn macros_expand_before_pickling(registry: MacroRegistry) {
    let source = "Feature: F\n  Scenario: S\n    Given sign in +\n    Then I see my dashboard\n";
    let result = compiled(source, Some(&registry));
    assert!(result.is_clean(), "{:?}", result.output.errors);
    let pickle = result.output.pickles.first().expect("one pickle");
    let steps: Vec<(&str, Option<ProvenanceRole>)> = pickle
        .steps
        .iter()
        .map(|s| (s.text.as_str(), s.provenance.as_ref().map(|p| p.role)))
        .collect();
    assert_eq!(
        steps,
        vec![
            ("I open the login page", Some(ProvenanceRole::Expanded)),
            ("I submit valid credentials", Some(ProvenanceRole::Expanded)),
            ("I see my dashboard", None),
        ]
    );
    assert!(pickle.steps.iter().take(2).all(|s| s.location == Location::new(3, 5)));
}

#[rstest]
fn unresolved_macros_stub_their_pickles_only(registry: MacroRegistry) {
    let source = "Feature: F\n  Scenario: A\n    Given sign in +\n  Scenario: B\n    Given sign out +\n";
    let result = compiled(source, Some(&registry));
    assert_eq!(result.output.macro_errors.len(), 1);
    let stubs: Vec<bool> = result.output.pickles.iter().map(|p| p.is_stub()).collect();
    assert_eq!(stubs, vec![false, true]);
    assert!(matches!(
        result.output.errors.as_slice(),
        [PickleError::UnresolvedMacro { key, pickle_id, .. }]
            if key == "sign out" && pickle_id == "test.feature:4"
    ));
}

#[test]
fn pickling_without_registry_stubs_every_call() {
    let result = parse_str("Feature: F\n  Scenario: A\n    Given sign in +\n");
    let feature = result.feature().expect("feature");
    let output = pickles(feature, None, "a.feature");
    assert!(output.pickles.iter().all(|p| p.is_stub()));
    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.macro_errors.len(), 1);
}

#[rstest]
#[case::superseded_by_rule_background(
    "Feature: F\n  Background:\n    Given warm up +\n  Rule: R\n    Background:\n      Given rule step\n    Scenario: S\n      When x\n"
)]
#[case::only_empty_scenarios("Feature: F\n  Background:\n    Given warm up +\n  Scenario: S\n")]
fn unused_background_calls_are_still_reported(#[case] source: &str) {
    let result = parse_str(source);
    let feature = result.feature().expect("feature");
    let output = pickles(feature, Some(&MacroRegistry::new()), "bg.feature");
    assert!(output.errors.is_empty());
    assert!(output.pickles.iter().all(|p| !p.is_stub()));
    assert_eq!(
        output.macro_errors,
        vec![MacroError::UnresolvedMacro {
            key: "warm up".into(),
            location: Location::new(3, 5),
        }]
    );
    assert!(!output.is_clean());
}

#[test]
fn disabled_macros_pickle_marker_text_verbatim() {
    let config = PickleConfig::new("a.feature")
        .with_gherkin(GherkinConfig::default().without_macros());
    let result = compile("Feature: F\n  Scenario: A\n    Given sign in +\n", None, &config);
    assert!(result.is_clean());
    let text = result
        .output
        .pickles
        .first()
        .and_then(|p| p.steps.first())
        .map(|s| s.text.clone());
    assert_eq!(text.as_deref(), Some("sign in +"));
}

#[test]
fn document_without_feature_has_no_pickles() {
    let result = compiled("# just a comment\n", None);
    assert!(result.output.pickles.is_empty());
    assert!(result.parse.is_clean());
}

#[test]
fn pickles_serialise_to_json() {
    let result = compiled(LOGIN, None);
    let json = serde_json::to_value(&result.output).expect("pickles serialise");
    assert_eq!(
        json.pointer("/pickles/0/steps/0/origin").and_then(|v| v.as_str()),
        Some("scenario")
    );
    assert_eq!(
        json.pointer("/pickles/0/steps/1/keyword_type").and_then(|v| v.as_str()),
        Some("Action")
    );
}
