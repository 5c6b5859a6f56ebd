//! Unit tests for pickle generation.
#![expect(clippy::expect_used, reason = "tests fail loudly on missing pickles")]

use super::*;
use crate::plan::{TagTier, ast_to_pickle_plan};
use shiftlefter_gherkin::parse_str;

fn generate(source: &str, uri: &str) -> PickleOutput {
    let result = parse_str(source);
    assert!(result.is_clean(), "{:?}", result.errors);
    let plan = ast_to_pickle_plan(result.feature().expect("source declares a feature"));
    pickle_plan_to_pickles(&plan, &PickleConfig::new(uri))
}

const LOGIN: &str = "Feature: Login\n  Scenario: OK\n    Given I have 12 cucumbers\n    When I eat 5\n    Then I should have 7 left\n";

const CART: &str = r#"Feature: Cart
  Background:
    Given an empty cart

  @outline
  Scenario Outline: add <qty> <item>
    When I add <qty> <item>
    And I note:
      """<format>
      added <item>
      """
    Then the cart holds:
      | item   | qty   |
      | <item> | <qty> |

    @fast
    Examples: fruit
      | item  | qty | format |
      | apple | 1   | text   |
      | pear  | 2   | md     |

    Examples: veg
      | item | qty | format |
      | leek | 3   | text   |
"#;

#[test]
fn simple_scenario_yields_one_pickle() {
    let output = generate(LOGIN, "login.feature");
    assert!(output.errors.is_empty());
    assert_eq!(output.pickles.len(), 1);
    let pickle = output.pickles.first().expect("one pickle");
    assert_eq!(pickle.name, "OK");
    assert_eq!(pickle.id, "login.feature:2");
    assert_eq!(pickle.source_file, "login.feature");
    assert_eq!(pickle.template_name, None);
    assert!(!pickle.is_stub());

    let steps: Vec<(&str, StepKeyword, KeywordType)> = pickle
        .steps
        .iter()
        .map(|s| (s.id.as_str(), s.keyword, s.keyword_type))
        .collect();
    assert_eq!(
        steps,
        vec![
            ("login.feature:2/0", StepKeyword::Given, KeywordType::Context),
            ("login.feature:2/1", StepKeyword::When, KeywordType::Action),
            ("login.feature:2/2", StepKeyword::Then, KeywordType::Outcome),
        ]
    );
}

#[test]
fn outline_rows_expand_across_examples_blocks() {
    let output = generate(CART, "cart.feature");
    assert!(output.errors.is_empty(), "{:?}", output.errors);
    let summary: Vec<(&str, &str, Option<usize>)> = output
        .pickles
        .iter()
        .map(|p| (p.id.as_str(), p.name.as_str(), p.row_index))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("cart.feature:6:19", "add 1 apple", Some(0)),
            ("cart.feature:6:20", "add 2 pear", Some(1)),
            ("cart.feature:6:24", "add 3 leek", Some(2)),
        ]
    );
    let first = output.pickles.first().expect("first row pickle");
    assert_eq!(first.location, Location::new(19, 7));
    assert_eq!(first.template_name.as_deref(), Some("add <qty> <item>"));
    let values = first.row_values.clone().unwrap_or_default();
    assert_eq!(values.get("item").map(String::as_str), Some("apple"));
    assert_eq!(values.get("format").map(String::as_str), Some("text"));
}

#[test]
fn outline_steps_are_substituted_but_background_is_not() {
    let output = generate(CART, "cart.feature");
    let pickle = output.pickles.get(1).expect("second row pickle");
    let steps: Vec<(StepOrigin, &str, Option<&str>, KeywordType)> = pickle
        .steps
        .iter()
        .map(|s| (s.origin, s.text.as_str(), s.template_text.as_deref(), s.keyword_type))
        .collect();
    assert_eq!(
        steps,
        vec![
            (StepOrigin::FeatureBackground, "an empty cart", None, KeywordType::Context),
            (StepOrigin::Scenario, "I add 2 pear", Some("I add <qty> <item>"), KeywordType::Action),
            (StepOrigin::Scenario, "I note:", Some("I note:"), KeywordType::Action),
            (StepOrigin::Scenario, "the cart holds:", Some("the cart holds:"), KeywordType::Outcome),
        ]
    );
    assert_eq!(
        pickle.steps.get(2).and_then(|s| s.argument.clone()),
        Some(PickleArgument::Docstring {
            content: "added pear".into(),
            media_type: Some("md".into()),
        })
    );
    assert_eq!(
        pickle.steps.get(3).and_then(|s| s.argument.clone()),
        Some(PickleArgument::DataTable {
            rows: vec![
                vec!["item".into(), "qty".into()],
                vec!["pear".into(), "2".into()],
            ],
        })
    );
}

#[test]
fn examples_tags_follow_scenario_tags() {
    let output = generate(CART, "cart.feature");
    let tags: Vec<Vec<(&str, TagTier)>> = output
        .pickles
        .iter()
        .map(|p| p.tags.iter().map(|t| (t.name.as_str(), t.tier)).collect())
        .collect();
    assert_eq!(
        tags,
        vec![
            vec![("@outline", TagTier::Scenario), ("@fast", TagTier::Examples)],
            vec![("@outline", TagTier::Scenario), ("@fast", TagTier::Examples)],
            vec![("@outline", TagTier::Scenario)],
        ]
    );
}

#[test]
fn background_is_skipped_for_empty_scenarios() {
    let output = generate(
        "Feature: F\n  Background:\n    Given bg\n  Scenario: empty\n  Scenario: full\n    When x\n",
        "f.feature",
    );
    let counts: Vec<usize> = output.pickles.iter().map(|p| p.steps.len()).collect();
    assert_eq!(counts, vec![0, 2]);
}

#[test]
fn outline_without_rows_yields_nothing() {
    let output = generate(
        "Feature: F\n  Scenario Outline: O\n    Given <x>\n    Examples:\n      | x |\n",
        "f.feature",
    );
    assert!(output.pickles.is_empty());
}

#[test]
fn short_rows_become_stubs() {
    let output = generate(
        "Feature: F\n  Scenario Outline: O\n    Given <a> and <b>\n    Examples:\n      | a | b |\n      | 1 |\n      | 2 | 3 |\n",
        "f.feature",
    );
    assert_eq!(output.pickles.len(), 2);
    let first = output.pickles.first().expect("stubbed pickle");
    assert!(first.is_stub());
    assert_eq!(
        first.steps.first().map(|s| s.text.as_str()),
        Some("1 and <b>")
    );
    assert!(output.pickles.get(1).is_some_and(|p| !p.is_stub()));
    assert_eq!(
        output.errors,
        vec![PickleError::InconsistentCellCount {
            expected: 2,
            found: 1,
            location: Location::new(6, 7),
            pickle_id: "f.feature:2:6".into(),
        }]
    );
}

#[test]
fn unresolved_macro_stubs_only_its_pickle() {
    let output = generate(
        "Feature: F\n  Scenario: S\n    Given log in +\n  Scenario: T\n    Given fine\n",
        "m.feature",
    );
    let stubs: Vec<Option<&str>> = output.pickles.iter().map(|p| p.stub.as_deref()).collect();
    assert_eq!(stubs, vec![Some("unresolved macro 'log in'"), None]);
    assert_eq!(output.errors.len(), 1);
    assert!(output.errors.iter().all(|e| e.pickle_id() == "m.feature:2"));
}

#[test]
fn conjunction_types_carry_across_background() {
    let output = generate(
        "Feature: F\n  Background:\n    Given setup\n  Scenario: S\n    And more setup\n    * anything\n    But not this\n",
        "f.feature",
    );
    let types: Vec<KeywordType> = output
        .pickles
        .first()
        .map(|p| p.steps.iter().map(|s| s.keyword_type).collect())
        .unwrap_or_default();
    assert_eq!(
        types,
        vec![
            KeywordType::Context,
            KeywordType::Context,
            KeywordType::Unknown,
            KeywordType::Unknown,
        ]
    );
}

#[test]
fn comparison_operators_do_not_hide_placeholders() {
    let output = generate(
        "Feature: F\n  Scenario Outline: O\n    Then the total is <= <limit>\n    Examples:\n      | limit |\n      | 10    |\n",
        "f.feature",
    );
    let texts: Vec<&str> = output
        .pickles
        .iter()
        .flat_map(|p| p.steps.iter().map(|s| s.text.as_str()))
        .collect();
    assert_eq!(texts, vec!["the total is <= 10"]);
}
