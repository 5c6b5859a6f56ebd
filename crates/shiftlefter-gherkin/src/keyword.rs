//! Semantic keyword types shared by the lexer, parser and pickler.
//!
//! Dialects map many spellings onto the same semantic keyword. The lexer
//! classifies a line into a [`BlockKeyword`] or a [`StepKeyword`] and keeps
//! the spelling separately, so downstream consumers can reason about
//! structure without caring which language a file was written in.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Keyword introducing a step line.
///
/// The enum includes the conjunctions `And`/`But` and the language-neutral
/// bullet `*`; pickling resolves them against the preceding primary keyword
/// using [`resolve`](Self::resolve) and [`KeywordType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepKeyword {
    /// Setup preconditions for a scenario.
    Given,
    /// Perform an action when testing behaviour.
    When,
    /// Assert the expected outcome of a scenario.
    Then,
    /// Additional conditions that share context with the previous step.
    And,
    /// Negative or contrasting conditions.
    But,
    /// The `*` bullet, valid in every dialect.
    #[serde(rename = "*")]
    Star,
}

impl StepKeyword {
    /// Return the canonical English spelling of the keyword.
    ///
    /// # Examples
    ///
    /// ```
    /// use shiftlefter_gherkin::StepKeyword;
    ///
    /// assert_eq!(StepKeyword::Given.as_str(), "Given");
    /// assert_eq!(StepKeyword::Star.as_str(), "*");
    /// ```
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Given => "Given",
            Self::When => "When",
            Self::Then => "Then",
            Self::And => "And",
            Self::But => "But",
            Self::Star => "*",
        }
    }

    /// Whether the keyword continues the previous step rather than starting
    /// a new phase.
    #[must_use]
    pub const fn is_conjunction(&self) -> bool {
        matches!(self, Self::And | Self::But)
    }

    /// Resolve conjunctions to the semantic keyword of the previous step.
    ///
    /// When the current keyword is `And` or `But`, returns the value stored in
    /// `prev`. For primary keywords (`Given`/`When`/`Then`), updates `prev` and
    /// returns the keyword unchanged. The `*` bullet carries no phase of its
    /// own and is returned as-is without touching `prev`.
    ///
    /// # Examples
    ///
    /// ```
    /// use shiftlefter_gherkin::StepKeyword;
    ///
    /// let mut prev = Some(StepKeyword::Given);
    /// assert_eq!(StepKeyword::And.resolve(&mut prev), StepKeyword::Given);
    /// assert_eq!(StepKeyword::When.resolve(&mut prev), StepKeyword::When);
    /// assert_eq!(prev, Some(StepKeyword::When));
    /// ```
    #[must_use]
    pub fn resolve(self, prev: &mut Option<Self>) -> Self {
        match self {
            Self::And | Self::But => prev.as_ref().copied().unwrap_or(Self::Given),
            Self::Star => self,
            Self::Given | Self::When | Self::Then => {
                *prev = Some(self);
                self
            }
        }
    }
}

impl fmt::Display for StepKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a [`StepKeyword`] from a string fails.
///
/// Contains the unrecognised keyword text for diagnostic purposes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid step keyword: {0}")]
pub struct StepKeywordParseError(pub String);

impl FromStr for StepKeyword {
    type Err = StepKeywordParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("given") {
            Ok(Self::Given)
        } else if trimmed.eq_ignore_ascii_case("when") {
            Ok(Self::When)
        } else if trimmed.eq_ignore_ascii_case("then") {
            Ok(Self::Then)
        } else if trimmed.eq_ignore_ascii_case("and") {
            Ok(Self::And)
        } else if trimmed.eq_ignore_ascii_case("but") {
            Ok(Self::But)
        } else if trimmed == "*" {
            Ok(Self::Star)
        } else {
            Err(StepKeywordParseError(trimmed.to_string()))
        }
    }
}

impl TryFrom<&str> for StepKeyword {
    type Error = StepKeywordParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Phase a step belongs to once conjunctions have been resolved.
///
/// Mirrors the keyword types used by the Cucumber messages model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum KeywordType {
    /// A `Given` step.
    Context,
    /// A `When` step.
    Action,
    /// A `Then` step.
    Outcome,
    /// An `And`/`But` keyword classified on its own by [`KeywordType::of`].
    /// [`KeywordType::resolve_sequence`] never yields it.
    Conjunction,
    /// A `*` step, or a conjunction with no primary keyword to inherit.
    Unknown,
}

impl KeywordType {
    /// Classify a keyword in isolation, without resolving conjunctions.
    #[must_use]
    pub const fn of(keyword: StepKeyword) -> Self {
        match keyword {
            StepKeyword::Given => Self::Context,
            StepKeyword::When => Self::Action,
            StepKeyword::Then => Self::Outcome,
            StepKeyword::And | StepKeyword::But => Self::Conjunction,
            StepKeyword::Star => Self::Unknown,
        }
    }

    /// Resolve the type of each keyword in a step sequence.
    ///
    /// Conjunctions inherit the type of the most recent non-conjunction step;
    /// a `*` resets the inherited type to [`KeywordType::Unknown`].
    ///
    /// # Examples
    ///
    /// ```
    /// use shiftlefter_gherkin::{KeywordType, StepKeyword};
    ///
    /// let types = KeywordType::resolve_sequence([
    ///     StepKeyword::And,
    ///     StepKeyword::When,
    ///     StepKeyword::But,
    /// ]);
    /// assert_eq!(
    ///     types,
    ///     vec![KeywordType::Unknown, KeywordType::Action, KeywordType::Action]
    /// );
    /// ```
    #[must_use]
    pub fn resolve_sequence<I>(keywords: I) -> Vec<Self>
    where
        I: IntoIterator<Item = StepKeyword>,
    {
        let mut prev = None;
        keywords
            .into_iter()
            .map(|keyword| match keyword {
                StepKeyword::Star => {
                    prev = None;
                    Self::Unknown
                }
                _ if keyword.is_conjunction() && prev.is_none() => Self::Unknown,
                _ => Self::of(keyword.resolve(&mut prev)),
            })
            .collect()
    }
}

/// Keyword introducing a structural block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKeyword {
    /// `Feature:` and its translations.
    Feature,
    /// `Background:`.
    Background,
    /// `Rule:`.
    Rule,
    /// `Scenario:` / `Example:`.
    Scenario,
    /// `Scenario Outline:` / `Scenario Template:`.
    ScenarioOutline,
    /// `Examples:` / `Scenarios:`.
    Examples,
}

impl BlockKeyword {
    /// Return the canonical English spelling of the keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Feature => "Feature",
            Self::Background => "Background",
            Self::Rule => "Rule",
            Self::Scenario => "Scenario",
            Self::ScenarioOutline => "Scenario Outline",
            Self::Examples => "Examples",
        }
    }
}

impl fmt::Display for BlockKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[expect(clippy::expect_used, reason = "test helper with descriptive failures")]
    fn parse_kw(input: &str) -> StepKeyword {
        input
            .parse()
            .expect("test input should parse to a valid keyword")
    }

    #[rstest]
    #[case("Given", StepKeyword::Given)]
    #[case("given", StepKeyword::Given)]
    #[case(" WhEn ", StepKeyword::When)]
    #[case("THEN", StepKeyword::Then)]
    #[case("AND", StepKeyword::And)]
    #[case(" but ", StepKeyword::But)]
    #[case("* ", StepKeyword::Star)]
    fn parses_case_insensitively(#[case] input: &str, #[case] expected: StepKeyword) {
        assert_eq!(parse_kw(input), expected);
    }

    #[test]
    #[expect(clippy::expect_used, reason = "test verifies error case with descriptive failure")]
    fn rejects_invalid_keyword() {
        let err = "Angenommen"
            .parse::<StepKeyword>()
            .expect_err("expected parse error for a non-canonical keyword");
        assert_eq!(err.0, "Angenommen");
        assert_eq!(err.to_string(), "invalid step keyword: Angenommen");
    }

    #[test]
    fn resolve_returns_previous_for_conjunctions() {
        let mut prev = Some(StepKeyword::When);
        assert_eq!(StepKeyword::And.resolve(&mut prev), StepKeyword::When);
        assert_eq!(StepKeyword::But.resolve(&mut prev), StepKeyword::When);
        // prev unchanged for conjunctions
        assert_eq!(prev, Some(StepKeyword::When));
    }

    #[test]
    fn resolve_leaves_star_alone() {
        let mut prev = Some(StepKeyword::Then);
        assert_eq!(StepKeyword::Star.resolve(&mut prev), StepKeyword::Star);
        assert_eq!(prev, Some(StepKeyword::Then));
    }

    #[test]
    fn resolve_defaults_to_given_when_unseeded() {
        let mut prev = None;
        assert_eq!(StepKeyword::And.resolve(&mut prev), StepKeyword::Given);
        assert_eq!(prev, None);
    }

    #[rstest]
    #[case(
        vec![StepKeyword::Given, StepKeyword::And, StepKeyword::When, StepKeyword::Then, StepKeyword::But],
        vec![KeywordType::Context, KeywordType::Context, KeywordType::Action, KeywordType::Outcome, KeywordType::Outcome]
    )]
    #[case(
        vec![StepKeyword::Given, StepKeyword::Star, StepKeyword::And],
        vec![KeywordType::Context, KeywordType::Unknown, KeywordType::Unknown]
    )]
    #[case(
        vec![StepKeyword::But, StepKeyword::And, StepKeyword::Then, StepKeyword::And],
        vec![KeywordType::Unknown, KeywordType::Unknown, KeywordType::Outcome, KeywordType::Outcome]
    )]
    #[case(
        vec![StepKeyword::Star, StepKeyword::When, StepKeyword::Star, StepKeyword::Then, StepKeyword::But],
        vec![KeywordType::Unknown, KeywordType::Action, KeywordType::Unknown, KeywordType::Outcome, KeywordType::Outcome]
    )]
    fn resolves_keyword_types(#[case] keywords: Vec<StepKeyword>, #[case] expected: Vec<KeywordType>) {
        assert_eq!(KeywordType::resolve_sequence(keywords), expected);
    }

    #[test]
    fn conjunction_type_only_comes_from_isolated_classification() {
        assert_eq!(KeywordType::of(StepKeyword::And), KeywordType::Conjunction);
        let all = [
            StepKeyword::And,
            StepKeyword::Given,
            StepKeyword::But,
            StepKeyword::Star,
            StepKeyword::And,
        ];
        assert!(
            KeywordType::resolve_sequence(all)
                .iter()
                .all(|kind| *kind != KeywordType::Conjunction)
        );
    }

    #[test]
    fn star_serialises_as_bullet() {
        assert_eq!(
            serde_json::to_string(&StepKeyword::Star).unwrap_or_default(),
            "\"*\""
        );
    }
}
