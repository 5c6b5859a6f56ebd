//! Keyword dialects for every supported spoken language.
//!
//! The table is compiled in from `data/gherkin-languages.json`, which uses the
//! same shape as the Cucumber project's language file. Lookups are total:
//! an unknown language code yields an empty dialect that matches nothing, so
//! the lexer degrades to unknown lines instead of failing.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::Deserialize;

use crate::keyword::{BlockKeyword, StepKeyword};

const LANGUAGES_JSON: &str = include_str!("../data/gherkin-languages.json");

/// Language code used when no `# language:` header is present.
pub const DEFAULT_LANGUAGE: &str = "en";

static DIALECTS: LazyLock<HashMap<String, Dialect>> = LazyLock::new(|| {
    // The embedded table is a compile-time constant; failing to decode it is
    // a build defect rather than a user error.
    let raw: HashMap<String, RawDialect> = serde_json::from_str(LANGUAGES_JSON)
        .unwrap_or_else(|err| unreachable!("embedded dialect table is valid JSON: {err}"));
    raw.into_iter()
        .map(|(code, dialect)| {
            let built = Dialect::from_raw(&code, dialect);
            (code, built)
        })
        .collect()
});

static EMPTY: LazyLock<Dialect> = LazyLock::new(|| Dialect {
    code: String::new(),
    name: String::new(),
    native: String::new(),
    block_keywords: Vec::new(),
    step_keywords: Vec::new(),
});

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDialect {
    name: String,
    native: String,
    feature: Vec<String>,
    background: Vec<String>,
    rule: Vec<String>,
    scenario: Vec<String>,
    scenario_outline: Vec<String>,
    examples: Vec<String>,
    given: Vec<String>,
    when: Vec<String>,
    then: Vec<String>,
    and: Vec<String>,
    but: Vec<String>,
}

/// A block keyword match: the semantic keyword, its spelling and the name
/// following the colon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMatch<'d> {
    /// Semantic keyword.
    pub keyword: BlockKeyword,
    /// Spelling as it appears in the dialect, without the colon.
    pub keyword_text: &'d str,
    /// Trimmed text after the colon.
    pub name: String,
}

/// A step keyword match: the semantic keyword, its spelling and the step text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepMatch<'d> {
    /// Semantic keyword.
    pub keyword: StepKeyword,
    /// Spelling as it appears in the dialect, trailing space included.
    pub keyword_text: &'d str,
    /// Trimmed text after the keyword.
    pub text: String,
}

/// Ordered keyword lists for one language.
///
/// Both lists are sorted longest spelling first; spellings of equal length
/// keep the order in which the language file declares them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialect {
    code: String,
    name: String,
    native: String,
    block_keywords: Vec<(String, BlockKeyword)>,
    step_keywords: Vec<(String, StepKeyword)>,
}

impl Dialect {
    fn from_raw(code: &str, raw: RawDialect) -> Self {
        let RawDialect {
            name,
            native,
            feature,
            background,
            rule,
            scenario,
            scenario_outline,
            examples,
            given,
            when,
            then,
            and,
            but,
        } = raw;

        let mut block_keywords: Vec<(String, BlockKeyword)> = Vec::new();
        for (spellings, keyword) in [
            (feature, BlockKeyword::Feature),
            (background, BlockKeyword::Background),
            (rule, BlockKeyword::Rule),
            (scenario, BlockKeyword::Scenario),
            (scenario_outline, BlockKeyword::ScenarioOutline),
            (examples, BlockKeyword::Examples),
        ] {
            push_unique(&mut block_keywords, spellings, |_| keyword);
        }

        let mut step_keywords: Vec<(String, StepKeyword)> = Vec::new();
        for (spellings, keyword) in [
            (given, StepKeyword::Given),
            (when, StepKeyword::When),
            (then, StepKeyword::Then),
            (and, StepKeyword::And),
            (but, StepKeyword::But),
        ] {
            push_unique(&mut step_keywords, spellings, |spelling| {
                if spelling.trim() == "*" {
                    StepKeyword::Star
                } else {
                    keyword
                }
            });
        }

        block_keywords.sort_by_key(|(spelling, _)| std::cmp::Reverse(spelling.chars().count()));
        step_keywords.sort_by_key(|(spelling, _)| std::cmp::Reverse(spelling.chars().count()));

        Self {
            code: code.to_string(),
            name,
            native,
            block_keywords,
            step_keywords,
        }
    }

    /// Language code, e.g. `"fr"`. Empty for the fallback dialect.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// English name of the language.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Native name of the language.
    #[must_use]
    pub fn native(&self) -> &str {
        &self.native
    }

    /// Whether the dialect defines no keywords at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.block_keywords.is_empty() && self.step_keywords.is_empty()
    }

    /// Block keyword spellings with their semantic keyword, in match order.
    pub fn block_keywords(&self) -> impl Iterator<Item = (&str, BlockKeyword)> {
        self.block_keywords
            .iter()
            .map(|(spelling, keyword)| (spelling.as_str(), *keyword))
    }

    /// Step keyword spellings with their semantic keyword, in match order.
    pub fn step_keywords(&self) -> impl Iterator<Item = (&str, StepKeyword)> {
        self.step_keywords
            .iter()
            .map(|(spelling, keyword)| (spelling.as_str(), *keyword))
    }

    /// Match a block header such as `Scenario: Login works`.
    ///
    /// `line` may carry leading whitespace. The keyword must be followed
    /// immediately by a colon.
    #[must_use]
    pub fn match_block_keyword(&self, line: &str) -> Option<BlockMatch<'_>> {
        let body = line.trim_start();
        self.block_keywords.iter().find_map(|(spelling, keyword)| {
            body.strip_prefix(spelling.as_str())
                .and_then(|rest| rest.strip_prefix(':'))
                .map(|rest| BlockMatch {
                    keyword: *keyword,
                    keyword_text: spelling.as_str(),
                    name: rest.trim().to_string(),
                })
        })
    }

    /// Match a step line such as `Given I have 3 cucumbers`.
    #[must_use]
    pub fn match_step_keyword(&self, line: &str) -> Option<StepMatch<'_>> {
        let body = line.trim_start();
        self.step_keywords.iter().find_map(|(spelling, keyword)| {
            body.strip_prefix(spelling.as_str()).map(|rest| StepMatch {
                keyword: *keyword,
                keyword_text: spelling.as_str(),
                text: rest.trim().to_string(),
            })
        })
    }
}

fn push_unique<K>(
    target: &mut Vec<(String, K)>,
    spellings: Vec<String>,
    keyword_for: impl Fn(&str) -> K,
) {
    for spelling in spellings {
        if spelling.is_empty() || target.iter().any(|(seen, _)| *seen == spelling) {
            continue;
        }
        let keyword = keyword_for(&spelling);
        target.push((spelling, keyword));
    }
}

/// Look up a dialect, falling back to an empty dialect for unknown codes.
///
/// # Examples
///
/// ```
/// use shiftlefter_gherkin::dialect;
///
/// assert_eq!(dialect::lookup("fr").code(), "fr");
/// assert!(dialect::lookup("xx-unknown").is_empty());
/// ```
#[must_use]
pub fn lookup(code: &str) -> &'static Dialect {
    lookup_known(code).unwrap_or_else(|| &*EMPTY)
}

/// Look up a dialect, returning `None` for unknown codes.
#[must_use]
pub fn lookup_known(code: &str) -> Option<&'static Dialect> {
    DIALECTS.get(code)
}

/// Every known language code, sorted.
#[must_use]
pub fn languages() -> Vec<&'static str> {
    let mut codes: Vec<&'static str> = DIALECTS.keys().map(String::as_str).collect();
    codes.sort_unstable();
    codes
}

/// Free-function form of [`Dialect::match_block_keyword`].
#[must_use]
pub fn match_block_keyword<'d>(line: &str, dialect: &'d Dialect) -> Option<BlockMatch<'d>> {
    dialect.match_block_keyword(line)
}

/// Free-function form of [`Dialect::match_step_keyword`].
#[must_use]
pub fn match_step_keyword<'d>(line: &str, dialect: &'d Dialect) -> Option<StepMatch<'d>> {
    dialect.match_step_keyword(line)
}
