//! Placeholder substitution for Scenario Outline rows.
//!
//! Outline steps refer to Examples columns with `<name>` tokens. Each pickle
//! generated from a row sees those tokens replaced by the row's values, so
//! `Given I have <count> items` with a row `| count |` = `| 5 |` becomes
//! `Given I have 5 items`.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Matches `<placeholder>` tokens, capturing the name without brackets.
///
/// Names may contain spaces and punctuation, as Examples headers often do,
/// but may not start with whitespace or contain angle brackets, so a stray
/// `<` earlier in the text cannot swallow a real placeholder.
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Safe: The regex pattern is a compile-time constant and is valid.
    Regex::new(r"<([^<>\s][^<>]*)>").unwrap_or_else(|_| unreachable!("placeholder regex is valid"))
});

/// Replace every `<name>` whose name is a key of `values`.
///
/// Tokens naming no column are left verbatim. Substituted values are not
/// scanned again, so a value that itself looks like `<other>` stays as is.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use shiftlefter_pickles::placeholder::substitute;
///
/// let values = BTreeMap::from([("count".to_string(), "5".to_string())]);
/// assert_eq!(substitute("I have <count> <items>", &values), "I have 5 <items>");
/// ```
#[must_use]
pub fn substitute<'t>(text: &'t str, values: &BTreeMap<String, String>) -> Cow<'t, str> {
    if values.is_empty() {
        return Cow::Borrowed(text);
    }
    PLACEHOLDER_RE.replace_all(text, |caps: &Captures<'_>| {
        let whole = caps.get(0).map_or("", |m| m.as_str());
        caps.get(1)
            .and_then(|name| values.get(name.as_str()))
            .map_or_else(|| whole.to_string(), Clone::clone)
    })
}

/// Placeholder names in order of appearance, duplicates included.
#[must_use]
pub fn placeholder_names(text: &str) -> Vec<&str> {
    PLACEHOLDER_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}
