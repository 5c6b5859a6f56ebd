//! Lexer and parser configuration.
//!
//! Defaults match the reference grammar: English keywords and `+` as the
//! macro continuation marker. [`GherkinConfig::from_env`] lets tooling
//! override both without threading flags through every call site.

use serde::{Deserialize, Serialize};

use crate::dialect::DEFAULT_LANGUAGE;

/// Environment variable selecting the initial dialect.
pub const LANGUAGE_ENV: &str = "SHIFTLEFTER_LANGUAGE";

/// Environment variable selecting the macro marker; `off` or empty disables
/// macro recognition.
pub const MACRO_MARKER_ENV: &str = "SHIFTLEFTER_MACRO_MARKER";

/// Default macro continuation marker.
pub const DEFAULT_MACRO_MARKER: &str = "+";

/// Settings shared by the lexer and parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GherkinConfig {
    /// Language used until a `# language:` header switches it.
    pub default_language: String,
    /// Suffix that turns a step into a macro call; `None` disables macros.
    pub macro_marker: Option<String>,
}

impl Default for GherkinConfig {
    fn default() -> Self {
        Self {
            default_language: DEFAULT_LANGUAGE.to_string(),
            macro_marker: Some(DEFAULT_MACRO_MARKER.to_string()),
        }
    }
}

impl GherkinConfig {
    /// Build a configuration from the process environment.
    ///
    /// Unset variables keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    ///
    /// # Examples
    ///
    /// ```
    /// use shiftlefter_gherkin::GherkinConfig;
    ///
    /// let config = GherkinConfig::from_lookup(|key| match key {
    ///     "SHIFTLEFTER_LANGUAGE" => Some("fr".to_string()),
    ///     "SHIFTLEFTER_MACRO_MARKER" => Some("off".to_string()),
    ///     _ => None,
    /// });
    /// assert_eq!(config.default_language, "fr");
    /// assert_eq!(config.macro_marker, None);
    /// ```
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(language) = lookup(LANGUAGE_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
        {
            config.default_language = language;
        }
        if let Some(marker) = lookup(MACRO_MARKER_ENV) {
            config.macro_marker = parse_marker(&marker);
        }
        config
    }

    /// Replace the initial dialect.
    #[must_use]
    pub fn with_language(mut self, code: impl Into<String>) -> Self {
        self.default_language = code.into();
        self
    }

    /// Replace the macro marker.
    #[must_use]
    pub fn with_macro_marker(mut self, marker: impl Into<String>) -> Self {
        self.macro_marker = parse_marker(&marker.into());
        self
    }

    /// Disable macro recognition.
    #[must_use]
    pub fn without_macros(mut self) -> Self {
        self.macro_marker = None;
        self
    }
}

fn parse_marker(value: &str) -> Option<String> {
    match value.trim() {
        "" | "0" | "false" | "FALSE" | "False" | "no" | "NO" | "No" | "off" | "OFF" | "Off"
        | "none" | "NONE" | "None" => None,
        marker => Some(marker.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_to_english_and_plus() {
        let config = GherkinConfig::default();
        assert_eq!(config.default_language, "en");
        assert_eq!(config.macro_marker.as_deref(), Some("+"));
    }

    #[test]
    fn unset_variables_keep_defaults() {
        assert_eq!(GherkinConfig::from_lookup(|_| None), GherkinConfig::default());
    }

    #[rstest]
    #[case("+", Some("+"))]
    #[case(" ... ", Some("..."))]
    #[case("", None)]
    #[case("off", None)]
    #[case("None", None)]
    fn parses_marker_values(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(parse_marker(raw).as_deref(), expected);
    }

    #[test]
    fn blank_language_is_ignored() {
        let config = GherkinConfig::from_lookup(|key| {
            (key == LANGUAGE_ENV).then(|| "   ".to_string())
        });
        assert_eq!(config.default_language, "en");
    }

    #[test]
    fn builders_compose() {
        let config = GherkinConfig::default()
            .with_language("ja")
            .with_macro_marker(">>")
            .without_macros()
            .with_macro_marker("&");
        assert_eq!(config.default_language, "ja");
        assert_eq!(config.macro_marker.as_deref(), Some("&"));
    }
}
