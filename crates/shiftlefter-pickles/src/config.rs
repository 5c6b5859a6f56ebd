//! Pickle generation settings.

use serde::{Deserialize, Serialize};
use shiftlefter_gherkin::GherkinConfig;

/// URI used when the caller does not name the source.
pub const DEFAULT_SOURCE_URI: &str = "in-memory.feature";

/// Settings for [`crate::compile`] and [`crate::pickles_with`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickleConfig {
    /// URI stamped into every pickle and used as the identifier prefix.
    pub source_uri: String,
    /// Lexer and parser settings used by [`crate::compile`].
    pub gherkin: GherkinConfig,
}

impl Default for PickleConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE_URI)
    }
}

impl PickleConfig {
    /// Configuration for the given source URI with default parser settings.
    #[must_use]
    pub fn new(source_uri: impl Into<String>) -> Self {
        Self {
            source_uri: source_uri.into(),
            gherkin: GherkinConfig::default(),
        }
    }

    /// Replace the parser settings.
    #[must_use]
    pub fn with_gherkin(mut self, gherkin: GherkinConfig) -> Self {
        self.gherkin = gherkin;
        self
    }
}
