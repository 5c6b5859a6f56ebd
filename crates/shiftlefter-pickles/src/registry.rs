//! Read-only macro registry.
//!
//! Loading definitions from disk belongs to the caller; this module only
//! stores decoded definitions and answers lookups by key.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shiftlefter_gherkin::{Location, Step};

/// One named sequence of steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroDefinition {
    /// Key a call refers to, without the marker.
    pub key: String,
    /// Steps substituted for each call, in order.
    pub steps: Vec<Step>,
    /// File the definition was loaded from, if known.
    #[serde(default)]
    pub source: Option<String>,
    /// Location of the definition header.
    pub location: Location,
}

impl MacroDefinition {
    /// Create a definition with no recorded source file.
    #[must_use]
    pub fn new(key: impl Into<String>, steps: Vec<Step>, location: Location) -> Self {
        Self {
            key: key.into(),
            steps,
            source: None,
            location,
        }
    }

    /// Record the file the definition came from.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Definitions keyed by macro name.
///
/// # Examples
///
/// ```
/// use shiftlefter_gherkin::Location;
/// use shiftlefter_pickles::{MacroDefinition, MacroRegistry};
///
/// let mut registry = MacroRegistry::new();
/// registry.insert(MacroDefinition::new("log in", Vec::new(), Location::new(1, 1)));
/// assert!(registry.contains("log in"));
/// assert!(registry.get("log out").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MacroRegistry {
    macros: BTreeMap<String, MacroDefinition>,
}

impl MacroRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition, returning the one it replaced.
    pub fn insert(&mut self, definition: MacroDefinition) -> Option<MacroDefinition> {
        self.macros.insert(definition.key.clone(), definition)
    }

    /// Look up a definition.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MacroDefinition> {
        self.macros.get(key)
    }

    /// Whether a definition exists for `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.macros.contains_key(key)
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.macros.len()
    }

    /// Whether the registry holds no definitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    /// Definitions in key order.
    pub fn iter(&self) -> impl Iterator<Item = &MacroDefinition> {
        self.macros.values()
    }
}

impl FromIterator<MacroDefinition> for MacroRegistry {
    fn from_iter<I: IntoIterator<Item = MacroDefinition>>(iter: I) -> Self {
        let mut registry = Self::new();
        for definition in iter {
            registry.insert(definition);
        }
        registry
    }
}
