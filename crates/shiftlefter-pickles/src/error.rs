//! Errors reported by macro expansion and pickle generation.
//!
//! Both kinds are data: they travel next to the best-effort output rather
//! than aborting it.

use serde::Serialize;
use shiftlefter_gherkin::Location;
use thiserror::Error;

/// A macro call that could not be expanded.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MacroError {
    /// No registry entry exists for the key.
    #[error("({location}): unresolved macro '{key}'")]
    UnresolvedMacro {
        /// Key the call asked for.
        key: String,
        /// Location of the call.
        location: Location,
    },
}

impl MacroError {
    /// Location of the offending call.
    #[must_use]
    pub const fn location(&self) -> Location {
        match self {
            Self::UnresolvedMacro { location, .. } => *location,
        }
    }
}

/// A defect that turned a pickle into a stub.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PickleError {
    /// The scenario still contains a macro call after expansion.
    #[error("({location}): unresolved macro '{key}' in pickle {pickle_id}")]
    UnresolvedMacro {
        /// Key of the unexpanded call.
        key: String,
        /// Location of the call.
        location: Location,
        /// Pickle that was stubbed.
        pickle_id: String,
    },
    /// An Examples row does not have as many cells as its header.
    #[error(
        "({location}): examples row has {found} cells but the header has {expected} \
         in pickle {pickle_id}"
    )]
    InconsistentCellCount {
        /// Header cell count.
        expected: usize,
        /// Row cell count.
        found: usize,
        /// Location of the row.
        location: Location,
        /// Pickle that was stubbed.
        pickle_id: String,
    },
}

impl PickleError {
    /// Location of the offending step or row.
    #[must_use]
    pub const fn location(&self) -> Location {
        match self {
            Self::UnresolvedMacro { location, .. }
            | Self::InconsistentCellCount { location, .. } => *location,
        }
    }

    /// Identifier of the stubbed pickle.
    #[must_use]
    pub fn pickle_id(&self) -> &str {
        match self {
            Self::UnresolvedMacro { pickle_id, .. }
            | Self::InconsistentCellCount { pickle_id, .. } => pickle_id,
        }
    }
}
