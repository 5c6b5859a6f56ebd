//! Macro expansion and pickle compilation.
//!
//! A pickle is one executable test case: a plain scenario, or one Examples
//! row of a Scenario Outline, with the applicable Background steps prepended
//! and placeholders substituted. Generation runs in two inspectable phases,
//! [`ast_to_pickle_plan`] for structure and [`pickle_plan_to_pickles`] for
//! identifiers and outline expansion.
//!
//! ```
//! use shiftlefter_pickles::{PickleConfig, compile};
//!
//! let source = "Feature: Login\n  Scenario: OK\n    Given I have 12 cucumbers\n";
//! let compiled = compile(source, None, &PickleConfig::new("login.feature"));
//! assert!(compiled.is_clean());
//! let names: Vec<&str> = compiled.output.pickles.iter().map(|p| p.name.as_str()).collect();
//! assert_eq!(names, vec!["OK"]);
//! ```

pub mod config;
pub mod error;
pub mod expand;
pub mod pickle;
pub mod placeholder;
pub mod plan;
pub mod registry;

use serde::Serialize;
use shiftlefter_gherkin::{Feature, ParseResult, parse_str_with};

pub use config::{DEFAULT_SOURCE_URI, PickleConfig};
pub use error::{MacroError, PickleError};
pub use expand::{Expansion, expand, expand_steps};
pub use pickle::{Pickle, PickleArgument, PickleOutput, PickleStep, pickle_plan_to_pickles};
pub use plan::{
    PickleTag, PicklePlan, PlannedExamples, PlannedRow, PlannedScenario, PlannedStep, StepOrigin,
    TagTier, ast_to_pickle_plan,
};
pub use registry::{MacroDefinition, MacroRegistry};

/// Generate pickles for `feature`, expanding macros first.
///
/// Calls left unresolved, including every call when `registry` is `None`,
/// turn their pickles into stubs and are listed in
/// [`PickleOutput::macro_errors`].
#[must_use]
pub fn pickles(
    feature: &Feature,
    registry: Option<&MacroRegistry>,
    source_uri: &str,
) -> PickleOutput {
    pickles_with(feature, registry, &PickleConfig::new(source_uri))
}

/// [`pickles`] with an explicit configuration.
#[must_use]
pub fn pickles_with(
    feature: &Feature,
    registry: Option<&MacroRegistry>,
    config: &PickleConfig,
) -> PickleOutput {
    let empty = MacroRegistry::new();
    let expansion = expand(feature, registry.unwrap_or(&empty));
    let mut output = pickle_plan_to_pickles(&ast_to_pickle_plan(&expansion.feature), config);
    output.macro_errors = expansion.errors;
    output
}

/// Everything produced by [`compile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Compilation {
    /// Tokens, AST, parse errors and comments.
    pub parse: ParseResult,
    /// Pickles with the expansion and pickling errors.
    pub output: PickleOutput,
}

impl Compilation {
    /// Whether parsing, expansion and pickling all succeeded without errors.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.parse.is_clean() && self.output.is_clean()
    }
}

/// Lex, parse, expand and pickle `source` in one call.
///
/// A document without a Feature yields no pickles; its problems are in
/// [`Compilation::parse`].
#[must_use]
pub fn compile(
    source: &str,
    registry: Option<&MacroRegistry>,
    config: &PickleConfig,
) -> Compilation {
    let parse = parse_str_with(source, &config.gherkin);
    let output = parse
        .feature()
        .map(|feature| pickles_with(feature, registry, config))
        .unwrap_or_default();
    Compilation { parse, output }
}
