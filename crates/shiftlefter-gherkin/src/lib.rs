//! Lossless Gherkin front end.
//!
//! The crate turns `.feature` source into tokens and an error-recovering AST.
//! Every input line becomes exactly one [`Token`] whose `raw` field holds the
//! line byte for byte, so [`reconstruct`] rebuilds the original input from
//! any token vector the [`Lexer`] produced. Keywords come from a table of
//! more than seventy dialects selected by `# language:` headers.
//!
//! ```
//! use shiftlefter_gherkin::{lex, parse_str, reconstruct, StepKeyword};
//!
//! let source = "Feature: Login\r\n  Scenario: OK\n    Given a user";
//! assert_eq!(reconstruct(&lex(source)), source);
//!
//! let result = parse_str(source);
//! assert!(result.is_clean());
//! let feature = result.feature().map(|f| f.name.as_str());
//! assert_eq!(feature, Some("Login"));
//! assert_eq!("Given".parse::<StepKeyword>().ok(), Some(StepKeyword::Given));
//! ```

pub mod ast;
pub mod config;
pub mod dialect;
pub mod error;
pub mod keyword;
pub mod lexer;
pub mod location;
pub mod parser;
pub mod token;

pub use ast::{
    Background, Blank, Comment, DataTable, Docstring, Examples, Feature, FeatureChild, MacroStep,
    Node, NodeRef, Provenance, ProvenanceRole, Rule, RuleChild, Scenario, ScenarioOutline, Step,
    StepArgument, StepNode, TableCell, TableRow, Tag,
};
pub use config::GherkinConfig;
pub use dialect::{DEFAULT_LANGUAGE, Dialect};
pub use error::{ParseError, ParseErrorKind};
pub use keyword::{BlockKeyword, KeywordType, StepKeyword, StepKeywordParseError};
pub use lexer::{Lexer, lex, lex_with, reconstruct};
pub use location::{Location, Span};
pub use parser::{ParseResult, parse, parse_str, parse_str_with, parse_with};
pub use token::{CellToken, Fence, TagToken, Token, TokenKind};
