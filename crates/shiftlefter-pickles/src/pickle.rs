//! Phase two of pickling: identifiers and outline expansion.
//!
//! [`pickle_plan_to_pickles`] walks a [`PicklePlan`] and emits one
//! [`Pickle`] per plain scenario and one per Examples body row of each
//! outline. Identifiers derive from the source URI and line numbers, so they
//! are stable across runs and independent of generation order:
//!
//! - scenario pickles: `uri:line`
//! - outline pickles: `uri:line:row-line`
//! - steps: `pickle-id/step-index`
//!
//! A pickle that cannot be fully represented is still emitted, with
//! [`Pickle::stub`] explaining why and a matching [`PickleError`].

use std::collections::BTreeMap;

use log::debug;
use serde::Serialize;
use shiftlefter_gherkin::{KeywordType, Location, Provenance, StepArgument, StepKeyword};

use crate::config::PickleConfig;
use crate::error::{MacroError, PickleError};
use crate::placeholder::substitute;
use crate::plan::{
    PickleTag, PicklePlan, PlannedExamples, PlannedRow, PlannedScenario, PlannedStep, StepOrigin,
};

/// Resolved step argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PickleArgument {
    /// Table cells, row by row.
    DataTable {
        /// Cell values.
        rows: Vec<Vec<String>>,
    },
    /// Docstring body.
    Docstring {
        /// Content.
        content: String,
        /// Media type after the opening fence.
        media_type: Option<String>,
    },
}

/// One executable step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickleStep {
    /// `pickle-id/step-index`.
    pub id: String,
    /// Text after placeholder substitution.
    pub text: String,
    /// Keyword as written.
    pub keyword: StepKeyword,
    /// Semantic type with conjunctions resolved.
    pub keyword_type: KeywordType,
    /// Source position.
    pub location: Location,
    /// Resolved argument.
    pub argument: Option<PickleArgument>,
    /// Contributing block.
    pub origin: StepOrigin,
    /// Text before substitution; outline steps only.
    pub template_text: Option<String>,
    /// Macro bookkeeping.
    pub provenance: Option<Provenance>,
}

/// One executable test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pickle {
    /// Stable identifier.
    pub id: String,
    /// Scenario name after substitution.
    pub name: String,
    /// Source URI.
    pub source_file: String,
    /// Position of the scenario header, or of the Examples row.
    pub location: Location,
    /// Dialect of the source.
    pub language: String,
    /// Feature, rule, scenario and examples tags in that order.
    pub tags: Vec<PickleTag>,
    /// Background steps followed by the scenario's own.
    pub steps: Vec<PickleStep>,
    /// Outline name; outline pickles only.
    pub template_name: Option<String>,
    /// Row position across all Examples blocks of the outline.
    pub row_index: Option<usize>,
    /// Header-to-cell mapping of the row.
    pub row_values: Option<BTreeMap<String, String>>,
    /// Why the pickle is incomplete, if it is.
    pub stub: Option<String>,
}

impl Pickle {
    /// Whether the pickle was degraded to a stub.
    #[must_use]
    pub const fn is_stub(&self) -> bool {
        self.stub.is_some()
    }
}

/// Pickles plus the errors that stubbed some of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PickleOutput {
    /// Pickles in source order.
    pub pickles: Vec<Pickle>,
    /// Errors sorted by location.
    pub errors: Vec<PickleError>,
    /// Every macro call left unresolved by expansion, including calls in
    /// backgrounds no pickle uses. Empty when the plan was pickled directly.
    pub macro_errors: Vec<MacroError>,
}

impl PickleOutput {
    /// Whether expansion and pickling both finished without errors.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.macro_errors.is_empty()
    }
}

/// Example row being expanded into a pickle.
struct RowContext<'p> {
    examples: &'p PlannedExamples,
    row: &'p PlannedRow,
    index: usize,
    values: BTreeMap<String, String>,
}

/// Generate pickles from a plan.
#[must_use]
pub fn pickle_plan_to_pickles(plan: &PicklePlan, config: &PickleConfig) -> PickleOutput {
    let mut output = PickleOutput::default();
    let mut builder = Builder {
        plan,
        uri: &config.source_uri,
        errors: &mut output.errors,
    };
    for scenario in &plan.scenarios {
        let Some(blocks) = &scenario.examples else {
            output.pickles.push(builder.build(scenario, None));
            continue;
        };
        let mut index = 0_usize;
        for examples in blocks {
            let Some(header) = &examples.header else {
                continue;
            };
            for row in &examples.rows {
                let values = header
                    .cells
                    .iter()
                    .cloned()
                    .zip(row.cells.iter().cloned())
                    .collect();
                let context = RowContext {
                    examples,
                    row,
                    index,
                    values,
                };
                output.pickles.push(builder.build(scenario, Some(&context)));
                index = index.saturating_add(1);
            }
        }
    }
    output.errors.sort_by_key(PickleError::location);
    output
}

struct Builder<'p, 'e> {
    plan: &'p PicklePlan,
    uri: &'p str,
    errors: &'e mut Vec<PickleError>,
}

impl Builder<'_, '_> {
    fn build(&mut self, scenario: &PlannedScenario, row: Option<&RowContext<'_>>) -> Pickle {
        let id = row.map_or_else(
            || format!("{}:{}", self.uri, scenario.location.line),
            |context| {
                format!(
                    "{}:{}:{}",
                    self.uri, scenario.location.line, context.row.location.line
                )
            },
        );
        let empty = BTreeMap::new();
        let values = row.map_or(&empty, |context| &context.values);

        let background: &[PlannedStep] = if scenario.steps.is_empty() {
            &[]
        } else {
            &scenario.background
        };
        let planned: Vec<&PlannedStep> = background.iter().chain(&scenario.steps).collect();
        let types = KeywordType::resolve_sequence(planned.iter().map(|step| step.keyword));
        let steps = planned
            .iter()
            .zip(types)
            .enumerate()
            .map(|(idx, (step, keyword_type))| {
                let substituted = row.is_some() && step.origin == StepOrigin::Scenario;
                let values = substituted.then_some(values);
                pickle_step(step, format!("{id}/{idx}"), keyword_type, values)
            })
            .collect();

        let mut tags = scenario.tags.clone();
        if let Some(context) = row {
            tags.extend(context.examples.tags.iter().cloned());
        }

        let mut reasons = Vec::new();
        for step in &planned {
            if let Some(key) = &step.unresolved_macro {
                reasons.push(format!("unresolved macro '{key}'"));
                self.errors.push(PickleError::UnresolvedMacro {
                    key: key.clone(),
                    location: step.location,
                    pickle_id: id.clone(),
                });
            }
        }
        if let Some(context) = row {
            self.check_cell_count(context, &id, &mut reasons);
        }
        let stub = (!reasons.is_empty()).then(|| reasons.join("; "));
        if let Some(reason) = &stub {
            debug!("pickle {id} is a stub: {reason}");
        }

        Pickle {
            name: substitute(&scenario.name, values).into_owned(),
            source_file: self.uri.to_string(),
            location: row.map_or(scenario.location, |context| context.row.location),
            language: self.plan.language.clone(),
            tags,
            steps,
            template_name: row.map(|_| scenario.name.clone()),
            row_index: row.map(|context| context.index),
            row_values: row.map(|context| context.values.clone()),
            stub,
            id,
        }
    }

    fn check_cell_count(&mut self, context: &RowContext<'_>, id: &str, reasons: &mut Vec<String>) {
        let expected = context
            .examples
            .header
            .as_ref()
            .map_or(0, |header| header.cells.len());
        let found = context.row.cells.len();
        if found == expected {
            return;
        }
        reasons.push(format!(
            "examples row has {found} cells but the header has {expected}"
        ));
        self.errors.push(PickleError::InconsistentCellCount {
            expected,
            found,
            location: context.row.location,
            pickle_id: id.to_string(),
        });
    }
}

fn pickle_step(
    step: &PlannedStep,
    id: String,
    keyword_type: KeywordType,
    values: Option<&BTreeMap<String, String>>,
) -> PickleStep {
    let empty = BTreeMap::new();
    let subst = values.unwrap_or(&empty);
    let argument = step.argument.as_ref().map(|argument| match argument {
        StepArgument::DataTable(table) => PickleArgument::DataTable {
            rows: table
                .rows
                .iter()
                .map(|row| {
                    row.cells
                        .iter()
                        .map(|cell| substitute(&cell.value, subst).into_owned())
                        .collect()
                })
                .collect(),
        },
        StepArgument::Docstring(docstring) => PickleArgument::Docstring {
            content: substitute(&docstring.content, subst).into_owned(),
            media_type: docstring
                .media_type
                .as_deref()
                .map(|media| substitute(media, subst).into_owned()),
        },
    });
    PickleStep {
        id,
        text: substitute(&step.text, subst).into_owned(),
        keyword: step.keyword,
        keyword_type,
        location: step.location,
        argument,
        origin: step.origin,
        template_text: values.map(|_| step.text.clone()),
        provenance: step.provenance.clone(),
    }
}

#[cfg(test)]
mod tests;
