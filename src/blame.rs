//! The builder-greenness report behind `what-broke` and `who-broke-it`.
//!
//! A degenerate one-step cousin of the bisection walk: for each red builder,
//! ask the build service for the transition bracketing its current failures
//! and turn the answer into a blame range, a "sometime before" narrowing, or
//! a load error.

use crate::model::{suspect_revisions, BuilderStatus, Revision};
use crate::source::BuildSource;
use anyhow::Result;
use std::collections::BTreeMap;
use std::fmt;

/// What one red builder's transition find produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlameOutcome {
    /// Both ends found; `suspects` is the ascending range
    /// `(last_green.revision, first_red.revision]`.
    Range {
        suspects: Vec<Revision>,
        /// The red end is the builder's current build, so this may just be
        /// the first failure of a flaky test.
        first_failure: bool,
    },
    /// Only the red end was found.
    SometimeBefore { first_red: Revision },
    /// The builder's current build could not be fetched or used.
    LoadError,
}

impl fmt::Display for BlameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlameOutcome::Range {
                suspects,
                first_failure,
            } => {
                let range = suspects
                    .iter()
                    .map(|revision| revision.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                let hint = if *first_failure {
                    " FIRST FAILURE, possibly a flaky test"
                } else {
                    ""
                };
                write!(f, "FAIL (blame-list: {range}{hint})")
            }
            BlameOutcome::SometimeBefore { first_red } => {
                write!(f, "FAIL (blame-list: sometime before {first_red}?)")
            }
            BlameOutcome::LoadError => write!(f, "FAIL (error loading build information)"),
        }
    }
}

/// One red builder's entry in the greenness report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenBuilder {
    pub name: String,
    pub outcome: BlameOutcome,
}

/// Builder statuses partitioned by greenness, with a blame outcome per red
/// builder.
#[derive(Debug, Clone)]
pub struct GreennessReport {
    pub statuses: Vec<BuilderStatus>,
    pub broken: Vec<BrokenBuilder>,
}

impl GreennessReport {
    pub fn all_green(&self) -> bool {
        self.broken.is_empty()
    }
}

pub fn greenness_report(
    source: &dyn BuildSource,
    look_back_limit: u64,
) -> Result<GreennessReport> {
    let statuses = source.builder_statuses()?;
    let mut broken = Vec::new();
    for status in &statuses {
        if status.is_green {
            continue;
        }
        broken.push(BrokenBuilder {
            name: status.name.clone(),
            outcome: blame_for_builder(source, status, look_back_limit)?,
        });
    }
    Ok(GreennessReport { statuses, broken })
}

fn blame_for_builder(
    source: &dyn BuildSource,
    status: &BuilderStatus,
    look_back_limit: u64,
) -> Result<BlameOutcome> {
    let red_build = match source.build(&status.name, status.build_number) {
        Ok(Some(build)) => build,
        Ok(None) => return Ok(BlameOutcome::LoadError),
        Err(err) => {
            tracing::debug!(
                builder = %status.name,
                error = %format!("{err:#}"),
                "failed to load the current build"
            );
            return Ok(BlameOutcome::LoadError);
        }
    };
    let ends = source.failure_transition(&red_build, look_back_limit)?;
    let Some(first_red) = ends.first_red else {
        return Ok(BlameOutcome::LoadError);
    };
    let Some(last_green) = ends.last_green else {
        return Ok(BlameOutcome::SometimeBefore {
            first_red: first_red.revision,
        });
    };
    Ok(BlameOutcome::Range {
        suspects: suspect_revisions(last_green.revision, first_red.revision),
        first_failure: first_red.number == red_build.number,
    })
}

/// Folds every red builder's suspect range into a revision to builder-names
/// map, as reported by `who-broke-it`.
pub fn revisions_causing_failures(
    source: &dyn BuildSource,
    look_back_limit: u64,
) -> Result<BTreeMap<Revision, Vec<String>>> {
    let report = greenness_report(source, look_back_limit)?;
    let mut by_revision: BTreeMap<Revision, Vec<String>> = BTreeMap::new();
    for builder in &report.broken {
        if let BlameOutcome::Range { suspects, .. } = &builder.outcome {
            for revision in suspects {
                by_revision
                    .entry(*revision)
                    .or_default()
                    .push(builder.name.clone());
            }
        }
    }
    Ok(by_revision)
}
