//! Backward bisection over a builder's revision history.
//!
//! `explain_failures` starts from a red build and probes one revision at a
//! time toward older history. Whenever a usable probe no longer shows some of
//! the failures still unexplained, those failures are attributed to the
//! revision gap between that probe and the newest usable build above it.
//!
//! Probes that cannot participate (no build, no results, results truncated at
//! the reporting cap) become `WalkNote`s instead of state changes. One quirk
//! to know: a probe with a build but no results does not advance the later
//! side used for the next transition, so a transition found past such a gap
//! blames the whole span including the resultless revisions. Whether the gap
//! build ought to become the later side instead is ambiguous; the wider
//! blame span is what this walk produces.

use crate::model::{suspect_revisions, Build, Revision};
use crate::source::BuildSource;
use crate::util::pluralize;
use anyhow::Result;
use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::fmt;

pub const DEFAULT_SEARCH_LIMIT: u64 = 1000;
pub const DEFAULT_SATURATION_CAP: usize = 20;
pub const DEFAULT_LOOK_BACK_LIMIT: u64 = 30;

/// Bounds for one explain walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExplainPolicy {
    /// How many revisions below the start may be probed.
    pub search_limit: u64,
    /// Failing-test count at which a build's results are considered
    /// truncated by the status service and therefore unusable.
    pub saturation_cap: usize,
}

impl Default for ExplainPolicy {
    fn default() -> Self {
        Self {
            search_limit: DEFAULT_SEARCH_LIMIT,
            saturation_cap: DEFAULT_SATURATION_CAP,
        }
    }
}

/// One explained failure subset: the two usable builds that bracket it and
/// the revisions in between that could have introduced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Newest usable build that does not show the explained failures.
    pub earlier: Build,
    /// Oldest usable build that still shows them.
    pub later: Build,
    /// The failures this transition explains. Never empty.
    pub explained: BTreeSet<String>,
    /// Ascending, gap-free revisions in `(earlier.revision, later.revision]`.
    pub suspects: Vec<Revision>,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SUCCESS: Build {} ({}) was the first to show failures: {}",
            self.later.number,
            self.later.revision,
            crate::util::comma_separated(&self.explained)
        )
    }
}

/// A soft condition met at one probed revision. Notes never change the walk
/// state; they are kept so a report can replay the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkNote {
    /// The build lookup itself failed.
    FetchFailed { revision: Revision, message: String },
    /// No build ran at this revision.
    NoBuild { revision: Revision },
    /// A build exists but its results are unavailable.
    NoResults { revision: Revision, build_number: u64 },
    /// The failing list reached the reporting cap; results are truncated.
    Saturated {
        revision: Revision,
        build_number: u64,
        failing_count: usize,
    },
    /// Every unexplained failure was still failing here.
    NoChange {
        revision: Revision,
        build_number: u64,
        unexplained: usize,
        failing: usize,
    },
}

impl WalkNote {
    pub fn revision(&self) -> Revision {
        match self {
            WalkNote::FetchFailed { revision, .. }
            | WalkNote::NoBuild { revision }
            | WalkNote::NoResults { revision, .. }
            | WalkNote::Saturated { revision, .. }
            | WalkNote::NoChange { revision, .. } => *revision,
        }
    }
}

impl fmt::Display for WalkNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalkNote::FetchFailed { revision, message } => {
                write!(f, "Failed to fetch build for {revision}: {message}")
            }
            WalkNote::NoBuild { revision } => write!(f, "No build for {revision}"),
            WalkNote::NoResults {
                revision,
                build_number,
            } => write!(f, "No results in build {build_number} ({revision})"),
            WalkNote::Saturated {
                revision,
                build_number,
                failing_count,
            } => write!(
                f,
                "Too many failures in build {build_number} ({revision}), ignoring ({failing_count} reported)"
            ),
            WalkNote::NoChange {
                revision,
                build_number,
                unexplained,
                failing,
            } => write!(
                f,
                "No change in build {build_number} ({revision}), {} ({failing} in this build)",
                pluralize(*unexplained, "unexplained failure")
            ),
        }
    }
}

/// Fatal start condition: the walk has nothing to bisect from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoResultsAtStart {
    pub builder: String,
    pub revision: Revision,
    pub reason: StartFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartFailure {
    NoBuild,
    NoResults,
    Saturated,
}

impl fmt::Display for NoResultsAtStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            StartFailure::NoBuild => write!(
                f,
                "no build for \"{}\" at {}; can't continue",
                self.builder, self.revision
            ),
            StartFailure::NoResults => write!(
                f,
                "failed to load test results for \"{}\" at {}; can't continue",
                self.builder, self.revision
            ),
            StartFailure::Saturated => write!(
                f,
                "test results for \"{}\" at {} are truncated at the reporting cap; can't continue",
                self.builder, self.revision
            ),
        }
    }
}

impl std::error::Error for NoResultsAtStart {}

/// Mutable walk state: what is still unexplained and the newest build with
/// usable results.
#[derive(Debug, Clone)]
pub struct WalkState {
    pub unexplained: BTreeSet<String>,
    pub last_with_results: Build,
}

/// One probed revision, as handed to `step` by the fetch loop.
#[derive(Debug, Clone)]
pub enum Probe {
    /// The lookup failed outright.
    Error { revision: Revision, message: String },
    /// The lookup succeeded but no build ran at this revision.
    Missing { revision: Revision },
    /// A build was found.
    Found(Build),
}

/// What one probe did to the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepEffect {
    Note(WalkNote),
    Explained(Transition),
}

/// Applies one probe to the walk state. Exactly one note or one transition
/// comes out of every probe.
pub fn step(state: &mut WalkState, probe: Probe, policy: ExplainPolicy) -> StepEffect {
    let build = match probe {
        Probe::Error { revision, message } => {
            return StepEffect::Note(WalkNote::FetchFailed { revision, message })
        }
        Probe::Missing { revision } => return StepEffect::Note(WalkNote::NoBuild { revision }),
        Probe::Found(build) => build,
    };
    let Some(failing) = build.failing_tests.clone() else {
        // last_with_results stays put; see the module docs.
        return StepEffect::Note(WalkNote::NoResults {
            revision: build.revision,
            build_number: build.number,
        });
    };
    if failing.len() >= policy.saturation_cap {
        return StepEffect::Note(WalkNote::Saturated {
            revision: build.revision,
            build_number: build.number,
            failing_count: failing.len(),
        });
    }
    let fixed: BTreeSet<String> = state.unexplained.difference(&failing).cloned().collect();
    if fixed.is_empty() {
        let note = WalkNote::NoChange {
            revision: build.revision,
            build_number: build.number,
            unexplained: state.unexplained.len(),
            failing: failing.len(),
        };
        state.last_with_results = build;
        return StepEffect::Note(note);
    }
    let transition = Transition {
        suspects: suspect_revisions(build.revision, state.last_with_results.revision),
        later: state.last_with_results.clone(),
        explained: fixed.clone(),
        earlier: build.clone(),
    };
    state.last_with_results = build;
    state.unexplained = &state.unexplained - &fixed;
    StepEffect::Explained(transition)
}

/// Everything one walk produced.
#[derive(Debug, Clone)]
pub struct ExplainOutcome {
    pub start: Build,
    pub transitions: Vec<Transition>,
    pub unexplained: BTreeSet<String>,
    pub notes: Vec<WalkNote>,
}

/// A note or transition in the order the walk met it.
#[derive(Debug)]
pub enum WalkEvent<'a> {
    Note(&'a WalkNote),
    Explained(&'a Transition),
}

impl WalkEvent<'_> {
    fn probe_revision(&self) -> Revision {
        match self {
            WalkEvent::Note(note) => note.revision(),
            WalkEvent::Explained(transition) => transition.earlier.revision,
        }
    }
}

impl ExplainOutcome {
    pub fn fully_explained(&self) -> bool {
        self.unexplained.is_empty()
    }

    /// Replays the walk. Every probe yielded at most one note or transition
    /// and probes descend strictly, so merging both lists by probe revision
    /// restores the original order.
    pub fn events(&self) -> Vec<WalkEvent<'_>> {
        let mut events: Vec<WalkEvent<'_>> = self
            .notes
            .iter()
            .map(WalkEvent::Note)
            .chain(self.transitions.iter().map(WalkEvent::Explained))
            .collect();
        events.sort_by_key(|event| Reverse(event.probe_revision()));
        events
    }
}

/// Walks backward from `start_revision` on `builder`, explaining the failing
/// tests found there.
///
/// Lookup problems below the start are soft and become notes; an unusable
/// start position fails the whole call with [`NoResultsAtStart`].
pub fn explain_failures(
    source: &dyn BuildSource,
    builder: &str,
    start_revision: Revision,
    policy: ExplainPolicy,
) -> Result<ExplainOutcome> {
    let no_results_at_start = |reason| NoResultsAtStart {
        builder: builder.to_string(),
        revision: start_revision,
        reason,
    };
    let start = source
        .build_for_revision(builder, start_revision)?
        .ok_or_else(|| no_results_at_start(StartFailure::NoBuild))?;
    let failing = match &start.failing_tests {
        Some(failing) if failing.len() >= policy.saturation_cap => {
            return Err(no_results_at_start(StartFailure::Saturated).into())
        }
        Some(failing) => failing.clone(),
        None => return Err(no_results_at_start(StartFailure::NoResults).into()),
    };

    let floor = start_revision.0.saturating_sub(policy.search_limit);
    let mut state = WalkState {
        unexplained: failing,
        last_with_results: start.clone(),
    };
    let mut transitions = Vec::new();
    let mut notes = Vec::new();
    let mut cursor = start_revision.0;
    while !state.unexplained.is_empty() && cursor > floor {
        cursor -= 1;
        let revision = Revision(cursor);
        tracing::debug!(builder, revision = cursor, "probing build");
        let probe = match source.build_for_revision(builder, revision) {
            Ok(Some(build)) => Probe::Found(build),
            Ok(None) => Probe::Missing { revision },
            Err(err) => Probe::Error {
                revision,
                message: format!("{err:#}"),
            },
        };
        match step(&mut state, probe, policy) {
            StepEffect::Note(note) => notes.push(note),
            StepEffect::Explained(transition) => transitions.push(transition),
        }
    }

    Ok(ExplainOutcome {
        start,
        transitions,
        unexplained: state.unexplained,
        notes,
    })
}
