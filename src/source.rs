//! Collaborator seams: the build service, the bug tracker, the committer
//! directory, and the checkout.
//!
//! The report commands only ever talk to these traits. The shipping
//! implementation is the snapshot file (`crate::snapshot`); tests substitute
//! purpose-built fakes.

use crate::model::{Build, BuilderStatus, Committer, CommitInfo, Patch, Revision, TransitionEnds};
use anyhow::Result;
use std::collections::BTreeSet;

/// Read access to the CI service's builders and builds.
///
/// Fetches may fail (`Err`) or come back empty (`Ok(None)`); callers in the
/// walk loops treat both as soft conditions.
pub trait BuildSource {
    /// Current status line for every builder, in the service's order.
    fn builder_statuses(&self) -> Result<Vec<BuilderStatus>>;

    /// The build with the given number on the given builder.
    fn build(&self, builder: &str, number: u64) -> Result<Option<Build>>;

    /// The most recent build of `builder` at exactly `revision`.
    fn build_for_revision(&self, builder: &str, revision: Revision) -> Result<Option<Build>>;

    /// The last revision at which every core builder was green.
    fn last_green_revision(&self) -> Result<Option<Revision>>;

    /// Walk backward from a red build to the green build (or disjoint red
    /// chain) that preceded it.
    ///
    /// A build with no results is kept in the red chain as if every test had
    /// failed (a compile failure, for example). A red build whose failures
    /// share nothing with the chain so far ends the chain the same way a
    /// green build does. Gives up after `look_back_limit` probes, returning
    /// only the red end.
    fn failure_transition(&self, red_build: &Build, look_back_limit: u64) -> Result<TransitionEnds> {
        if red_build.is_green() {
            return Ok(TransitionEnds::default());
        }
        let mut common_failures: Option<BTreeSet<String>> = None;
        let mut current = red_build.clone();
        let mut first_red: Option<Build> = None;
        let mut looked_back = 0u64;
        loop {
            if current.is_green() {
                return Ok(TransitionEnds {
                    last_green: Some(current),
                    first_red,
                });
            }
            if let Some(failing) = &current.failing_tests {
                let shared: BTreeSet<String> = match &common_failures {
                    None => failing.clone(),
                    Some(common) => common.intersection(failing).cloned().collect(),
                };
                if shared.is_empty() && common_failures.is_some() {
                    // Nothing in common with the red chain under
                    // investigation; the chain starts after this build.
                    return Ok(TransitionEnds {
                        last_green: Some(current),
                        first_red,
                    });
                }
                common_failures = Some(shared);
            }
            looked_back += 1;
            if looked_back > look_back_limit {
                tracing::debug!(
                    builder = %current.builder,
                    probes = looked_back,
                    "gave up looking for a failure transition"
                );
                return Ok(TransitionEnds {
                    last_green: None,
                    first_red: Some(current),
                });
            }
            first_red = Some(current.clone());
            let previous = match current.number.checked_sub(1) {
                Some(number) => self.build(&current.builder, number)?,
                None => None,
            };
            match previous {
                Some(build) => current = build,
                None => {
                    return Ok(TransitionEnds {
                        last_green: None,
                        first_red,
                    })
                }
            }
        }
    }
}

/// Read access to the bug tracker's queues and URL scheme.
pub trait TrackerSource {
    fn bug_ids_in_commit_queue(&self) -> Result<Vec<u64>>;
    fn patches_in_commit_queue(&self) -> Result<Vec<Patch>>;
    fn patches_pending_commit(&self) -> Result<Vec<Patch>>;
    fn attachment_ids_in_review_queue(&self) -> Result<Vec<u64>>;
    fn bug_url(&self, bug_id: u64) -> String;
    fn attachment_url(&self, attachment_id: u64) -> String;
    fn attachment_edit_url(&self, attachment_id: u64) -> String;
}

/// The project's registered-committer directory.
pub trait CommitterDirectory {
    fn committer_by_email(&self, email: &str) -> Option<Committer>;
}

/// Commit metadata lookup from the version-control checkout.
pub trait CheckoutSource {
    fn commit_info(&self, revision: Revision) -> Result<Option<CommitInfo>>;
}
