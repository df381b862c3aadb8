//! Domain types shared by the report commands and the bisection engine.

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A source-control revision number, printed as `r{n}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(pub u64);

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Parse a revision argument. Accepts a bare number or an `r`-prefixed one.
pub fn parse_revision_spec(spec: &str) -> Result<Revision> {
    let pattern = Regex::new(r"^r?(\d+)$").context("compile revision pattern")?;
    let captures = pattern.captures(spec.trim()).ok_or_else(|| {
        anyhow!("invalid revision {spec:?} (expected a number like 1234 or r1234)")
    })?;
    let number: u64 = captures[1]
        .parse()
        .with_context(|| format!("revision {spec:?} out of range"))?;
    Ok(Revision(number))
}

/// One builder's status line as reported by the CI service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderStatus {
    pub name: String,
    pub is_green: bool,
    pub build_number: u64,
    pub built_revision: Revision,
}

/// An immutable snapshot of one build: one builder at one revision.
///
/// `failing_tests` is `None` when the service had no usable results for the
/// build (results page missing, build errored before testing). An empty set
/// means the build ran its tests and all passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    pub builder: String,
    pub number: u64,
    pub revision: Revision,
    #[serde(default)]
    pub failing_tests: Option<BTreeSet<String>>,
}

impl Build {
    /// Whether the build has usable results.
    pub fn has_results(&self) -> bool {
        self.failing_tests.is_some()
    }

    /// Whether the build ran to completion with zero failing tests.
    pub fn is_green(&self) -> bool {
        matches!(&self.failing_tests, Some(failing) if failing.is_empty())
    }

    /// Failing-test count, treating missing results as zero.
    pub fn failing_count(&self) -> usize {
        self.failing_tests.as_ref().map_or(0, BTreeSet::len)
    }
}

/// The two ends of a green-to-red transition as resolved by the build
/// service. Either end may be missing: no green build found within the
/// look-back window, or the red build itself could not be loaded.
#[derive(Debug, Clone, Default)]
pub struct TransitionEnds {
    pub last_green: Option<Build>,
    pub first_red: Option<Build>,
}

/// The ascending, gap-free suspect range between two builds: every revision
/// after `earlier` up to and including `later`. Empty when the builds are
/// adjacent or out of order.
pub fn suspect_revisions(earlier: Revision, later: Revision) -> Vec<Revision> {
    if later.0 <= earlier.0 {
        return Vec::new();
    }
    (earlier.0 + 1..=later.0).map(Revision).collect()
}

/// A patch attachment as the bug tracker reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patch {
    pub id: u64,
    pub bug_id: u64,
    pub attacher_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_queue: Option<String>,
}

impl Patch {
    /// Whether the patch already carries a `cq=+` flag.
    pub fn is_commit_queue_approved(&self) -> bool {
        self.commit_queue.as_deref() == Some("+")
    }
}

/// A registered committer from the project's committer directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Committer {
    pub name: String,
    pub email: String,
}

impl fmt::Display for Committer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// Commit metadata for one revision, used to render blame blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitInfo {
    pub revision: Revision,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bug_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl CommitInfo {
    /// Render the multi-line blame block for this commit. `bug_url` is the
    /// tracker's URL for `bug_id` when both are known.
    pub fn blame_block(&self, bug_url: Option<&str>) -> String {
        let mut block = format!("{}:\n", self.revision);
        match (self.bug_id, bug_url) {
            (Some(bug_id), Some(url)) => {
                block.push_str(&format!("  Bug: {bug_id} ({url})\n"));
            }
            (Some(bug_id), None) => {
                block.push_str(&format!("  Bug: {bug_id}\n"));
            }
            (None, _) => {}
        }
        if let Some(summary) = &self.summary {
            block.push_str(&format!("  Description: {summary}\n"));
        }
        block.push_str(&format!("  Author: {}\n", self.author));
        block.push_str(&format!(
            "  Reviewer: {}\n",
            self.reviewer.as_deref().unwrap_or("(none)")
        ));
        block.push_str(&format!(
            "  Committer: {}\n",
            self.committer.as_deref().unwrap_or("(none)")
        ));
        block
    }
}
