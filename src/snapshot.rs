//! The snapshot file: one JSON document holding a pre-fetched picture of the
//! build service, the bug tracker, the checkout, and the committer registry.
//!
//! Every collaborator trait is implemented over this document, so a report
//! runs entirely from local data captured earlier.

use crate::model::{Build, BuilderStatus, CommitInfo, Committer, Patch, Revision};
use crate::source::{BuildSource, CheckoutSource, CommitterDirectory, TrackerSource};
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotDoc {
    pub schema_version: u32,
    #[serde(default)]
    pub builders: Vec<BuilderStatus>,
    #[serde(default)]
    pub builds: Vec<Build>,
    #[serde(default)]
    pub commits: Vec<CommitInfo>,
    #[serde(default)]
    pub tracker: TrackerDoc,
    #[serde(default)]
    pub committers: Vec<Committer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerDoc {
    #[serde(default = "default_tracker_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub commit_queue_bug_ids: Vec<u64>,
    #[serde(default)]
    pub commit_queue: Vec<Patch>,
    #[serde(default)]
    pub pending_commit: Vec<Patch>,
    #[serde(default)]
    pub review_queue: Vec<u64>,
}

impl Default for TrackerDoc {
    fn default() -> Self {
        Self {
            base_url: default_tracker_base_url(),
            commit_queue_bug_ids: Vec::new(),
            commit_queue: Vec::new(),
            pending_commit: Vec::new(),
            review_queue: Vec::new(),
        }
    }
}

fn default_tracker_base_url() -> String {
    "https://bugs.example.org".to_string()
}

pub fn load_snapshot(path: &Path) -> Result<SnapshotDoc> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let doc: SnapshotDoc = serde_json::from_slice(&bytes).context("parse snapshot")?;
    if doc.schema_version != SNAPSHOT_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported snapshot schema_version {}",
            doc.schema_version
        ));
    }
    Ok(doc)
}

/// A loaded snapshot, indexed for the lookups the commands perform.
pub struct Snapshot {
    statuses: Vec<BuilderStatus>,
    builds_by_number: BTreeMap<(String, u64), Build>,
    builds_by_revision: BTreeMap<(String, u64), Build>,
    commits: BTreeMap<u64, CommitInfo>,
    committers_by_email: BTreeMap<String, Committer>,
    tracker: TrackerDoc,
    core_builders: Vec<Regex>,
}

impl Snapshot {
    /// `core_builders` selects the builders whose collective greenness
    /// defines `last_green_revision`; an empty list means every builder.
    pub fn new(doc: SnapshotDoc, core_builders: Vec<Regex>) -> Self {
        let mut builds_by_number = BTreeMap::new();
        let mut builds_by_revision: BTreeMap<(String, u64), Build> = BTreeMap::new();
        for build in doc.builds {
            // A builder can build the same revision twice; the newest build
            // wins the by-revision index.
            match builds_by_revision.entry((build.builder.clone(), build.revision.0)) {
                Entry::Vacant(entry) => {
                    entry.insert(build.clone());
                }
                Entry::Occupied(mut entry) => {
                    if build.number > entry.get().number {
                        entry.insert(build.clone());
                    }
                }
            }
            builds_by_number.insert((build.builder.clone(), build.number), build);
        }
        let mut tracker = doc.tracker;
        tracker.base_url = tracker.base_url.trim_end_matches('/').to_string();
        Self {
            statuses: doc.builders,
            builds_by_number,
            builds_by_revision,
            commits: doc
                .commits
                .into_iter()
                .map(|commit| (commit.revision.0, commit))
                .collect(),
            committers_by_email: doc
                .committers
                .into_iter()
                .map(|committer| (committer.email.to_lowercase(), committer))
                .collect(),
            tracker,
            core_builders,
        }
    }

    pub fn load(path: &Path, core_builders: Vec<Regex>) -> Result<Self> {
        Ok(Self::new(load_snapshot(path)?, core_builders))
    }

    fn is_core_builder(&self, name: &str) -> bool {
        self.core_builders.is_empty()
            || self.core_builders.iter().any(|pattern| pattern.is_match(name))
    }

    fn newest_build_at_or_before(&self, builder: &str, revision: u64) -> Option<&Build> {
        self.builds_by_revision
            .range((builder.to_string(), 0)..=(builder.to_string(), revision))
            .next_back()
            .map(|(_, build)| build)
    }
}

impl BuildSource for Snapshot {
    fn builder_statuses(&self) -> Result<Vec<BuilderStatus>> {
        Ok(self.statuses.clone())
    }

    fn build(&self, builder: &str, number: u64) -> Result<Option<Build>> {
        Ok(self
            .builds_by_number
            .get(&(builder.to_string(), number))
            .cloned())
    }

    fn build_for_revision(&self, builder: &str, revision: Revision) -> Result<Option<Build>> {
        Ok(self
            .builds_by_revision
            .get(&(builder.to_string(), revision.0))
            .cloned())
    }

    fn last_green_revision(&self) -> Result<Option<Revision>> {
        let core: Vec<&str> = self
            .statuses
            .iter()
            .map(|status| status.name.as_str())
            .filter(|name| self.is_core_builder(name))
            .collect();
        if core.is_empty() {
            return Ok(None);
        }
        let mut candidates: Vec<u64> = self
            .builds_by_revision
            .keys()
            .filter(|(builder, _)| self.is_core_builder(builder))
            .map(|(_, revision)| *revision)
            .collect();
        candidates.sort_unstable();
        candidates.dedup();
        for revision in candidates.into_iter().rev() {
            let all_green = core.iter().all(|builder| {
                self.newest_build_at_or_before(builder, revision)
                    .is_some_and(Build::is_green)
            });
            if all_green {
                return Ok(Some(Revision(revision)));
            }
        }
        Ok(None)
    }
}

impl TrackerSource for Snapshot {
    fn bug_ids_in_commit_queue(&self) -> Result<Vec<u64>> {
        Ok(self.tracker.commit_queue_bug_ids.clone())
    }

    fn patches_in_commit_queue(&self) -> Result<Vec<Patch>> {
        Ok(self.tracker.commit_queue.clone())
    }

    fn patches_pending_commit(&self) -> Result<Vec<Patch>> {
        Ok(self.tracker.pending_commit.clone())
    }

    fn attachment_ids_in_review_queue(&self) -> Result<Vec<u64>> {
        Ok(self.tracker.review_queue.clone())
    }

    fn bug_url(&self, bug_id: u64) -> String {
        format!("{}/show_bug.cgi?id={bug_id}", self.tracker.base_url)
    }

    fn attachment_url(&self, attachment_id: u64) -> String {
        format!("{}/attachment.cgi?id={attachment_id}", self.tracker.base_url)
    }

    fn attachment_edit_url(&self, attachment_id: u64) -> String {
        format!(
            "{}/attachment.cgi?id={attachment_id}&action=edit",
            self.tracker.base_url
        )
    }
}

impl CommitterDirectory for Snapshot {
    fn committer_by_email(&self, email: &str) -> Option<Committer> {
        self.committers_by_email.get(&email.to_lowercase()).cloned()
    }
}

impl CheckoutSource for Snapshot {
    fn commit_info(&self, revision: Revision) -> Result<Option<CommitInfo>> {
        Ok(self.commits.get(&revision.0).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn doc_from(json: &str) -> SnapshotDoc {
        serde_json::from_str(json).unwrap()
    }

    fn patterns(patterns: &[&str]) -> Vec<Regex> {
        patterns
            .iter()
            .map(|pattern| Regex::new(pattern).unwrap())
            .collect()
    }

    const SNAPSHOT: &str = r#"{
        "schema_version": 1,
        "builders": [
            { "name": "Mac Release", "is_green": false, "build_number": 6, "built_revision": 102 },
            { "name": "Win Release", "is_green": true, "build_number": 4, "built_revision": 101 },
            { "name": "Fuzz Bot", "is_green": false, "build_number": 9, "built_revision": 102 }
        ],
        "builds": [
            { "builder": "Mac Release", "number": 5, "revision": 100, "failing_tests": [] },
            { "builder": "Mac Release", "number": 6, "revision": 102, "failing_tests": ["fast/a.html"] },
            { "builder": "Win Release", "number": 3, "revision": 100, "failing_tests": [] },
            { "builder": "Win Release", "number": 4, "revision": 101, "failing_tests": [] },
            { "builder": "Fuzz Bot", "number": 9, "revision": 102, "failing_tests": null }
        ],
        "commits": [
            { "revision": 101, "author": "Eric Seidel", "summary": "Teach the scanner about nulls" }
        ],
        "tracker": {
            "base_url": "https://bugs.example.org/",
            "commit_queue_bug_ids": [30001, 30002],
            "review_queue": [1501]
        },
        "committers": [
            { "name": "Adam Barth", "email": "abarth@example.org" }
        ]
    }"#;

    #[test]
    fn document_round_trips_through_the_indexes() {
        let snapshot = Snapshot::new(doc_from(SNAPSHOT), Vec::new());
        let statuses = snapshot.builder_statuses().unwrap();
        assert_eq!(statuses.len(), 3);
        assert_eq!(statuses[0].name, "Mac Release");

        let build = snapshot.build("Mac Release", 6).unwrap().unwrap();
        assert_eq!(build.revision, Revision(102));
        assert_eq!(build.failing_count(), 1);

        let by_revision = snapshot
            .build_for_revision("Win Release", Revision(101))
            .unwrap()
            .unwrap();
        assert_eq!(by_revision.number, 4);
        assert!(snapshot
            .build_for_revision("Win Release", Revision(99))
            .unwrap()
            .is_none());

        let resultless = snapshot.build("Fuzz Bot", 9).unwrap().unwrap();
        assert!(!resultless.has_results());
    }

    #[test]
    fn duplicate_revision_keeps_the_newest_build() {
        let doc = doc_from(
            r#"{
                "schema_version": 1,
                "builds": [
                    { "builder": "Mac Release", "number": 5, "revision": 100, "failing_tests": ["fast/a.html"] },
                    { "builder": "Mac Release", "number": 7, "revision": 100, "failing_tests": [] }
                ]
            }"#,
        );
        let snapshot = Snapshot::new(doc, Vec::new());
        let build = snapshot
            .build_for_revision("Mac Release", Revision(100))
            .unwrap()
            .unwrap();
        assert_eq!(build.number, 7);
    }

    #[test]
    fn last_green_revision_ignores_non_core_builders() {
        let snapshot = Snapshot::new(doc_from(SNAPSHOT), patterns(&["Release"]));
        // Mac is red at r102, so the newest revision where both Release
        // builders are green is r101.
        assert_eq!(
            snapshot.last_green_revision().unwrap(),
            Some(Revision(101))
        );
    }

    #[test]
    fn last_green_revision_with_all_builders_core_is_blocked_by_the_fuzzer() {
        let snapshot = Snapshot::new(doc_from(SNAPSHOT), Vec::new());
        // Fuzz Bot has no green build at all, so no revision qualifies.
        assert_eq!(snapshot.last_green_revision().unwrap(), None);
    }

    #[test]
    fn tracker_urls_share_the_trimmed_base() {
        let snapshot = Snapshot::new(doc_from(SNAPSHOT), Vec::new());
        assert_eq!(
            snapshot.bug_url(30001),
            "https://bugs.example.org/show_bug.cgi?id=30001"
        );
        assert_eq!(
            snapshot.attachment_url(1501),
            "https://bugs.example.org/attachment.cgi?id=1501"
        );
        assert_eq!(
            snapshot.attachment_edit_url(1501),
            "https://bugs.example.org/attachment.cgi?id=1501&action=edit"
        );
    }

    #[test]
    fn committer_lookup_is_case_insensitive() {
        let snapshot = Snapshot::new(doc_from(SNAPSHOT), Vec::new());
        let committer = snapshot.committer_by_email("ABarth@Example.org").unwrap();
        assert_eq!(committer.name, "Adam Barth");
        assert!(snapshot.committer_by_email("nobody@example.org").is_none());
    }

    #[test]
    fn commit_lookup_finds_snapshot_commits() {
        let snapshot = Snapshot::new(doc_from(SNAPSHOT), Vec::new());
        let commit = snapshot.commit_info(Revision(101)).unwrap().unwrap();
        assert_eq!(commit.author, "Eric Seidel");
        assert!(snapshot.commit_info(Revision(55)).unwrap().is_none());
    }

    #[test]
    fn unsupported_schema_version_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{ "schema_version": 99 }"#).unwrap();
        let err = load_snapshot(file.path()).unwrap_err();
        assert!(err.to_string().contains("schema_version 99"));
    }
}
