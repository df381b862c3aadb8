//! Shared fixture loading for the integration tests.

use regex::Regex;
use sheriff::snapshot::{load_snapshot, Snapshot};
use std::path::PathBuf;

#[allow(dead_code)]
pub fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("triage.json")
}

/// The triage fixture with every builder treated as core.
pub fn triage_snapshot() -> Snapshot {
    triage_snapshot_with_core(&[])
}

/// The triage fixture with the given core-builder patterns.
#[allow(dead_code)]
pub fn triage_snapshot_with_core(patterns: &[&str]) -> Snapshot {
    let doc = load_snapshot(&fixture_path()).expect("load triage fixture");
    let patterns = patterns
        .iter()
        .map(|pattern| Regex::new(pattern).expect("core pattern"))
        .collect();
    Snapshot::new(doc, patterns)
}
