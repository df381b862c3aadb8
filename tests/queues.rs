//! Tracker-queue reports over the triage fixture, including one command-level
//! run through the snapshot-resolution path.

mod common;

use common::{fixture_path, triage_snapshot};
use sheriff::cli::{PatchesToCommitQueueArgs, SourceArgs};
use sheriff::commands::queues::run_patches_to_commit_queue;
use sheriff::source::{CommitterDirectory, TrackerSource};

#[test]
fn queue_contents_come_back_in_snapshot_order() {
    let snapshot = triage_snapshot();
    assert_eq!(snapshot.bug_ids_in_commit_queue().unwrap(), vec![30001, 30003]);
    assert_eq!(snapshot.attachment_ids_in_review_queue().unwrap(), vec![1601, 1602]);

    let queued = snapshot.patches_in_commit_queue().unwrap();
    assert_eq!(queued.len(), 1);
    assert!(queued[0].is_commit_queue_approved());

    let pending = snapshot.patches_pending_commit().unwrap();
    assert_eq!(pending.len(), 3);
    assert!(snapshot.committer_by_email(&pending[0].attacher_email).is_some());
    assert!(pending[1].is_commit_queue_approved());
    assert!(snapshot.committer_by_email(&pending[2].attacher_email).is_none());
}

#[test]
fn tracker_urls_are_built_from_the_snapshot_base() {
    let snapshot = triage_snapshot();
    assert_eq!(
        snapshot.bug_url(30003),
        "https://bugs.example.org/show_bug.cgi?id=30003"
    );
    assert_eq!(
        snapshot.attachment_edit_url(1503),
        "https://bugs.example.org/attachment.cgi?id=1503&action=edit"
    );
}

#[test]
fn patches_to_commit_queue_runs_over_the_fixture() {
    let dir = tempfile::tempdir().unwrap();
    let args = PatchesToCommitQueueArgs {
        source: SourceArgs {
            snapshot: Some(fixture_path()),
            config: Some(dir.path().join("config.json")),
        },
        bugs: true,
    };
    run_patches_to_commit_queue(&args).unwrap();
}
