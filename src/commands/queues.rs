//! Bug-tracker queue reports. Headers and skip notes go to stderr so stdout
//! stays pipeable.

use super::load_context;
use crate::cli::{
    BugsToCommitArgs, PatchesInCommitQueueArgs, PatchesToCommitQueueArgs, PatchesToReviewArgs,
};
use crate::source::{CommitterDirectory, TrackerSource};
use anyhow::Result;
use std::collections::BTreeSet;

/// `bugs-to-commit`: bug ids with a patch in the commit queue.
pub fn run_bugs_to_commit(args: &BugsToCommitArgs) -> Result<()> {
    let context = load_context(&args.source)?;
    for bug_id in context.snapshot.bug_ids_in_commit_queue()? {
        println!("{bug_id}");
    }
    Ok(())
}

/// `patches-in-commit-queue`: attachment URLs awaiting the commit queue.
pub fn run_patches_in_commit_queue(args: &PatchesInCommitQueueArgs) -> Result<()> {
    let context = load_context(&args.source)?;
    eprintln!("Patches in commit queue:");
    for patch in context.snapshot.patches_in_commit_queue()? {
        println!("{}", context.snapshot.attachment_url(patch.id));
    }
    Ok(())
}

/// `patches-to-commit-queue`: pending-commit patches that still need the
/// queue flag, skipping patches already approved and patches attached by a
/// registered committer.
pub fn run_patches_to_commit_queue(args: &PatchesToCommitQueueArgs) -> Result<()> {
    let context = load_context(&args.source)?;
    let snapshot = &context.snapshot;
    let mut needing_queue = Vec::new();
    for patch in snapshot.patches_pending_commit()? {
        if patch.is_commit_queue_approved() {
            eprintln!("{} already has cq=+", patch.id);
            continue;
        }
        if let Some(committer) = snapshot.committer_by_email(&patch.attacher_email) {
            eprintln!("{} committer = {committer}", patch.id);
            continue;
        }
        needing_queue.push(patch);
    }
    if args.bugs {
        let bug_ids: BTreeSet<u64> = needing_queue.iter().map(|patch| patch.bug_id).collect();
        for bug_id in bug_ids {
            println!("{}", snapshot.bug_url(bug_id));
        }
    } else {
        for patch in &needing_queue {
            println!("{}", snapshot.attachment_edit_url(patch.id));
        }
    }
    Ok(())
}

/// `patches-to-review`: attachment ids awaiting review.
pub fn run_patches_to_review(args: &PatchesToReviewArgs) -> Result<()> {
    let context = load_context(&args.source)?;
    eprintln!("Patches pending review:");
    for attachment_id in context.snapshot.attachment_ids_in_review_queue()? {
        println!("{attachment_id}");
    }
    Ok(())
}
