//! CLI argument parsing for the sheriff reports.
//!
//! The CLI is intentionally thin: flags select a snapshot and tweak walk
//! bounds, and every report prints through the same command modules the
//! library exposes.

use crate::model::{parse_revision_spec, Revision};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint for the triage reports.
///
/// Keeping a single `RootArgs` type makes command routing obvious and avoids
/// hidden defaults in subcommand constructors.
#[derive(Parser, Debug)]
#[command(
    name = "sheriff",
    version,
    about = "Tree-status and failure-triage reports over a CI snapshot",
    after_help = "Examples:\n  sheriff tree --snapshot tree.json\n  sheriff what-broke --snapshot tree.json\n  sheriff failure-reason --builder \"Mac Release\" --snapshot tree.json\n  sheriff results-for r31000 --snapshot tree.json\n  sheriff patches-to-commit-queue --bugs --snapshot tree.json\n  sheriff init",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level report commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Tree(TreeArgs),
    WhatBroke(WhatBrokeArgs),
    WhoBrokeIt(WhoBrokeItArgs),
    FailureReason(FailureReasonArgs),
    ResultsFor(ResultsForArgs),
    LastGreen(LastGreenArgs),
    BugsToCommit(BugsToCommitArgs),
    PatchesInCommitQueue(PatchesInCommitQueueArgs),
    PatchesToCommitQueue(PatchesToCommitQueueArgs),
    PatchesToReview(PatchesToReviewArgs),
    Init(InitArgs),
}

/// Where the pre-fetched data comes from. Shared by every report command.
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Snapshot file to read (falls back to SHERIFF_SNAPSHOT, then the config)
    #[arg(long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Config file (defaults to the per-user location)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Print builder greenness, one line per builder.
#[derive(Parser, Debug)]
#[command(about = "Print ok/FAIL for every builder")]
pub struct TreeArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Parser, Debug)]
#[command(about = "Print failing builders and the revisions that broke them")]
pub struct WhatBrokeArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Only report builders whose name matches this pattern
    #[arg(long, value_name = "REGEX")]
    pub builders: Option<String>,
}

#[derive(Parser, Debug)]
#[command(about = "Print the revisions causing failures, with the builders they broke")]
pub struct WhoBrokeItArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Parser, Debug)]
#[command(about = "Walk a red builder's history to explain each failing test")]
pub struct FailureReasonArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Builder to diagnose (defaults to the first red builder)
    #[arg(long, value_name = "NAME")]
    pub builder: Option<String>,

    /// Revision to start from, as 123 or r123 (defaults to the builder's
    /// current built revision)
    #[arg(long, value_name = "REV", value_parser = parse_revision_spec)]
    pub revision: Option<Revision>,

    /// Probe at most this many revisions below the start
    #[arg(long, value_name = "N")]
    pub search_limit: Option<u64>,

    /// Treat builds with at least this many failures as truncated
    #[arg(long, value_name = "N")]
    pub saturation_cap: Option<usize>,
}

#[derive(Parser, Debug)]
#[command(about = "Print every builder's failing tests at one revision")]
pub struct ResultsForArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Revision to report, as 123 or r123
    #[arg(value_name = "REVISION", value_parser = parse_revision_spec)]
    pub revision: Revision,
}

#[derive(Parser, Debug)]
#[command(about = "Print the last revision where every core builder was green")]
pub struct LastGreenArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Parser, Debug)]
#[command(about = "Print bug ids with a patch in the commit queue")]
pub struct BugsToCommitArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Parser, Debug)]
#[command(about = "Print attachment URLs for patches in the commit queue")]
pub struct PatchesInCommitQueueArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Parser, Debug)]
#[command(about = "Print patches that should be added to the commit queue")]
pub struct PatchesToCommitQueueArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Print bug URLs instead of attachment edit URLs
    #[arg(long)]
    pub bugs: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Print attachment ids pending review")]
pub struct PatchesToReviewArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Parser, Debug)]
#[command(about = "Write a config stub at the per-user location")]
pub struct InitArgs {
    /// Config file to create (defaults to the per-user location)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revision_flag_accepts_both_spellings() {
        let args = RootArgs::parse_from([
            "sheriff",
            "failure-reason",
            "--builder",
            "Mac Release",
            "--revision",
            "r31000",
            "--snapshot",
            "tree.json",
        ]);
        let Command::FailureReason(args) = args.command else {
            panic!("expected failure-reason");
        };
        assert_eq!(args.revision, Some(Revision(31000)));

        let args = RootArgs::parse_from(["sheriff", "results-for", "31000"]);
        let Command::ResultsFor(args) = args.command else {
            panic!("expected results-for");
        };
        assert_eq!(args.revision, Revision(31000));
    }

    #[test]
    fn garbled_revision_is_rejected() {
        let result = RootArgs::try_parse_from(["sheriff", "results-for", "r31k"]);
        assert!(result.is_err());
    }

    #[test]
    fn command_names_use_kebab_case() {
        let args = RootArgs::parse_from(["sheriff", "patches-to-commit-queue", "--bugs"]);
        let Command::PatchesToCommitQueue(args) = args.command else {
            panic!("expected patches-to-commit-queue");
        };
        assert!(args.bugs);
    }
}
