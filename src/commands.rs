//! The report commands. Each one is a thin adapter: resolve the snapshot,
//! call a collaborator or the explainer, print lines.

pub mod failure_reason;
pub mod init;
pub mod last_green;
pub mod queues;
pub mod results_for;
pub mod tree;
pub mod what_broke;
pub mod who_broke_it;

use crate::cli::SourceArgs;
use crate::config::{self, SheriffConfig};
use crate::model::Revision;
use crate::snapshot::Snapshot;
use crate::source::{CheckoutSource, TrackerSource};
use anyhow::{anyhow, Result};
use std::env;
use std::path::PathBuf;

pub(crate) struct ReportContext {
    pub config: SheriffConfig,
    pub snapshot: Snapshot,
}

pub(crate) fn load_context(source: &SourceArgs) -> Result<ReportContext> {
    let config_path = match &source.config {
        Some(path) => path.clone(),
        None => config::default_config_path()?,
    };
    let config = config::load_config(&config_path)?;
    let snapshot_path = resolve_snapshot_path(source, &config)?;
    tracing::debug!(snapshot = %snapshot_path.display(), "loading snapshot");
    let snapshot = Snapshot::load(&snapshot_path, config.core_builder_patterns()?)?;
    Ok(ReportContext { config, snapshot })
}

/// Resolve the snapshot path with fallback: explicit flag > env var > config.
fn resolve_snapshot_path(source: &SourceArgs, config: &SheriffConfig) -> Result<PathBuf> {
    if let Some(path) = &source.snapshot {
        return Ok(path.clone());
    }
    if let Some(value) = env::var_os("SHERIFF_SNAPSHOT").filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(value));
    }
    if let Some(path) = &config.snapshot {
        return Ok(path.clone());
    }
    Err(anyhow!(
        "no snapshot to read; pass --snapshot FILE, set SHERIFF_SNAPSHOT, \
         or run `sheriff init` and set \"snapshot\" in the config"
    ))
}

/// One blame block per suspect revision, from the snapshot's checkout data.
pub(crate) fn print_blame_blocks(snapshot: &Snapshot, suspects: &[Revision]) -> Result<()> {
    for revision in suspects {
        match snapshot.commit_info(*revision)? {
            Some(commit) => {
                let bug_url = commit.bug_id.map(|bug_id| snapshot.bug_url(bug_id));
                println!("{}", commit.blame_block(bug_url.as_deref()));
            }
            None => println!("{revision}: (no commit information)"),
        }
    }
    Ok(())
}
