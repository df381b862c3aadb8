//! `what-broke`: red builders and the revisions that likely broke them.

use super::{load_context, print_blame_blocks};
use crate::blame::{greenness_report, BlameOutcome};
use crate::cli::WhatBrokeArgs;
use crate::util::pluralize;
use anyhow::{Context, Result};
use regex::Regex;

pub fn run(args: &WhatBrokeArgs) -> Result<()> {
    let context = load_context(&args.source)?;
    let filter = args
        .builders
        .as_deref()
        .map(Regex::new)
        .transpose()
        .context("invalid --builders pattern")?;
    let mut report = greenness_report(&context.snapshot, context.config.look_back_limit)?;
    if let Some(filter) = &filter {
        report.statuses.retain(|status| filter.is_match(&status.name));
        report.broken.retain(|builder| filter.is_match(&builder.name));
    }

    let name_width = report
        .statuses
        .iter()
        .map(|status| status.name.len())
        .max()
        .unwrap_or(0);
    for broken in &report.broken {
        println!("{:<name_width$} : {}", broken.name, broken.outcome);
        if let BlameOutcome::Range { suspects, .. } = &broken.outcome {
            print_blame_blocks(&context.snapshot, suspects)?;
        }
    }

    if report.all_green() {
        println!("All builders are passing!");
    } else {
        println!(
            "{} of {} are failing",
            report.broken.len(),
            pluralize(report.statuses.len(), "builder")
        );
    }
    Ok(())
}
