//! `failure-reason`: walk a red builder's history backward until every
//! failing test is pinned to a suspect revision range.

use super::{load_context, print_blame_blocks, ReportContext};
use crate::cli::FailureReasonArgs;
use crate::explain::{explain_failures, ExplainOutcome, NoResultsAtStart, WalkEvent};
use crate::model::Revision;
use crate::source::BuildSource;
use crate::util::{comma_separated, pluralize};
use anyhow::{anyhow, Result};
use std::process::ExitCode;

/// Exits 0 when every failure was explained, 2 when the search bound ran out
/// first, 1 on errors.
pub fn run(args: &FailureReasonArgs) -> Result<ExitCode> {
    let context = load_context(&args.source)?;
    let (builder, built_revision) = builder_to_explain(&context, args.builder.as_deref())?;
    let start_revision = args.revision.unwrap_or(built_revision);
    let mut policy = context.config.explain_policy();
    if let Some(limit) = args.search_limit {
        policy.search_limit = limit;
    }
    if let Some(cap) = args.saturation_cap {
        policy.saturation_cap = cap;
    }

    println!("Examining failures for \"{builder}\", starting at {start_revision}");
    let outcome = match explain_failures(&context.snapshot, &builder, start_revision, policy) {
        Ok(outcome) => outcome,
        Err(err) => {
            let Some(typed) = err
                .chain()
                .find_map(|cause| cause.downcast_ref::<NoResultsAtStart>())
            else {
                return Err(err);
            };
            println!("{typed}");
            return Ok(ExitCode::FAILURE);
        }
    };
    print_walk(&context, &outcome)?;

    if outcome.fully_explained() {
        println!("Explained all failures for \"{builder}\"");
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "Failed to explain failures: {}",
            comma_separated(&outcome.unexplained)
        );
        Ok(ExitCode::from(2))
    }
}

/// Picks the builder to diagnose: the named one, else the first red builder
/// from the status list, with the red list printed to stderr.
fn builder_to_explain(
    context: &ReportContext,
    requested: Option<&str>,
) -> Result<(String, Revision)> {
    let statuses = context.snapshot.builder_statuses()?;
    if let Some(name) = requested {
        let status = statuses
            .iter()
            .find(|status| status.name == name)
            .ok_or_else(|| anyhow!("no builder named {name:?} in the snapshot"))?;
        return Ok((status.name.clone(), status.built_revision));
    }
    let red: Vec<_> = statuses.iter().filter(|status| !status.is_green).collect();
    eprintln!("{} failing", pluralize(red.len(), "builder"));
    for status in &red {
        eprintln!("  {}", status.name);
    }
    let first = red.first().ok_or_else(|| {
        anyhow!("every builder is green; pass --builder to diagnose one anyway")
    })?;
    eprintln!("Diagnosing {}", first.name);
    Ok((first.name.clone(), first.built_revision))
}

fn print_walk(context: &ReportContext, outcome: &ExplainOutcome) -> Result<()> {
    println!("Starting at {}", outcome.start.revision);
    for event in outcome.events() {
        match event {
            WalkEvent::Note(note) => println!("{note}"),
            WalkEvent::Explained(transition) => {
                println!("{transition}");
                println!("Suspect revisions:");
                print_blame_blocks(&context.snapshot, &transition.suspects)?;
            }
        }
    }
    Ok(())
}
