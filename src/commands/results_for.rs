use super::load_context;
use crate::cli::ResultsForArgs;
use crate::source::BuildSource;
use anyhow::Result;

/// `results-for REVISION`: every builder's failing tests at one revision.
pub fn run(args: &ResultsForArgs) -> Result<()> {
    let context = load_context(&args.source)?;
    for status in context.snapshot.builder_statuses()? {
        println!("{}:", status.name);
        match context
            .snapshot
            .build_for_revision(&status.name, args.revision)?
        {
            None => println!("  (no build)"),
            Some(build) => match build.failing_tests {
                None => println!("  (no results)"),
                Some(failing) if failing.is_empty() => println!("  (no failing tests)"),
                Some(failing) => {
                    for test in failing {
                        println!("  {test}");
                    }
                }
            },
        }
    }
    Ok(())
}
