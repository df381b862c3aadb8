use super::load_context;
use crate::blame::revisions_causing_failures;
use crate::cli::WhoBrokeItArgs;
use anyhow::Result;

/// `who-broke-it`: every suspect revision across the red builders, with the
/// builders it appears to have broken.
pub fn run(args: &WhoBrokeItArgs) -> Result<()> {
    let context = load_context(&args.source)?;
    let by_revision =
        revisions_causing_failures(&context.snapshot, context.config.look_back_limit)?;
    for (revision, builders) in by_revision {
        println!(
            "{revision} appears to have broken {}",
            builders.join(", ")
        );
    }
    Ok(())
}
