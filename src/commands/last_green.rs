use super::load_context;
use crate::cli::LastGreenArgs;
use crate::source::BuildSource;
use anyhow::Result;

/// `last-green`: the newest revision where every core builder was green.
pub fn run(args: &LastGreenArgs) -> Result<()> {
    let context = load_context(&args.source)?;
    match context.snapshot.last_green_revision()? {
        Some(revision) => println!("{revision}"),
        None => println!("unknown"),
    }
    Ok(())
}
