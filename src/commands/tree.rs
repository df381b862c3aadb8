use super::load_context;
use crate::cli::TreeArgs;
use crate::source::BuildSource;
use anyhow::Result;

/// `tree`: one `ok`/`FAIL` line per builder, in service order.
pub fn run(args: &TreeArgs) -> Result<()> {
    let context = load_context(&args.source)?;
    for status in context.snapshot.builder_statuses()? {
        let state = if status.is_green { "ok" } else { "FAIL" };
        println!("{state:<4} : {}", status.name);
    }
    Ok(())
}
