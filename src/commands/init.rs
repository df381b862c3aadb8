//! `init`: write the config stub so later runs can leave the flags off.

use crate::cli::InitArgs;
use crate::config::{self, default_config};
use anyhow::{anyhow, Result};

pub fn run(args: &InitArgs) -> Result<()> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => config::default_config_path()?,
    };
    if path.is_file() && !args.force {
        return Err(anyhow!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        ));
    }
    config::write_config(&path, &default_config())?;
    eprintln!("wrote {}", path.display());
    Ok(())
}
