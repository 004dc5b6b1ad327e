use crate::config::{CONFIG_FILE, STARTER_CONFIG};
use anyhow::{bail, Result};
use std::path::Path;

/// Writes a starter config into the current directory
pub fn init_config(force: bool) -> Result<()> {
    let path = Path::new(CONFIG_FILE);
    if path.exists() && !force {
        bail!("{CONFIG_FILE} already exists (use --force to overwrite)");
    }
    std::fs::write(path, STARTER_CONFIG)?;
    println!("Wrote {CONFIG_FILE}");
    Ok(())
}
