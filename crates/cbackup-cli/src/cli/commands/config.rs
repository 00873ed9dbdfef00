//! `cbackup config` – show where the config lives and what it resolves to.

use anyhow::Result;
use cbackup_core::config::{self, BackupConfig};
use std::path::Path;

pub fn run_show_config(path: &Path, cfg: &BackupConfig) -> Result<()> {
    println!("# {}", path.display());
    print!("{}", config::to_toml(cfg)?);
    Ok(())
}
