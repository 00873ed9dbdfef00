//! `cbackup plan` – print what a backup would do.

use anyhow::Result;
use cbackup_core::backup::plan_only;
use cbackup_core::config::BackupConfig;
use std::path::PathBuf;

use super::load_courses;

pub fn run_plan(cfg: &BackupConfig, files: &[PathBuf]) -> Result<()> {
    let courses = load_courses(files)?;
    let plans = plan_only(&courses, &cfg.run_config())?;

    for (export, plan) in courses.iter().zip(&plans) {
        println!("{} ({})", export.course.title, plan.course_dir.display());
        for dir in plan.directories.iter() {
            println!("  dir      {}", dir.display());
        }
        for item in &plan.items {
            println!(
                "  {:<8} {}",
                item.kind().to_string(),
                item.destination().display()
            );
        }
        println!(
            "  {} director(ies), {} item(s)",
            plan.directories.len(),
            plan.items.len()
        );
    }
    Ok(())
}
