//! CLI command handlers, one file per command.

mod backup;
mod config;
mod plan;

pub use backup::run_backup;
pub use config::run_show_config;
pub use plan::run_plan;

use anyhow::{bail, Result};
use cbackup_core::source::{self, CourseExport, JsonCourseFile};
use std::path::PathBuf;

/// Load all course files in command-line order.
fn load_courses(files: &[PathBuf]) -> Result<Vec<CourseExport>> {
    let sources: Vec<JsonCourseFile> = files.iter().map(JsonCourseFile::new).collect();
    let courses = source::load_all(&sources)?;
    if courses.is_empty() {
        bail!("no courses found in {} file(s)", files.len());
    }
    Ok(courses)
}
