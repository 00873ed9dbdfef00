//! Where courses and their curricula come from.
//!
//! The only built-in source is a JSON export on disk. A file holds either one
//! export object or an array of them.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::{Course, Curriculum};

/// A course together with its full curriculum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseExport {
    pub course: Course,
    #[serde(default)]
    pub curriculum: Curriculum,
}

/// Anything that can produce course exports.
pub trait CurriculumSource {
    fn load(&self) -> Result<Vec<CourseExport>>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ExportFile {
    One(CourseExport),
    Many(Vec<CourseExport>),
}

/// JSON course export file.
#[derive(Debug, Clone)]
pub struct JsonCourseFile {
    path: PathBuf,
}

impl JsonCourseFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CurriculumSource for JsonCourseFile {
    fn load(&self) -> Result<Vec<CourseExport>> {
        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read course file {}", self.path.display()))?;
        let parsed: ExportFile = serde_json::from_str(&data)
            .with_context(|| format!("invalid course file {}", self.path.display()))?;
        let exports = match parsed {
            ExportFile::One(e) => vec![e],
            ExportFile::Many(v) => v,
        };
        tracing::debug!(
            path = %self.path.display(),
            courses = exports.len(),
            "loaded course file"
        );
        Ok(exports)
    }
}

/// Load every source in order, concatenating their courses.
pub fn load_all<S: CurriculumSource>(sources: &[S]) -> Result<Vec<CourseExport>> {
    let mut all = Vec::new();
    for source in sources {
        all.extend(source.load()?);
    }
    Ok(all)
}
