//! Deterministic local paths for courses, chapters and lectures.
//!
//! Every function here is pure: same inputs, same path. No I/O.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::{Chapter, Course, Lecture};

/// Stand-in for `/` and `\` in titles. Looks like a separator, is not one.
const SEPARATOR_STANDIN: char = '|';

/// Stand-in for `:`, which some filesystems reject.
const COLON_STANDIN: &str = " - ";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid course URL {url:?}: no slug in second path segment")]
pub struct InvalidCourseUrl {
    pub url: String,
}

/// Makes a title usable as a single path component.
///
/// - Replaces `/` and `\` with `|`
/// - Replaces `:` with ` - `
///
/// Everything else passes through unchanged.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '/' | '\\' => out.push(SEPARATOR_STANDIN),
            ':' => out.push_str(COLON_STANDIN),
            _ => out.push(c),
        }
    }
    out
}

/// Second `/`-separated segment of the course URL (`/my-course/` → `my-course`).
pub fn course_slug(course: &Course) -> Result<&str, InvalidCourseUrl> {
    match course.url.split('/').nth(1) {
        Some(slug) if !slug.is_empty() => Ok(slug),
        _ => Err(InvalidCourseUrl {
            url: course.url.clone(),
        }),
    }
}

pub fn course_dir(root: &Path, course: &Course) -> Result<PathBuf, InvalidCourseUrl> {
    Ok(root.join(sanitize(course_slug(course)?)))
}

/// Directory holding a chapter's lectures, or the course directory for flat courses.
pub fn chapter_dir(
    root: &Path,
    course: &Course,
    chapter: Option<&Chapter>,
) -> Result<PathBuf, InvalidCourseUrl> {
    let base = course_dir(root, course)?;
    Ok(match chapter {
        Some(c) => base.join(format!("{}. {}", c.index, sanitize(&c.title))),
        None => base,
    })
}

/// `"<index>. <title>"`, sanitized. Used as the file stem of the lecture video
/// and as the name of the lecture's assets directory.
pub fn lecture_prefix(lecture: &Lecture) -> String {
    sanitize(&format!("{}. {}", lecture.index, lecture.title))
}

pub fn lecture_assets_dir(
    root: &Path,
    course: &Course,
    chapter: Option<&Chapter>,
    lecture: &Lecture,
) -> Result<PathBuf, InvalidCourseUrl> {
    Ok(chapter_dir(root, course, chapter)?.join(lecture_prefix(lecture)))
}
