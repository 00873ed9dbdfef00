//! Curriculum planning: turn a course tree into directories plus work items.
//!
//! Planning is pure. [`CoursePlan::create_directories`] is the only step that
//! touches the filesystem, and it runs before any of the course's items are
//! handed to the pool.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::RunConfig;
use crate::model::{Asset, Chapter, Course, Curriculum, CurriculumNode, Lecture};
use crate::naming::{self, InvalidCourseUrl};
use crate::work::WorkItem;

/// Only this MIME type is considered when choosing a lecture video.
pub const VIDEO_MIME: &str = "video/mp4";

/// Name of the manifest listing a lecture's external links.
pub const LINKS_FILE: &str = "links.txt";

#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    InvalidCourseUrl(#[from] InvalidCourseUrl),
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Insertion-ordered set of directories, deduplicated by path.
#[derive(Debug, Clone, Default)]
pub struct DirectorySet {
    ordered: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
}

impl DirectorySet {
    /// Returns `false` if the path was already planned.
    pub fn insert(&mut self, path: &Path) -> bool {
        if self.seen.contains(path) {
            return false;
        }
        self.seen.insert(path.to_path_buf());
        self.ordered.push(path.to_path_buf());
        true
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.seen.contains(path)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.ordered.iter().map(PathBuf::as_path)
    }
}

/// Everything needed to mirror one course.
#[derive(Debug, Clone)]
pub struct CoursePlan {
    pub course_dir: PathBuf,
    /// Directories in creation order (parents before children).
    pub directories: DirectorySet,
    /// Work items in curriculum order. Destinations are unique.
    pub items: Vec<WorkItem>,
}

impl CoursePlan {
    /// Create every planned directory (mode 0755 on Unix). Existing ones are fine.
    pub fn create_directories(&self) -> Result<(), PlanError> {
        for dir in self.directories.iter() {
            create_dir(dir).map_err(|source| PlanError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn create_dir(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o755)
        .create(path)
}

#[cfg(not(unix))]
fn create_dir(path: &Path) -> io::Result<()> {
    std::fs::create_dir_all(path)
}

/// Pick the lecture video to download.
///
/// Among `video/mp4` candidates with an integer label: the first whose label
/// equals `resolution` wins when `resolution > 0`; otherwise the highest label.
/// Non-numeric and zero labels are skipped.
pub fn select_video<'a, I>(candidates: I, resolution: u32) -> Option<&'a Asset>
where
    I: IntoIterator<Item = &'a Asset>,
{
    let mut best: Option<(u32, &'a Asset)> = None;
    for asset in candidates {
        let Asset::Video { mime, label, .. } = asset else {
            continue;
        };
        if mime != VIDEO_MIME {
            continue;
        }
        let Ok(res) = label.trim().parse::<u32>() else {
            continue;
        };
        if resolution > 0 && res == resolution {
            return Some(asset);
        }
        if res > best.map_or(0, |(current, _)| current) {
            best = Some((res, asset));
        }
    }
    best.map(|(_, asset)| asset)
}

/// Render `(title, url)` pairs as `title\nurl\n\n` blocks, in order.
pub fn render_links(links: &[(&str, &str)]) -> Vec<u8> {
    let mut out = String::new();
    for (title, url) in links {
        out.push_str(title);
        out.push('\n');
        out.push_str(url);
        out.push_str("\n\n");
    }
    out.into_bytes()
}

struct Planner<'a> {
    root: &'a Path,
    course: &'a Course,
    cfg: &'a RunConfig,
    directories: DirectorySet,
    items: Vec<WorkItem>,
    destinations: HashSet<PathBuf>,
}

impl<'a> Planner<'a> {
    fn push(&mut self, item: WorkItem) {
        if !self.destinations.insert(item.destination().to_path_buf()) {
            tracing::warn!(
                path = %item.destination().display(),
                "two assets map to the same file, keeping the first"
            );
            return;
        }
        self.items.push(item);
    }

    fn lecture(&mut self, chapter: Option<&Chapter>, lecture: &Lecture) -> Result<(), PlanError> {
        let prefix = naming::lecture_prefix(lecture);
        let chapter_dir = naming::chapter_dir(self.root, self.course, chapter)?;
        let assets_dir = naming::lecture_assets_dir(self.root, self.course, chapter, lecture)?;

        let video = select_video(lecture.videos(), self.cfg.resolution);
        if let Some(Asset::Video { url, label, .. }) = video {
            tracing::trace!(lecture = lecture.id, label = %label, "selected video");
            self.push(WorkItem::download(
                chapter_dir.join(format!("{}.mp4", prefix)),
                url.clone(),
            ));
        }

        if self.cfg.subtitles {
            for caption in lecture.captions() {
                let Asset::Caption {
                    file_name,
                    locale,
                    url,
                } = caption
                else {
                    continue;
                };
                self.directories.insert(&assets_dir);
                let name = format!(
                    "{}.{}{}",
                    prefix,
                    naming::sanitize(locale),
                    extension_of(file_name)
                );
                self.push(WorkItem::download(assets_dir.join(name), url.clone()));
            }
        }

        if lecture.supplementary.is_empty() {
            return Ok(());
        }
        self.directories.insert(&assets_dir);

        let mut links: Vec<(&str, &str)> = Vec::new();
        for (position, asset) in lecture.supplementary.iter().enumerate() {
            match asset {
                Asset::File { label, url } => {
                    let name = file_name(label, position + 1);
                    self.push(WorkItem::download(assets_dir.join(name), url.clone()));
                }
                Asset::ExternalLink { title, url } => links.push((title.as_str(), url.as_str())),
                Asset::Video { .. } | Asset::Caption { .. } => {
                    tracing::debug!(lecture = lecture.id, "ignoring media in supplementary assets");
                }
            }
        }
        if !links.is_empty() {
            self.push(WorkItem::write_buffer(
                assets_dir.join(LINKS_FILE),
                render_links(&links),
            ));
        }
        Ok(())
    }
}

/// On-disk name for a supplementary file. Labels that would not name a file
/// inside the assets directory (empty, `.`, `..`) become `file-<position>`.
fn file_name(label: &str, position: usize) -> String {
    let name = naming::sanitize(label);
    if matches!(name.trim(), "" | "." | "..") {
        tracing::warn!(label, position, "unusable file label, using a generated name");
        return format!("file-{}", position);
    }
    name
}

/// `.vtt` for `en_US.vtt`; empty when the name has no extension.
fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}

/// Plan directories and work items for a course, rooted at `cfg.output_dir`.
///
/// Nodes are walked in API order; each lecture belongs to the chapter node
/// seen last before it (none for flat courses). Directories come out parents
/// first: the course, then each chapter as it is reached, then lecture asset
/// directories as lectures need them.
pub fn plan_course(
    course: &Course,
    curriculum: &Curriculum,
    cfg: &RunConfig,
) -> Result<CoursePlan, PlanError> {
    let root = cfg.output_dir.as_path();
    let course_dir = naming::course_dir(root, course)?;

    let mut planner = Planner {
        root,
        course,
        cfg,
        directories: DirectorySet::default(),
        items: Vec::new(),
        destinations: HashSet::new(),
    };
    planner.directories.insert(&course_dir);

    let mut current: Option<&Chapter> = None;
    for node in &curriculum.nodes {
        match node {
            CurriculumNode::Chapter(chapter) => {
                let dir = naming::chapter_dir(root, course, Some(chapter))?;
                planner.directories.insert(&dir);
                current = Some(chapter);
            }
            CurriculumNode::Lecture(lecture) => planner.lecture(current, lecture)?,
        }
    }

    tracing::debug!(
        course = course.id,
        directories = planner.directories.len(),
        items = planner.items.len(),
        "planned course"
    );

    Ok(CoursePlan {
        course_dir,
        directories: planner.directories,
        items: planner.items,
    })
}
