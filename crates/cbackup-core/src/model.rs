//! Course, curriculum and asset types.
//!
//! Everything here is built once from the curriculum source and stays
//! read-only for the rest of the run.

use serde::{Deserialize, Serialize};

/// A course as described by the curriculum source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: u64,
    pub title: String,
    /// Relative course URL, e.g. `/rust-for-beginners/`.
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: u64,
    pub title: String,
    /// 1-based position among the course's chapters.
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lecture {
    pub id: u64,
    pub title: String,
    /// 1-based position among the course's lectures.
    pub index: u32,
    /// Primary asset parts: video variants and captions.
    #[serde(default)]
    pub assets: Vec<Asset>,
    /// Supplementary resources: downloadable files and external links.
    #[serde(default)]
    pub supplementary: Vec<Asset>,
}

impl Lecture {
    pub fn videos(&self) -> impl Iterator<Item = &Asset> {
        self.assets
            .iter()
            .filter(|a| matches!(a, Asset::Video { .. }))
    }

    pub fn captions(&self) -> impl Iterator<Item = &Asset> {
        self.assets
            .iter()
            .filter(|a| matches!(a, Asset::Caption { .. }))
    }
}

/// One downloadable (or linkable) piece of lecture content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Asset {
    Video {
        /// MIME type, e.g. `video/mp4`.
        mime: String,
        /// Resolution label, e.g. `720`.
        label: String,
        url: String,
    },
    File {
        /// File name used on disk.
        label: String,
        url: String,
    },
    Caption {
        /// Original file name; only its extension is used.
        file_name: String,
        locale: String,
        url: String,
    },
    ExternalLink {
        title: String,
        url: String,
    },
}

/// A node of the curriculum, in API order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CurriculumNode {
    Chapter(Chapter),
    Lecture(Lecture),
}

/// Ordered chapters interleaved with lectures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Curriculum {
    pub nodes: Vec<CurriculumNode>,
}

impl Curriculum {
    pub fn new(nodes: Vec<CurriculumNode>) -> Self {
        Self { nodes }
    }

    pub fn lecture_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, CurriculumNode::Lecture(_)))
            .count()
    }
}
