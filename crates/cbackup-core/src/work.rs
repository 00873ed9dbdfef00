//! Work items: the unit consumed by the worker pool.

use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkKind {
    Download,
    WriteBuffer,
}

impl fmt::Display for WorkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkKind::Download => f.write_str("download"),
            WorkKind::WriteBuffer => f.write_str("write"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Remote resource streamed to the destination.
    Download { url: String },
    /// Bytes already in memory, written as-is.
    WriteBuffer { contents: Vec<u8> },
}

/// One destination file and how to produce it. Immutable once enqueued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    destination: PathBuf,
    payload: Payload,
}

impl WorkItem {
    pub fn download(destination: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            payload: Payload::Download { url: url.into() },
        }
    }

    pub fn write_buffer(destination: impl Into<PathBuf>, contents: Vec<u8>) -> Self {
        Self {
            destination: destination.into(),
            payload: Payload::WriteBuffer { contents },
        }
    }

    pub fn kind(&self) -> WorkKind {
        match self.payload {
            Payload::Download { .. } => WorkKind::Download,
            Payload::WriteBuffer { .. } => WorkKind::WriteBuffer,
        }
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            Payload::Download { url } => {
                write!(f, "{} {} <- {}", self.kind(), self.destination.display(), url)
            }
            Payload::WriteBuffer { contents } => write!(
                f,
                "{} {} ({} bytes)",
                self.kind(),
                self.destination.display(),
                contents.len()
            ),
        }
    }
}
