//! Performs one work item's side effect on the filesystem.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::fetch::{FetchError, Fetcher};
use crate::storage::{self, TempFile};
use crate::work::{Payload, WorkItem};

/// Failure of one execution attempt. Both variants are retried by the pool.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("transfer failed: {0}")]
    Transfer(#[from] FetchError),
    #[error("write to {} failed: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TaskError {
    fn write(path: &Path, source: io::Error) -> Self {
        TaskError::Write {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// What an attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Downloaded { bytes: u64 },
    Written { bytes: u64 },
    /// Destination already existed and the run resumes.
    Skipped,
}

/// Runs one attempt of a work item. Implementations are shared by all workers.
pub trait Executor {
    fn execute(&self, item: &WorkItem) -> Result<Outcome, TaskError>;
}

/// Writes work items below their destination paths, staging downloads in `.tmp` files.
#[derive(Debug, Clone)]
pub struct FsExecutor<F> {
    fetcher: F,
    resume: bool,
}

impl<F: Fetcher> FsExecutor<F> {
    /// With `resume` set, items whose destination already exists are skipped.
    pub fn new(fetcher: F, resume: bool) -> Self {
        Self { fetcher, resume }
    }

    fn download(&self, url: &str, destination: &Path) -> Result<Outcome, TaskError> {
        let tp = storage::temp_path(destination);
        let mut file = TempFile::create(&tp).map_err(|e| TaskError::write(&tp, e))?;

        let bytes = match self.fetcher.fetch(url, &mut file) {
            Ok(n) => n,
            Err(FetchError::Sink(e)) => {
                file.discard();
                return Err(TaskError::write(&tp, e));
            }
            Err(e) => {
                file.discard();
                return Err(e.into());
            }
        };

        if let Err(e) = file.sync() {
            file.discard();
            return Err(TaskError::write(&tp, e));
        }
        if let Err(e) = file.finalize(destination) {
            let _ = std::fs::remove_file(&tp);
            return Err(TaskError::write(destination, e));
        }
        Ok(Outcome::Downloaded { bytes })
    }
}

impl<F: Fetcher> Executor for FsExecutor<F> {
    fn execute(&self, item: &WorkItem) -> Result<Outcome, TaskError> {
        let destination = item.destination();
        if self.resume && destination.exists() {
            tracing::debug!(path = %destination.display(), "exists, skipping");
            return Ok(Outcome::Skipped);
        }

        match item.payload() {
            Payload::Download { url } => self.download(url, destination),
            Payload::WriteBuffer { contents } => {
                std::fs::write(destination, contents)
                    .map_err(|e| TaskError::write(destination, e))?;
                Ok(Outcome::Written {
                    bytes: contents.len() as u64,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests;
