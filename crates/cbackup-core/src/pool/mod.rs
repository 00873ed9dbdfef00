//! Fixed-size worker pool fed by a bounded queue.
//!
//! One [`Producer`] (cloneable) pushes [`WorkItem`]s; `size` worker threads
//! pull them and run each through the retry loop. The queue holds at most
//! `size` items, so a slow pool throttles the producer. The first item that
//! exhausts its attempts records its error and cancels the whole run: blocked
//! producers and idle workers wake up, in-flight attempts finish, and nothing
//! new is started.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use crossbeam_channel::{bounded, select, Receiver, Sender};
use thiserror::Error;

use crate::cancel::{CancelToken, Cancelled};
use crate::executor::{Executor, Outcome, TaskError};
use crate::plan::PlanError;
use crate::retry::{run_with_retry, Retried, RetryPolicy};
use crate::work::WorkItem;

/// Why a run stopped early. Only the first one observed is reported.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("planning failed: {0}")]
    Plan(#[from] PlanError),
    #[error("{} failed after {attempts} attempt(s): {source}", destination.display())]
    Task {
        destination: PathBuf,
        attempts: u32,
        #[source]
        source: TaskError,
    },
    #[error("failed to start worker thread: {0}")]
    Spawn(#[source] std::io::Error),
    /// Cancelled from outside (e.g. Ctrl-C) with no failure recorded.
    #[error("run cancelled")]
    Cancelled,
}

/// Totals for a run that completed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub downloaded: u64,
    pub written: u64,
    pub skipped: u64,
    /// Bytes published by downloads and buffer writes.
    pub bytes: u64,
    /// Attempts beyond the first, across all items.
    pub retried_attempts: u64,
}

#[derive(Default)]
struct Counters {
    downloaded: AtomicU64,
    written: AtomicU64,
    skipped: AtomicU64,
    bytes: AtomicU64,
    retried_attempts: AtomicU64,
}

impl Counters {
    fn record(&self, outcome: Outcome, attempts: u32) {
        self.retried_attempts
            .fetch_add(u64::from(attempts.saturating_sub(1)), Ordering::Relaxed);
        match outcome {
            Outcome::Downloaded { bytes } => {
                self.downloaded.fetch_add(1, Ordering::Relaxed);
                self.bytes.fetch_add(bytes, Ordering::Relaxed);
            }
            Outcome::Written { bytes } => {
                self.written.fetch_add(1, Ordering::Relaxed);
                self.bytes.fetch_add(bytes, Ordering::Relaxed);
            }
            Outcome::Skipped => {
                self.skipped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn summary(&self) -> RunSummary {
        RunSummary {
            downloaded: self.downloaded.load(Ordering::Relaxed),
            written: self.written.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
            retried_attempts: self.retried_attempts.load(Ordering::Relaxed),
        }
    }
}

/// State shared by the pool and every producer handle.
struct Shared {
    cancel: CancelToken,
    first_error: Mutex<Option<RunError>>,
}

impl Shared {
    /// Keep `err` only if nothing was recorded yet, then cancel.
    fn fail(&self, err: RunError) {
        {
            let mut slot = self
                .first_error
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if slot.is_none() {
                *slot = Some(err);
            } else {
                tracing::debug!("discarding later error: {}", err);
            }
        }
        self.cancel.cancel();
    }

    fn take_error(&self) -> Option<RunError> {
        self.first_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// Sending half of the pool queue. Dropping every clone (or calling
/// [`Producer::close`]) lets workers drain the queue and exit.
#[derive(Clone)]
pub struct Producer {
    tx: Sender<WorkItem>,
    shared: Arc<Shared>,
}

impl Producer {
    /// Block until the queue accepts `item` or the run is cancelled.
    /// On cancellation the item is dropped and `Cancelled` is returned.
    pub fn enqueue(&self, item: WorkItem) -> Result<(), Cancelled> {
        if self.shared.cancel.is_cancelled() {
            return Err(Cancelled);
        }
        select! {
            send(self.tx, item) -> res => res.map_err(|_| Cancelled),
            recv(self.shared.cancel.signal()) -> _ => Err(Cancelled),
        }
    }

    /// Record a producer-side fatal error (e.g. planning failed) and cancel the run.
    /// Ignored if a worker already failed.
    pub fn fail(&self, err: impl Into<RunError>) {
        self.shared.fail(err.into());
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    /// No more items from this handle.
    pub fn close(self) {}
}

pub struct WorkerPool {
    size: usize,
    policy: RetryPolicy,
    rx: Receiver<WorkItem>,
    shared: Arc<Shared>,
}

impl WorkerPool {
    /// Pool of `size` workers (at least one) with its producer handle.
    pub fn new(size: usize, policy: RetryPolicy) -> (Self, Producer) {
        Self::with_cancel(size, policy, CancelToken::new())
    }

    /// Like [`WorkerPool::new`], observing an externally owned token.
    pub fn with_cancel(size: usize, policy: RetryPolicy, cancel: CancelToken) -> (Self, Producer) {
        let size = size.max(1);
        let (tx, rx) = bounded(size);
        let shared = Arc::new(Shared {
            cancel,
            first_error: Mutex::new(None),
        });
        let producer = Producer {
            tx,
            shared: Arc::clone(&shared),
        };
        (
            Self {
                size,
                policy,
                rx,
                shared,
            },
            producer,
        )
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.shared.cancel
    }

    /// Run workers until the queue is closed and drained, or the run is cancelled.
    ///
    /// Returns the first recorded error; [`RunError::Cancelled`] if the token
    /// was cancelled with no error recorded. Every producer handle must be
    /// closed from another thread (or before calling) for this to return.
    pub fn run<E>(self, executor: &E) -> Result<RunSummary, RunError>
    where
        E: Executor + Sync + ?Sized,
    {
        let counters = Counters::default();
        tracing::debug!(workers = self.size, "starting worker pool");

        thread::scope(|s| {
            for id in 0..self.size {
                let spawned = thread::Builder::new()
                    .name(format!("worker-{}", id))
                    .spawn_scoped(s, || self.worker(executor, &counters));
                if let Err(e) = spawned {
                    tracing::error!("failed to spawn worker {}: {}", id, e);
                    self.shared.fail(RunError::Spawn(e));
                    break;
                }
            }
        });

        if let Some(err) = self.shared.take_error() {
            return Err(err);
        }
        if self.shared.cancel.is_cancelled() {
            return Err(RunError::Cancelled);
        }
        let summary = counters.summary();
        tracing::debug!(?summary, "worker pool finished");
        Ok(summary)
    }

    fn worker<E>(&self, executor: &E, counters: &Counters)
    where
        E: Executor + Sync + ?Sized,
    {
        let cancel = &self.shared.cancel;
        loop {
            if cancel.is_cancelled() {
                break;
            }
            let item = select! {
                recv(self.rx) -> msg => match msg {
                    Ok(item) => item,
                    // Closed and empty.
                    Err(_) => break,
                },
                recv(cancel.signal()) -> _ => break,
            };
            // Both arms can be ready at once; never start work after cancellation.
            if cancel.is_cancelled() {
                break;
            }

            tracing::trace!("{}", item);
            let result = run_with_retry(&self.policy, cancel, |attempt| {
                if attempt > 1 {
                    tracing::debug!(attempt, path = %item.destination().display(), "retrying");
                }
                executor.execute(&item)
            });
            match result {
                Retried::Done { value, attempts } => counters.record(value, attempts),
                Retried::Failed { error, attempts } => {
                    tracing::error!(
                        path = %item.destination().display(),
                        attempts,
                        "giving up: {}",
                        error
                    );
                    self.shared.fail(RunError::Task {
                        destination: item.destination().to_path_buf(),
                        attempts,
                        source: error,
                    });
                    break;
                }
                Retried::Cancelled { attempts } => {
                    tracing::debug!(
                        path = %item.destination().display(),
                        attempts,
                        "abandoned after cancellation"
                    );
                    break;
                }
            }
        }
    }
}
