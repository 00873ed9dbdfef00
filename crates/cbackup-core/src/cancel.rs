//! Run-wide cancellation: a shared flag plus a broadcast-once wakeup.
//!
//! The flag answers "are we cancelled?" cheaply at retry boundaries. The
//! wakeup lets blocked queue operations return: the token owns the only
//! sender of a channel that never carries a message, and cancelling drops
//! it, which makes every `recv` on [`CancelToken::signal`] ready at once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crossbeam_channel::{bounded, select, Receiver, Sender};
use thiserror::Error;

/// Returned to a producer whose `enqueue` lost the race with cancellation.
/// Not a failure of the work itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("run cancelled")]
pub struct Cancelled;

struct Inner {
    cancelled: AtomicBool,
    trigger: Mutex<Option<Sender<()>>>,
}

/// Cloneable handle; all clones observe the same cancellation.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
    signal: Receiver<()>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                trigger: Mutex::new(Some(tx)),
            }),
            signal: rx,
        }
    }

    /// Cancel the run. Returns `true` only for the caller that actually flipped the flag.
    pub fn cancel(&self) -> bool {
        if self.inner.cancelled.swap(true, Ordering::AcqRel) {
            return false;
        }
        let trigger = self
            .inner
            .trigger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(trigger);
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Becomes ready (disconnected) once the token is cancelled. Use in `select!`.
    pub fn signal(&self) -> &Receiver<()> {
        &self.signal
    }

    /// Sleep for `delay` unless cancelled first. Returns `false` if cancelled.
    pub fn sleep(&self, delay: Duration) -> bool {
        if self.is_cancelled() {
            return false;
        }
        if delay.is_zero() {
            return true;
        }
        select! {
            recv(self.signal) -> _ => false,
            default(delay) => !self.is_cancelled(),
        }
    }
}
