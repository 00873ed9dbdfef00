//! Retry loop: run an attempt until success, budget exhaustion or cancellation.

use super::classify;
use super::policy::{RetryDecision, RetryPolicy};
use crate::cancel::CancelToken;
use crate::executor::TaskError;

/// How a retried operation ended.
#[derive(Debug)]
pub enum Retried<T> {
    Done { value: T, attempts: u32 },
    /// Every attempt failed; carries the last error.
    Failed { error: TaskError, attempts: u32 },
    /// Cancelled at a retry boundary. The last error is discarded.
    Cancelled { attempts: u32 },
}

/// Runs `f` (given the 1-based attempt number) until it succeeds or the policy says to stop.
/// Cancellation is checked between attempts and interrupts the backoff sleep;
/// an attempt already running is never interrupted.
pub fn run_with_retry<T, F>(policy: &RetryPolicy, cancel: &CancelToken, mut f: F) -> Retried<T>
where
    F: FnMut(u32) -> Result<T, TaskError>,
{
    let mut attempt = 1u32;
    loop {
        match f(attempt) {
            Ok(value) => {
                return Retried::Done {
                    value,
                    attempts: attempt,
                }
            }
            Err(e) => {
                let kind = classify::classify(&e);
                match policy.decide(attempt, kind) {
                    RetryDecision::NoRetry => {
                        return Retried::Failed {
                            error: e,
                            attempts: attempt,
                        }
                    }
                    RetryDecision::RetryAfter(d) => {
                        tracing::warn!(
                            attempt,
                            ?kind,
                            delay_ms = d.as_millis() as u64,
                            "attempt failed, retrying: {}",
                            e
                        );
                        if !cancel.sleep(d) {
                            return Retried::Cancelled { attempts: attempt };
                        }
                        attempt += 1;
                    }
                }
            }
        }
    }
}
