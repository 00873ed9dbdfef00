//! Retry and backoff policy.
//!
//! Every failed attempt is retried until the attempt budget
//! (`retry_count + 1`) is spent. Classification only shapes the backoff
//! delay and the log line; it never shortens the budget.

mod classify;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::{run_with_retry, Retried};
