//! Remote content source.
//!
//! The executor only depends on [`Fetcher`]; [`CurlFetcher`] is the libcurl
//! implementation used by the CLI.

mod easy;

pub use easy::CurlFetcher;

use std::io::{self, Write};
use thiserror::Error;

/// Failure of a single transfer attempt.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Curl reported an error (timeout, connection, etc.).
    #[error(transparent)]
    Curl(#[from] curl::Error),
    /// HTTP response had a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Fewer bytes arrived than the server announced.
    #[error("partial transfer: expected {expected} bytes, got {received}")]
    PartialTransfer { expected: u64, received: u64 },
    /// The local sink rejected the bytes (disk full, permission denied, ...).
    #[error("sink: {0}")]
    Sink(#[source] io::Error),
}

/// Streams a remote resource into a sink.
pub trait Fetcher {
    /// Writes the body of `url` to `sink`, returning the number of bytes written.
    /// Any non-success status is an error.
    fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64, FetchError>;
}

impl<F: Fetcher + ?Sized> Fetcher for &F {
    fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64, FetchError> {
        (**self).fetch(url, sink)
    }
}
