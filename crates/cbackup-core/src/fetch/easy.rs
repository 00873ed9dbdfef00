//! Blocking HTTP GET over a libcurl easy handle.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::time::Duration;

use curl::easy::{Easy, List};

use super::{FetchError, Fetcher};
use crate::config::HttpConfig;

/// One easy handle per call, so the fetcher can be shared across worker threads.
#[derive(Debug, Clone)]
pub struct CurlFetcher {
    connect_timeout: Duration,
    timeout: Duration,
    low_speed_limit: u32,
    low_speed_time: Duration,
    headers: BTreeMap<String, String>,
}

impl Default for CurlFetcher {
    fn default() -> Self {
        Self::from_config(&HttpConfig::default())
    }
}

impl CurlFetcher {
    pub fn from_config(http: &HttpConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(http.connect_timeout_secs),
            timeout: Duration::from_secs(http.timeout_secs),
            low_speed_limit: http.low_speed_limit,
            low_speed_time: Duration::from_secs(http.low_speed_time_secs),
            headers: http.headers.clone(),
        }
    }

    fn handle(&self, url: &str) -> Result<Easy, curl::Error> {
        let mut easy = Easy::new();
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(self.connect_timeout)?;
        // Abort if throughput drops below the limit for `low_speed_time`.
        easy.low_speed_limit(self.low_speed_limit)?;
        easy.low_speed_time(self.low_speed_time)?;
        // Lecture videos can be several GiB; the absolute cap only catches stuck transfers.
        easy.timeout(self.timeout)?;

        if !self.headers.is_empty() {
            let mut list = List::new();
            for (k, v) in &self.headers {
                list.append(&format!("{}: {}", k.trim(), v.trim()))?;
            }
            easy.http_headers(list)?;
        }
        Ok(easy)
    }
}

impl Fetcher for CurlFetcher {
    fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64, FetchError> {
        let mut easy = self.handle(url)?;
        let mut received: u64 = 0;
        let mut sink_error: Option<io::Error> = None;

        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| match sink.write_all(data) {
                Ok(()) => {
                    received += data.len() as u64;
                    Ok(data.len())
                }
                Err(e) => {
                    sink_error = Some(e);
                    Ok(0) // abort transfer
                }
            })?;
            let performed = transfer.perform();
            drop(transfer);
            if let Err(e) = performed {
                if e.is_write_error() {
                    if let Some(io_err) = sink_error.take() {
                        return Err(FetchError::Sink(io_err));
                    }
                }
                return Err(FetchError::Curl(e));
            }
        }

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(FetchError::Http(code));
        }

        let announced = easy.content_length_download()?;
        if announced >= 0.0 {
            let expected = announced as u64;
            if received != expected {
                return Err(FetchError::PartialTransfer { expected, received });
            }
        }

        tracing::trace!(url, bytes = received, "transfer complete");
        Ok(received)
    }
}
