//! Classify HTTP status, curl errors and task errors into backoff kinds.

use crate::executor::TaskError;
use crate::fetch::FetchError;
use crate::retry::policy::ErrorKind;

/// Classify an HTTP status code.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code as u16),
        _ => ErrorKind::Other,
    }
}

/// Classify a curl error.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
    {
        return ErrorKind::Connection;
    }
    ErrorKind::Other
}

/// Classify a failed attempt.
pub fn classify(e: &TaskError) -> ErrorKind {
    match e {
        TaskError::Transfer(FetchError::Curl(ce)) => classify_curl_error(ce),
        TaskError::Transfer(FetchError::Http(code)) => classify_http_status(*code),
        TaskError::Transfer(FetchError::PartialTransfer { .. }) => ErrorKind::Connection,
        TaskError::Transfer(FetchError::Sink(_)) | TaskError::Write { .. } => ErrorKind::Storage,
    }
}
