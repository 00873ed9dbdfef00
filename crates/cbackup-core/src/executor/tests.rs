use super::*;
use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Serves bodies from memory. `interrupt_after` simulates a connection dropping mid-body.
#[derive(Default)]
struct MemoryFetcher {
    bodies: HashMap<String, Vec<u8>>,
    interrupt_after: Option<usize>,
    calls: AtomicUsize,
}

impl MemoryFetcher {
    fn with(url: &str, body: &[u8]) -> Self {
        let mut bodies = HashMap::new();
        bodies.insert(url.to_string(), body.to_vec());
        Self {
            bodies,
            ..Default::default()
        }
    }
}

impl Fetcher for MemoryFetcher {
    fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let body = self.bodies.get(url).ok_or(FetchError::Http(404))?;
        if let Some(n) = self.interrupt_after {
            sink.write_all(&body[..n]).map_err(FetchError::Sink)?;
            return Err(FetchError::PartialTransfer {
                expected: body.len() as u64,
                received: n as u64,
            });
        }
        sink.write_all(body).map_err(FetchError::Sink)?;
        Ok(body.len() as u64)
    }
}

#[test]
fn download_publishes_complete_file() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("1. Intro.mp4");
    let exec = FsExecutor::new(MemoryFetcher::with("u", b"video-bytes"), false);

    let outcome = exec.execute(&WorkItem::download(&dest, "u")).unwrap();

    assert_eq!(outcome, Outcome::Downloaded { bytes: 11 });
    assert_eq!(std::fs::read(&dest).unwrap(), b"video-bytes");
    assert!(!storage::temp_path(&dest).exists());
}

#[test]
fn interrupted_download_never_creates_destination() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("big.mp4");
    let mut fetcher = MemoryFetcher::with("u", &[7u8; 4096]);
    fetcher.interrupt_after = Some(1000);
    let exec = FsExecutor::new(fetcher, false);

    let err = exec.execute(&WorkItem::download(&dest, "u")).unwrap_err();

    assert!(matches!(
        err,
        TaskError::Transfer(FetchError::PartialTransfer {
            expected: 4096,
            received: 1000
        })
    ));
    assert!(!dest.exists());
    assert!(!storage::temp_path(&dest).exists());
}

#[test]
fn failed_download_leaves_existing_destination_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("a.mp4");
    std::fs::write(&dest, b"previous").unwrap();
    let exec = FsExecutor::new(MemoryFetcher::default(), false);

    let err = exec.execute(&WorkItem::download(&dest, "missing")).unwrap_err();

    assert!(matches!(err, TaskError::Transfer(FetchError::Http(404))));
    assert_eq!(std::fs::read(&dest).unwrap(), b"previous");
}

#[test]
fn resume_skips_existing_destination_without_fetching() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("a.mp4");
    std::fs::write(&dest, b"done").unwrap();
    let exec = FsExecutor::new(MemoryFetcher::with("u", b"new"), true);

    assert_eq!(
        exec.execute(&WorkItem::download(&dest, "u")).unwrap(),
        Outcome::Skipped
    );
    assert_eq!(
        exec.execute(&WorkItem::write_buffer(&dest, b"x".to_vec()))
            .unwrap(),
        Outcome::Skipped
    );
    assert_eq!(exec.fetcher.calls.load(Ordering::SeqCst), 0);
    assert_eq!(std::fs::read(&dest).unwrap(), b"done");
}

#[test]
fn without_resume_existing_destination_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("a.mp4");
    std::fs::write(&dest, b"old").unwrap();
    let exec = FsExecutor::new(MemoryFetcher::with("u", b"new"), false);

    exec.execute(&WorkItem::download(&dest, "u")).unwrap();

    assert_eq!(std::fs::read(&dest).unwrap(), b"new");
}

#[test]
fn write_buffer_writes_payload() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("links.txt");
    let exec = FsExecutor::new(MemoryFetcher::default(), false);

    let outcome = exec
        .execute(&WorkItem::write_buffer(&dest, b"Docs\nhttps://docs.rs\n\n".to_vec()))
        .unwrap();

    assert_eq!(outcome, Outcome::Written { bytes: 22 });
    assert_eq!(
        std::fs::read_to_string(&dest).unwrap(),
        "Docs\nhttps://docs.rs\n\n"
    );
}

#[test]
fn write_into_missing_directory_is_write_error() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("missing").join("links.txt");
    let exec = FsExecutor::new(MemoryFetcher::default(), false);

    let err = exec
        .execute(&WorkItem::write_buffer(&dest, b"x".to_vec()))
        .unwrap_err();

    match err {
        TaskError::Write { path, .. } => assert_eq!(path, dest),
        other => panic!("expected write error, got {:?}", other),
    }
}
