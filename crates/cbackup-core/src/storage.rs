//! Temp-file staging and atomic publish.
//!
//! Downloads are streamed into `<destination>.tmp` and renamed into place only
//! once the transfer completed, so a final destination is never partially written.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Path for the temp file: appends `.tmp` to the final path (e.g. `a.mp4` → `a.mp4.tmp`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Buffered writer over a staging file. Either `finalize` or `discard` it.
pub struct TempFile {
    writer: BufWriter<File>,
    temp_path: PathBuf,
}

impl TempFile {
    /// Create a new temp file at `temp_path`. Truncates a leftover from an earlier attempt.
    pub fn create(temp_path: &Path) -> io::Result<Self> {
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(temp_path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            temp_path: temp_path.to_path_buf(),
        })
    }

    /// Flush buffered bytes and sync file data to disk.
    pub fn sync(&mut self) -> io::Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()
    }

    /// Flush, close and atomically rename the temp file to `final_path`.
    /// Fails if `final_path` is on a different filesystem.
    pub fn finalize(self, final_path: &Path) -> io::Result<()> {
        let TempFile {
            mut writer,
            temp_path,
        } = self;
        writer.flush()?;
        drop(writer);
        std::fs::rename(&temp_path, final_path)
    }

    /// Close and remove the temp file. Removal failures are only logged.
    pub fn discard(self) {
        let temp_path = self.temp_path;
        drop(self.writer);
        if let Err(e) = std::fs::remove_file(&temp_path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::debug!(path = %temp_path.display(), "could not remove temp file: {}", e);
            }
        }
    }
}

impl Write for TempFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
