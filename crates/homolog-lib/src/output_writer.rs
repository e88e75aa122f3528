//! Append-only edge output
//!
//! One writer outlives every genome pair of a run. Lines are appended
//! whole under an internal mutex, so concurrent column tasks may interleave
//! lines in any order but never interleave within a line.

use crate::constants::OUTPUT_EXTENSION;
use crate::similarity::Score;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Thread-safe line writer over a `.net` file opened in append mode
#[derive(Debug)]
pub struct OutputWriter {
    inner: Mutex<BufWriter<File>>,
    path: PathBuf,
    lines_written: AtomicU64,
}

impl OutputWriter {
    /// Open `<prefix>.net` for appending, creating it if missing
    ///
    /// The extension is appended to the prefix as given, never substituted.
    pub fn create(prefix: &Path) -> io::Result<Self> {
        let mut name = OsString::from(prefix.as_os_str());
        name.push(".");
        name.push(OUTPUT_EXTENSION);
        let path = PathBuf::from(name);

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            inner: Mutex::new(BufWriter::new(file)),
            path,
            lines_written: AtomicU64::new(0),
        })
    }

    /// Path of the output file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one BBH edge as `row,col,score`
    ///
    /// The line is written atomically with respect to concurrent calls. On
    /// failure the line is lost; callers log and continue.
    pub fn write_edge(&self, row_position: u64, col_position: u64, score: Score) -> io::Result<()> {
        let mut out = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(out, "{row_position},{col_position},{score}")?;
        self.lines_written.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Number of edges successfully written so far
    pub fn lines_written(&self) -> u64 {
        self.lines_written.load(Ordering::Relaxed)
    }

    /// Flush buffered lines to the file
    pub fn flush(&self) -> io::Result<()> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush()
    }
}

impl Drop for OutputWriter {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!("failed to flush output file {:?}: {e}", self.path);
        }
    }
}
