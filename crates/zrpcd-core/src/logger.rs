//! Structured logging (§4.2, §6 Filesystem): a size-rolling file sink plus a
//! stderr mirror for warnings and above.
//!
//! Built on `tracing` + `tracing-subscriber` the way the donor wires its own
//! diagnostics, but with a hand-rolled rolling writer: no crate in this
//! workspace's dependency pack offers size-triggered rollover, so the
//! truncate-at-threshold policy (§6: 10 MiB) is implemented directly rather
//! than reached for via an unrelated crate.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;

use crate::error::DaemonError;

const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;

struct RollingFileInner {
    path: PathBuf,
    file: Mutex<File>,
}

/// A `tracing_subscriber` writer that truncates and reopens its file once it
/// reaches [`MAX_LOG_BYTES`], instead of rotating to numbered backups.
#[derive(Clone)]
pub struct RollingFileWriter {
    inner: Arc<RollingFileInner>,
}

impl RollingFileWriter {
    pub fn open(path: PathBuf) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            inner: Arc::new(RollingFileInner {
                path,
                file: Mutex::new(file),
            }),
        })
    }
}

pub struct RollingFileGuard<'a> {
    inner: &'a RollingFileInner,
}

impl Write for RollingFileGuard<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut file = self.inner.file.lock().unwrap_or_else(|p| p.into_inner());
        if file.metadata()?.len() >= MAX_LOG_BYTES {
            *file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&self.inner.path)?;
        }
        file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.file.lock().unwrap_or_else(|p| p.into_inner()).flush()
    }
}

impl<'a> MakeWriter<'a> for RollingFileWriter {
    type Writer = RollingFileGuard<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        RollingFileGuard { inner: &self.inner }
    }
}

/// Derives the log file path from the running executable (§6: `<exe_dir>/
/// logs/<exe_basename>.log`).
pub fn default_log_path() -> io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let dir = exe.parent().unwrap_or_else(|| std::path::Path::new("."));
    let stem = exe.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| "zrpcd".into());
    Ok(dir.join("logs").join(format!("{stem}.log")))
}

/// Installs the global subscriber: the rolling file sink at `info` (or
/// `debug` under `--verbose`) plus an unconditional stderr mirror at `warn`
/// and above, so operators watching the foreground process see failures
/// even without tailing the log file.
pub fn init(log_path: PathBuf, verbose: bool) -> Result<(), DaemonError> {
    let writer = RollingFileWriter::open(log_path.clone())
        .map_err(|source| DaemonError::LoggerInit { path: log_path, source })?;
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(tracing_subscriber::filter::LevelFilter::from_level(level));
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_filter(tracing_subscriber::filter::LevelFilter::WARN);

    tracing_subscriber::registry().with(file_layer).with(stderr_layer).init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolling_writer_truncates_past_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.log");
        let writer = RollingFileWriter::open(path.clone()).unwrap();

        {
            let mut guard = writer.make_writer();
            guard.write_all(&vec![b'x'; 100]).unwrap();
        }
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 100);

        {
            let mut file = writer.inner.file.lock().unwrap();
            *file = OpenOptions::new().write(true).open(&path).unwrap();
            file.set_len(MAX_LOG_BYTES).unwrap();
        }

        {
            let mut guard = writer.make_writer();
            guard.write_all(b"next").unwrap();
        }
        let len = std::fs::metadata(&path).unwrap().len();
        assert_eq!(len, 4);
    }
}
