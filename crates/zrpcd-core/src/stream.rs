//! The stream subsystem (§4.5): out-of-band bulk transfer through named
//! FIFOs while the request/response channel carries only metadata.
//!
//! FIFO lifecycle grounded in §3's "unlink-if-present -> mkfifo(0600) ->
//! notification emitted -> helper opens and transfers -> handler's `exec`
//! returns -> FIFO unlinked", using `nix::unistd::mkfifo` the way
//! `alfredjeanlab-claudeless`'s `capsh` crate reaches for `nix` for
//! low-level POSIX file/process operations. The cooperative
//! progress/ready-flag polling alongside a blocking transfer echoes the
//! cancel-safe concurrent-read-loop style in
//! `other_examples/.../devolutions-gateway mcp-proxy`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use nix::sys::stat::Mode;
use nix::unistd::{mkfifo, Uid};
use tokio::time::Instant;

use crate::output::OutputSink;
use crate::protocol::Notification;
use crate::shmem::SharedMemoryView;

const POLL_INTERVAL: Duration = Duration::from_millis(500);
const READY_WAIT_INITIAL_BACKOFF: Duration = Duration::from_millis(10);
const READY_WAIT_MAX_BACKOFF: Duration = Duration::from_millis(250);
const READY_WAIT_TOTAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Derives FIFO paths and owns their create/remove lifecycle for one daemon
/// process (§3 FIFO path: deterministic from temp_dir/euid/pid/stream_id).
pub struct StreamManager {
    temp_dir: PathBuf,
    euid: u32,
    pid: u32,
}

impl StreamManager {
    pub fn new() -> Self {
        Self {
            temp_dir: std::env::temp_dir(),
            euid: Uid::effective().as_raw(),
            pid: std::process::id(),
        }
    }

    pub fn fifo_path(&self, stream_id: u64) -> PathBuf {
        self.temp_dir.join(format!(
            "zowe-native-proto_{}-{}-{}_fifo",
            self.euid, self.pid, stream_id
        ))
    }

    /// Unlinks any stale file at the target path (absence is not an error)
    /// then creates the FIFO with mode 0600.
    pub fn create_fifo(&self, stream_id: u64) -> std::io::Result<PathBuf> {
        let path = self.fifo_path(stream_id);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        mkfifo(&path, Mode::from_bits_truncate(0o600))
            .map_err(|errno| std::io::Error::from_raw_os_error(errno as i32))?;
        Ok(path)
    }

    pub fn remove_fifo(&self, path: &Path) {
        let _ = std::fs::remove_file(path);
    }
}

impl Default for StreamManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs alongside a blocking `exec`, emitting `updateProgress` notifications
/// from `shmem.progress()` every ~500ms. Intended to be raced against the
/// `exec` future with `tokio::select!`; the `exec` return is the implicit
/// join the cooperative scheduling model relies on (§4.5, §5).
pub async fn poll_progress_forever(output: &OutputSink, shmem: &SharedMemoryView, stream_id: u64) {
    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    loop {
        ticker.tick().await;
        let progress = shmem.progress();
        let _ = output.emit(&Notification::update_progress(stream_id, progress));
    }
}

/// Waits for `shmem.ready_flag()` to transition non-zero, using exponential
/// backoff capped at 250ms and a 10s total timeout (§4.5 step 6). Returns
/// the published `content_length` and resets the flag, or `None` on
/// timeout — the caller still emits the `receiveStream` notification, just
/// without `contentLen`, and the operation continues.
pub async fn wait_for_ready_flag(shmem: &SharedMemoryView) -> Option<i64> {
    let deadline = Instant::now() + READY_WAIT_TOTAL_TIMEOUT;
    let mut backoff = READY_WAIT_INITIAL_BACKOFF;

    loop {
        if shmem.ready_flag() != 0 {
            let content_length = shmem.content_length();
            shmem.reset_ready_flag();
            return Some(content_length);
        }
        if Instant::now() >= deadline {
            return None;
        }
        tokio::time::sleep(backoff).await;
        backoff = std::cmp::min(backoff * 2, READY_WAIT_MAX_BACKOFF);
    }
}

/// Parses the helper's small "key: value" metadata block emitted after a
/// streamed transfer (`etag`, `size`, `created`, ...). Per §9's resolved
/// open question, this YAML-map form is authoritative for `readFile`'s
/// streaming metadata, matching the write path.
pub fn parse_metadata_block(text: &str) -> std::collections::BTreeMap<String, String> {
    text.lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_path_matches_expected_pattern() {
        let mgr = StreamManager {
            temp_dir: PathBuf::from("/tmp"),
            euid: 501,
            pid: 4242,
        };
        let path = mgr.fifo_path(42);
        assert_eq!(
            path,
            PathBuf::from("/tmp/zowe-native-proto_501-4242-42_fifo")
        );
    }

    #[test]
    fn create_and_remove_fifo_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = StreamManager {
            temp_dir: dir.path().to_path_buf(),
            euid: Uid::effective().as_raw(),
            pid: std::process::id(),
        };
        let path = mgr.create_fifo(7).unwrap();
        assert!(path.exists());
        mgr.remove_fifo(&path);
        assert!(!path.exists());
    }

    #[test]
    fn metadata_block_parses_key_value_lines() {
        let parsed = parse_metadata_block("etag: abc123\nsize: 42\ncreated: 2024-01-01\n");
        assert_eq!(parsed.get("etag"), Some(&"abc123".to_string()));
        assert_eq!(parsed.get("size"), Some(&"42".to_string()));
    }
}
