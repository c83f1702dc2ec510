//! The child-process channel (§4.4) — the hardest piece of the runtime.
//!
//! Owns one helper subprocess: serializes commands to its stdin, parses
//! stdout/stderr/exit-code frames, exposes a blocking `exec(argv) ->
//! (stdout, stderr, exit)` operation. Grounded in the donor's
//! `mcp/jsonrpc.rs` (`spawn_with_subcommand`'s retry-on-busy spawn, split
//! reader/writer tasks) and `original_source/native/golang/utils/stdio.go`
//! (`ExecCmd`/`ExecCmdWithStdin`'s write-argv-line-then-drain protocol).
//!
//! End-of-response convention: a single `\x04` sentinel byte terminates
//! each of stdout and stderr for one command; the stdout sentinel is
//! preceded by a `[<n>]` fragment carrying the helper's exit code for that
//! command (§9: the source shows two conventions, sentinel byte and
//! carriage return; this implementation commits to the sentinel byte).

use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};

use crate::error::{ChannelError, DaemonError};
use crate::platform::{apply_autoconvert, set_fd_autoconvert, AutoConvert};
use crate::process::spawn_with_retry;
use crate::shmem::SharedMemoryView;

const SENTINEL: u8 = 0x04;

/// Output of one `exec` call: stdout with the exit-code suffix and sentinel
/// stripped, and stderr (empty string if the helper wrote nothing).
pub struct ExecOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
}

pub struct ChildChannel {
    #[allow(dead_code)]
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    stderr: BufReader<ChildStderr>,
    last_exit_code: i64,
    shmem: Option<Arc<SharedMemoryView>>,
    pipe_path_prefix: Option<String>,
}

impl ChildChannel {
    /// Spawns the helper in interactive mode, reads its two-line startup
    /// banner, and attempts to map the shared-memory region it advertises.
    /// A mapping failure is logged and tolerated (§4.4): `shmem` stays
    /// `None` and handlers must cope with its absence.
    pub async fn spawn(helper_path: &Path, worker_id: usize) -> Result<Self, DaemonError> {
        let mut command = Command::new(helper_path);
        command
            .arg("--it")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        apply_autoconvert(&mut command, AutoConvert::On);

        let mut child = spawn_with_retry(&mut command, helper_path)?;

        let stdin = child
            .stdin
            .take()
            .ok_or(ChannelError::StdinUnavailable)
            .map_err(|source| DaemonError::ChannelSetup { worker_id, source })?;
        let stdout = child
            .stdout
            .take()
            .ok_or(ChannelError::StdoutUnavailable)
            .map_err(|source| DaemonError::ChannelSetup { worker_id, source })?;
        let stderr = child
            .stderr
            .take()
            .ok_or(ChannelError::StderrUnavailable)
            .map_err(|source| DaemonError::ChannelSetup { worker_id, source })?;

        let mut stdout = BufReader::new(stdout);
        let stderr = BufReader::new(stderr);

        let mut banner_line = String::new();
        let mut shmem_path: Option<PathBuf> = None;
        for _ in 0..2 {
            banner_line.clear();
            let n = stdout
                .read_line(&mut banner_line)
                .await
                .map_err(|_| DaemonError::NoReadyBanner { worker_id })?;
            if n == 0 {
                return Err(DaemonError::NoReadyBanner { worker_id });
            }
            if let Some(rest) = banner_line.trim_end().strip_prefix("Path: ") {
                shmem_path = Some(PathBuf::from(rest));
            }
        }

        let shmem = match &shmem_path {
            Some(path) => match SharedMemoryView::open(path) {
                Ok(view) => Some(Arc::new(view)),
                Err(err) => {
                    tracing::warn!(worker_id, path = %path.display(), error = %err, "failed to map helper shared memory, continuing without progress view");
                    None
                }
            },
            None => {
                tracing::warn!(worker_id, "helper banner did not advertise a shared memory path");
                None
            }
        };

        let pipe_path_prefix = shmem_path
            .as_ref()
            .and_then(|p| p.parent())
            .map(|p| p.display().to_string());

        Ok(Self {
            child,
            stdin,
            stdout,
            stderr,
            last_exit_code: 0,
            shmem,
            pipe_path_prefix,
        })
    }

    pub fn last_exit_code(&self) -> i64 {
        self.last_exit_code
    }

    /// Returns an owned handle to the helper's shared-memory progress view,
    /// if the banner advertised one. Owned rather than borrowed so a
    /// background task polling it (`stream::poll_progress_forever`,
    /// `stream::wait_for_ready_flag`) can hold it independently of the
    /// `&mut self` borrow `exec` needs for the rest of the transfer.
    pub fn shmem(&self) -> Option<Arc<SharedMemoryView>> {
        self.shmem.clone()
    }

    pub fn pipe_path_prefix(&self) -> Option<&str> {
        self.pipe_path_prefix.as_deref()
    }

    /// Issues one command and waits for its complete response. A single
    /// `exec` must complete before the next is issued on the same channel
    /// (§3 invariant); attaching exactly one worker per channel enforces
    /// this structurally, so `&mut self` is sufficient serialization here.
    pub async fn exec(&mut self, argv: &[String]) -> Result<ExecOutput, ChannelError> {
        self.write_command_line(argv).await?;
        self.read_response().await
    }

    /// As `exec`, but streams `payload` to the child's stdin after the
    /// command line as a length-prefixed frame (8 big-endian bytes, then
    /// the raw bytes) with platform auto-convert suspended for the
    /// transfer (§4.4 Stdin-streaming of bulk bytes).
    pub async fn exec_with_stdin_payload(
        &mut self,
        argv: &[String],
        payload: &[u8],
    ) -> Result<ExecOutput, ChannelError> {
        self.write_command_line(argv).await?;

        let fd = self.stdin.as_raw_fd();
        set_fd_autoconvert(fd, AutoConvert::Off);
        let write_result = async {
            self.stdin
                .write_all(&(payload.len() as u64).to_be_bytes())
                .await?;
            self.stdin.write_all(payload).await?;
            self.stdin.flush().await
        }
        .await;
        set_fd_autoconvert(fd, AutoConvert::On);
        write_result?;

        self.read_response().await
    }

    async fn write_command_line(&mut self, argv: &[String]) -> Result<(), ChannelError> {
        let line = format_argv(argv);
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn read_response(&mut self) -> Result<ExecOutput, ChannelError> {
        let (stdout, stderr) = (&mut self.stdout, &mut self.stderr);
        let (stdout_raw, stderr_raw) =
            tokio::try_join!(read_until_sentinel(stdout), read_until_sentinel(stderr))?;

        let (stdout_bytes, exit_code) = split_exit_suffix(&stdout_raw);
        self.last_exit_code = exit_code;

        Ok(ExecOutput {
            stdout: stdout_bytes.to_vec(),
            stderr: String::from_utf8_lossy(&stderr_raw).into_owned(),
        })
    }
}

async fn read_until_sentinel<R: AsyncReadExt + Unpin>(
    reader: &mut R,
) -> Result<Vec<u8>, ChannelError> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Err(ChannelError::ChildGone);
        }
        if let Some(pos) = chunk[..n].iter().position(|&b| b == SENTINEL) {
            buffer.extend_from_slice(&chunk[..pos]);
            return Ok(buffer);
        }
        buffer.extend_from_slice(&chunk[..n]);
    }
}

/// Splits a trailing `[<n>]` exit-code fragment off the raw stdout bytes
/// read before the sentinel. Falls back to exit code 0 and the unmodified
/// bytes if the fragment is absent or malformed.
fn split_exit_suffix(raw: &[u8]) -> (&[u8], i64) {
    if raw.last() != Some(&b']') {
        return (raw, 0);
    }
    let Some(open) = raw.iter().rposition(|&b| b == b'[') else {
        return (raw, 0);
    };
    let digits = &raw[open + 1..raw.len() - 1];
    match std::str::from_utf8(digits).ok().and_then(|s| s.parse::<i64>().ok()) {
        Some(code) => (&raw[..open], code),
        None => (raw, 0),
    }
}

/// Formats argv with space separators, quoting any argument containing `"`
/// or whitespace; an embedded `"` is escaped as `\"` (§4.4 step 1).
fn format_argv(argv: &[String]) -> String {
    argv.iter()
        .map(|arg| quote_arg(arg))
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote_arg(arg: &str) -> String {
    if arg.is_empty() || arg.chars().any(|c| c.is_whitespace() || c == '"') {
        let escaped = arg.replace('"', "\\\"");
        format!("\"{escaped}\"")
    } else {
        arg.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_args_are_not_quoted() {
        assert_eq!(format_argv(&["console".into(), "issue".into()]), "console issue");
    }

    #[test]
    fn whitespace_triggers_quoting() {
        assert_eq!(format_argv(&["hello world".into()]), "\"hello world\"");
    }

    #[test]
    fn embedded_quote_is_escaped() {
        assert_eq!(format_argv(&["say \"hi\"".into()]), "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn empty_arg_is_quoted_to_stay_visible() {
        assert_eq!(format_argv(&["".into()]), "\"\"");
    }

    #[test]
    fn exit_suffix_is_split() {
        let (stdout, code) = split_exit_suffix(b"some output[0]");
        assert_eq!(stdout, b"some output");
        assert_eq!(code, 0);
    }

    #[test]
    fn negative_exit_suffix_is_parsed() {
        let (stdout, code) = split_exit_suffix(b"oops[-1]");
        assert_eq!(stdout, b"oops");
        assert_eq!(code, -1);
    }

    #[test]
    fn missing_suffix_defaults_to_zero() {
        let (stdout, code) = split_exit_suffix(b"no suffix here");
        assert_eq!(stdout, b"no suffix here");
        assert_eq!(code, 0);
    }
}
