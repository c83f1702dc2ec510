use std::path::PathBuf;

use thiserror::Error;

/// Fatal startup/infrastructure failures.
///
/// Any `DaemonError` surfaced before the readiness banner is written aborts
/// the process with a non-zero exit code (see §6 Exit codes); surfaced after
/// the banner, infrastructure failures during steady-state operation are
/// instead reported as JSON-RPC error responses with code `1`.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("failed to initialize log file `{path}`: {source}")]
    LoggerInit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("duplicate handler registration for method `{0}`")]
    DuplicateRegistration(String),
    #[error("helper binary `{binary}` could not be spawned: {source}")]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("helper for worker {worker_id} did not print a ready banner before EOF")]
    NoReadyBanner { worker_id: usize },
    #[error("helper for worker {worker_id} channel setup failed: {source}")]
    ChannelSetup {
        worker_id: usize,
        #[source]
        source: ChannelError,
    },
    #[error("failed to read checksums sidecar `{path}`: {source}")]
    ChecksumsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no worker became ready")]
    NoWorkersReady,
    #[error("failed to read piped file `{path}`: {source}")]
    PipeRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Error shape returned by a handler adapter alongside its optional result.
///
/// Mirrors §7's propagation policy: a handler returns `(result, error)`
/// rather than throwing, and the worker converts a present error into a
/// JSON-RPC error response. `code` defaults to `1` (generic handler
/// failure); a channel's `last_exit_code` is threaded in explicitly by
/// handlers that ran a helper command, per the `<last_exit_code>` error kind.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HandlerError {
    pub code: i64,
    pub message: String,
    pub data: Option<String>,
}

impl HandlerError {
    pub fn generic(message: impl Into<String>) -> Self {
        Self {
            code: 1,
            message: message.into(),
            data: None,
        }
    }

    pub fn from_exit(exit_code: i64, stderr: &str) -> Self {
        let (message, data) = match stderr.split_once(": ") {
            Some((head, tail)) => (head.to_string(), Some(tail.to_string())),
            None => (stderr.to_string(), None),
        };
        Self {
            code: exit_code,
            message,
            data,
        }
    }
}

impl From<std::io::Error> for HandlerError {
    fn from(source: std::io::Error) -> Self {
        HandlerError::generic(source.to_string())
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(source: serde_json::Error) -> Self {
        HandlerError::generic(format!("failed to parse params: {source}"))
    }
}

/// Errors raised by the child-process channel's sub-protocol.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("child stdin unavailable")]
    StdinUnavailable,
    #[error("child stdout unavailable")]
    StdoutUnavailable,
    #[error("child stderr unavailable")]
    StderrUnavailable,
    #[error("child process channel I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("child process exited before completing the response")]
    ChildGone,
}
