//! Daemon loop orchestration (§4, §6 External interfaces).
//!
//! Wires the pieces built elsewhere in this crate into the documented
//! lifecycle: init logging, stabilize stdio codepages, load the optional
//! checksums sidecar, spawn the worker pool, emit the readiness banner,
//! then read one JSON-RPC request per line until stdin closes. A caller
//! (the `zrpcd` binary) owns CLI parsing and handler registration; this
//! module only owns the sequence and failure handling around them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::checksums;
use crate::dispatcher::Dispatcher;
use crate::error::DaemonError;
use crate::logger;
use crate::output::OutputSink;
use crate::platform;
use crate::protocol::{error_codes, ReadyBanner, Request, Response};
use crate::worker::{WorkerPool, WorkerPoolConfig};

pub struct DaemonConfig {
    pub helper_path: PathBuf,
    pub num_workers: usize,
    pub verbose: bool,
    pub log_path: Option<PathBuf>,
    pub checksums_path: Option<PathBuf>,
}

pub async fn run(config: DaemonConfig, dispatcher: Dispatcher) -> Result<(), DaemonError> {
    let log_path = match config.log_path {
        Some(path) => path,
        None => logger::default_log_path().map_err(|source| DaemonError::Io {
            context: "resolving default log path",
            source,
        })?,
    };
    logger::init(log_path, config.verbose)?;
    platform::force_stdio_codepage();

    let checksums_path = match config.checksums_path {
        Some(path) => path,
        None => checksums::default_checksums_path().unwrap_or_else(|_| PathBuf::from("checksums.asc")),
    };
    let checksums = checksums::load(&checksums_path)?;

    let output = Arc::new(OutputSink::new());
    let pool_config = WorkerPoolConfig::new(config.num_workers, config.helper_path.clone());
    let pool = WorkerPool::spawn(pool_config, Arc::new(dispatcher), Arc::clone(&output)).await?;

    tracing::info!(workers = pool.available(), "daemon ready");
    output
        .emit(&ReadyBanner::new(pool.available(), checksums))
        .map_err(|source| DaemonError::Io {
            context: "writing readiness banner",
            source,
        })?;

    drain_stdin(&pool, &output).await;

    pool.shutdown().await;
    Ok(())
}

async fn drain_stdin(pool: &WorkerPool, output: &OutputSink) {
    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        dispatch_line(&line, pool, output).await;
    }
}

/// `--pipe PATH` one-shot mode (§6): copies the named pipe's bytes straight
/// to stdout and exits, rather than running the dispatcher at all. Callers
/// must invoke this before constructing a `Dispatcher`/`DaemonConfig` — it
/// replaces the whole daemon lifecycle, not a step inside `run`.
pub async fn copy_pipe_to_stdout(pipe_path: &Path) -> Result<(), DaemonError> {
    let mut pipe = tokio::fs::File::open(pipe_path)
        .await
        .map_err(|source| DaemonError::PipeRead {
            path: pipe_path.to_path_buf(),
            source,
        })?;
    let mut stdout = tokio::io::stdout();
    tokio::io::copy(&mut pipe, &mut stdout)
        .await
        .map_err(|source| DaemonError::PipeRead {
            path: pipe_path.to_path_buf(),
            source,
        })?;
    stdout.flush().await.map_err(|source| DaemonError::PipeRead {
        path: pipe_path.to_path_buf(),
        source,
    })?;
    Ok(())
}

async fn dispatch_line(line: &str, pool: &WorkerPool, output: &OutputSink) {
    if line.trim().is_empty() {
        return;
    }
    match serde_json::from_str::<Request>(line) {
        Ok(request) => pool.enqueue(request).await,
        Err(err) => {
            let _ = output.emit(&Response::failure(
                None,
                error_codes::PARSE_ERROR,
                format!("Failed to parse command request: {err}"),
            ));
        }
    }
}
