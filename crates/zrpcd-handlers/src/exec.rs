//! Shared marshal/exec/demarshal plumbing used by every handler adapter.
//!
//! Grounded in `worker.go`'s `processRequest`: a non-nil handler error
//! carries the channel's last exit code as the JSON-RPC error code, and the
//! helper's stderr (or a locally-built message) as the error text.

use std::collections::BTreeMap;
use std::sync::Arc;

use zrpcd_core::protocol::Notification;
use zrpcd_core::stream::{parse_metadata_block, poll_progress_forever, wait_for_ready_flag};
use zrpcd_core::{ChannelError, HandlerContext, HandlerError};

pub async fn exec_argv(ctx: &mut HandlerContext<'_>, argv: &[String]) -> Result<String, HandlerError> {
    let output = ctx.channel.exec(argv).await.map_err(channel_error)?;
    let exit = ctx.channel.last_exit_code();
    if exit != 0 {
        return Err(HandlerError::from_exit(exit, &output.stderr));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

pub async fn exec_argv_with_stdin(
    ctx: &mut HandlerContext<'_>,
    argv: &[String],
    payload: &[u8],
) -> Result<String, HandlerError> {
    let output = ctx
        .channel
        .exec_with_stdin_payload(argv, payload)
        .await
        .map_err(channel_error)?;
    let exit = ctx.channel.last_exit_code();
    if exit != 0 {
        return Err(HandlerError::from_exit(exit, &output.stderr));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Which side of the FIFO the helper plays: read-side (`receiveStream`,
/// the daemon fills the pipe) or write-side (`sendStream`, the client
/// fills it and the helper drains it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamDirection {
    Receive,
    Send,
}

/// Runs the FIFO-backed bulk transfer protocol (§4.5) around one `exec`
/// call: creates the FIFO, announces it, appends `--pipe-path` to argv,
/// races optional progress/ready-flag notifiers against the blocking
/// `exec`, then parses the helper's post-transfer metadata block.
///
/// The progress-poll and ready-wait loops run as independently spawned
/// tasks rather than under `tokio::select!` with `exec`: `select!` cancels
/// every other branch the instant one completes, which would be wrong here
/// since the ready-wait loop can finish (successfully or via its own
/// timeout) while `exec` is still running. Spawning lets both run to their
/// own completion or be explicitly aborted once `exec` returns.
pub async fn exec_streamed(
    ctx: &mut HandlerContext<'_>,
    mut argv: Vec<String>,
    stream_id: u64,
    direction: StreamDirection,
) -> Result<BTreeMap<String, String>, HandlerError> {
    let pipe_path = ctx.stream.create_fifo(stream_id).map_err(|err| {
        HandlerError::generic(format!("Failed to create stream FIFO: {err}"))
    })?;
    let pipe_path_str = pipe_path.display().to_string();

    let notification = match direction {
        StreamDirection::Receive => Notification::receive_stream(stream_id, &pipe_path_str, None),
        StreamDirection::Send => Notification::send_stream(stream_id, &pipe_path_str),
    };
    let _ = ctx.output.emit(&notification);

    argv.push("--pipe-path".to_string());
    argv.push(pipe_path_str.clone());

    let progress_task = ctx.channel.shmem().map(|shmem| {
        let output = Arc::clone(&ctx.output);
        tokio::spawn(async move { poll_progress_forever(&output, &shmem, stream_id).await })
    });

    let ready_task = if direction == StreamDirection::Receive {
        ctx.channel.shmem().map(|shmem| {
            let output = Arc::clone(&ctx.output);
            let pipe_path_str = pipe_path_str.clone();
            tokio::spawn(async move {
                if let Some(content_length) = wait_for_ready_flag(&shmem).await {
                    let _ = output.emit(&Notification::receive_stream(
                        stream_id,
                        &pipe_path_str,
                        Some(content_length as u64),
                    ));
                }
            })
        })
    } else {
        None
    };

    let exec_result = ctx.channel.exec(&argv).await;

    if let Some(task) = progress_task {
        task.abort();
    }
    if let Some(task) = ready_task {
        task.abort();
    }
    ctx.stream.remove_fifo(&pipe_path);

    let output = exec_result.map_err(channel_error)?;
    let exit = ctx.channel.last_exit_code();
    if exit != 0 {
        return Err(HandlerError::from_exit(exit, &output.stderr));
    }
    Ok(parse_metadata_block(&String::from_utf8_lossy(&output.stdout)))
}

fn channel_error(err: ChannelError) -> HandlerError {
    HandlerError::generic(format!("Failed to execute command: {err}"))
}

/// Splits the helper's CSV-style stdout into trimmed, non-empty rows of
/// comma-separated fields (the convention the original CLI uses for list
/// output, e.g. `name, dsorg, volser`).
pub fn csv_rows(text: &str) -> Vec<Vec<String>> {
    text.trim()
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.split(',').map(|field| field.trim().to_string()).collect())
        .collect()
}
