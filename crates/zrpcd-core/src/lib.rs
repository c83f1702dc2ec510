//! Request-multiplexing runtime for a line-oriented JSON-RPC daemon that
//! drives z/OS mainframe resource operations through native helper
//! subprocesses.
//!
//! A single long-lived daemon process reads one JSON-RPC 2.0 request per
//! line from stdin and writes one response (or notification) per line to
//! stdout, while a pool of workers each own a persistent helper subprocess
//! reached through a small stdio sub-protocol. This crate owns that
//! machinery — dispatch, the worker pool, the child-process channel, the
//! shared-memory progress view, the FIFO-backed stream subsystem, and the
//! daemon's own logging/config/error-handling layers — and leaves the
//! mapping from JSON-RPC method names to concrete dataset/USS/job/console
//! operations to an adapter crate built on top of it.
//!
//! ## Lifecycle
//! [`daemon::run`] ties the pieces together: install logging, stabilize
//! stdio codepages, load the optional checksums sidecar, spawn the worker
//! pool, emit the readiness banner, then read requests until stdin closes.
//!
//! ## Wire types
//! [`protocol`] carries the JSON-RPC request/response/notification shapes
//! and the closed catalog of method names; [`dispatcher::Dispatcher`] maps
//! those names to handler adapters supplied by the caller.
//!
//! ## Per-worker state
//! [`channel::ChildChannel`] owns one helper subprocess's stdio; optional
//! [`shmem::SharedMemoryView`] gives workers a typed view onto the progress
//! cell the helper publishes; [`stream::StreamManager`] derives and manages
//! the FIFOs used for bulk transfer.

pub mod channel;
pub mod checksums;
pub mod daemon;
pub mod dispatcher;
pub mod error;
pub mod logger;
pub mod output;
pub mod platform;
mod process;
pub mod protocol;
pub mod shmem;
pub mod stream;
pub mod worker;

pub use channel::ChildChannel;
pub use dispatcher::{Dispatcher, HandlerContext, HandlerFn, HandlerFuture};
pub use error::{ChannelError, DaemonError, HandlerError};
pub use output::OutputSink;
pub use stream::StreamManager;
pub use worker::{WorkerPool, WorkerPoolConfig};
