//! Method-name to handler mapping (§4.1 Dispatcher).
//!
//! Registration is single-shot: a second registration for the same method
//! name is a fatal startup defect (§9, testable property 7). Once built the
//! map is never mutated again, so lookup from concurrently-running workers
//! needs no synchronization.

use std::{collections::HashMap, future::Future, pin::Pin, sync::Arc};

use serde_json::Value;

use crate::channel::ChildChannel;
use crate::error::{DaemonError, HandlerError};
use crate::output::OutputSink;
use crate::stream::StreamManager;

/// Per-call context a handler adapter is given: exclusive access to the
/// worker's child-process channel (§3 invariant: one worker per channel), a
/// handle to the stream subsystem for FIFO-backed operations, and the
/// process-wide output sink so a handler can emit `receiveStream`/
/// `sendStream`/`updateProgress` notifications ahead of its own response
/// (§4.5). `output` is owned rather than borrowed: the stream subsystem's
/// progress-poll and ready-wait loops run as independently-spawned tasks
/// (`tokio::spawn`, not `tokio::select!`, so the main `exec` isn't cancelled
/// the moment one of them finishes first), and `tokio::spawn` requires
/// `'static` futures.
pub struct HandlerContext<'a> {
    pub channel: &'a mut ChildChannel,
    pub stream: &'a StreamManager,
    pub output: Arc<OutputSink>,
}

pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, HandlerError>> + Send + 'a>>;

/// A handler adapter: `(channel, raw_params) -> (result, error)` (§2 row 4).
/// Plain `fn` pointers, not boxed closures: handlers carry no captured
/// state, matching §9's "polymorphic handler abstraction" note.
pub type HandlerFn = for<'a> fn(&'a mut HandlerContext<'a>, Value) -> HandlerFuture<'a>;

#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<&'static str, HandlerFn>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers `handler` for `method`. Returns `DuplicateRegistration` if
    /// a handler is already bound to that name; the caller is expected to
    /// treat this as fatal and abort before the readiness banner is emitted.
    pub fn register(&mut self, method: &'static str, handler: HandlerFn) -> Result<(), DaemonError> {
        if self.handlers.insert(method, handler).is_some() {
            return Err(DaemonError::DuplicateRegistration(method.to_string()));
        }
        Ok(())
    }

    pub fn get(&self, method: &str) -> Option<HandlerFn> {
        self.handlers.get(method).copied()
    }

    pub fn contains(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_ctx: &mut HandlerContext<'_>, _params: Value) -> HandlerFuture<'_> {
        Box::pin(async move { Ok(Value::Null) })
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register("readFile", noop).unwrap();
        let err = dispatcher.register("readFile", noop).unwrap_err();
        assert!(matches!(err, DaemonError::DuplicateRegistration(name) if name == "readFile"));
    }

    #[test]
    fn lookup_after_registration() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register("readFile", noop).unwrap();
        assert!(dispatcher.get("readFile").is_some());
        assert!(dispatcher.get("noSuchMethod").is_none());
    }
}
