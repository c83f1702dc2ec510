//! The output serializer (§4.6): the only writer of the daemon's stdout.
//!
//! Handlers and poll loops may run concurrently, but emission of any
//! complete line is serialized by one process-wide mutex held only across
//! the `write + newline` pair (§5 Shared resources & locks).

use std::io::Write;
use std::sync::Mutex;

use serde::Serialize;

pub struct OutputSink {
    stdout: Mutex<std::io::Stdout>,
}

impl OutputSink {
    pub fn new() -> Self {
        Self {
            stdout: Mutex::new(std::io::stdout()),
        }
    }

    /// Serializes `value` to one JSON line and writes it atomically.
    /// Serialization failures are reported as `-32603` elsewhere; this
    /// function only panics on a poisoned mutex, which would indicate a
    /// prior writer panicked mid-write — not a condition this daemon's
    /// handler code can trigger since handlers never hold the lock.
    pub fn emit(&self, value: &impl Serialize) -> std::io::Result<()> {
        let mut line = serde_json::to_vec(value).map_err(std::io::Error::other)?;
        line.push(b'\n');
        let mut guard = self.stdout.lock().unwrap_or_else(|poison| poison.into_inner());
        guard.write_all(&line)?;
        guard.flush()
    }
}

impl Default for OutputSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_does_not_panic_on_simple_value() {
        let sink = OutputSink::new();
        sink.emit(&serde_json::json!({"a": 1})).unwrap();
    }
}
