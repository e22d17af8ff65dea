//! Destination for backend output lines.
//!
//! The supervisor forwards every line the child writes to a [`LogSink`],
//! tagged with the stream it came from. [`TracingSink`] is the production
//! sink; it re-emits lines as `tracing` events under the `backend` target.

use std::fmt;

/// Which standard stream a line was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    /// Source tag attached to every forwarded line.
    pub fn tag(self) -> &'static str {
        match self {
            OutputStream::Stdout => "Python",
            OutputStream::Stderr => "Python Error",
        }
    }
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Receives backend output, one line at a time.
///
/// Called from the reader tasks, so implementations must be thread-safe.
/// Lines from one stream arrive in order; there is no ordering between
/// streams.
pub trait LogSink: Send + Sync {
    fn line(&self, stream: OutputStream, line: &str);
}

/// Forwards backend output into the `tracing` pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn line(&self, stream: OutputStream, line: &str) {
        match stream {
            OutputStream::Stdout => {
                tracing::info!(target: "backend", source = stream.tag(), "{line}")
            }
            OutputStream::Stderr => {
                tracing::warn!(target: "backend", source = stream.tag(), "{line}")
            }
        }
    }
}

/// In-memory sink used by tests to assert on forwarded output.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MemorySink {
    lines: std::sync::Mutex<Vec<(OutputStream, String)>>,
}

#[cfg(test)]
impl MemorySink {
    pub(crate) fn snapshot(&self) -> Vec<(OutputStream, String)> {
        self.lines.lock().unwrap().clone()
    }

    /// Lines received on `stream`, in arrival order.
    pub(crate) fn stream(&self, stream: OutputStream) -> Vec<String> {
        self.snapshot()
            .into_iter()
            .filter(|(s, _)| *s == stream)
            .map(|(_, l)| l)
            .collect()
    }

    /// Poll until at least `count` lines arrived or `timeout` elapsed.
    pub(crate) async fn wait_for(&self, count: usize, timeout: std::time::Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if self.lines.lock().unwrap().len() >= count {
                return true;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        self.lines.lock().unwrap().len() >= count
    }
}

#[cfg(test)]
impl LogSink for MemorySink {
    fn line(&self, stream: OutputStream, line: &str) {
        self.lines.lock().unwrap().push((stream, line.to_string()));
    }
}
