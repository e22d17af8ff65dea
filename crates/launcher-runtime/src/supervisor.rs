//! Backend process supervisor.
//!
//! [`ProcessSupervisor`] owns the single backend child process: it spawns the
//! resolved [`ExecutableTarget`], forwards the child's stdout/stderr lines to
//! a [`LogSink`] from background tokio tasks, and sends `SIGTERM` (unix) on
//! [`ProcessSupervisor::stop`]. Neither `start` nor `stop` waits on the child.
//!
//! The handle slot is only touched through `&mut self`, so a single control
//! thread owns it and no locking is involved.

use std::process::Stdio;
use std::sync::Arc;

use launcher_core::error::{LauncherError, Result};
use launcher_core::target::ExecutableTarget;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};

use crate::sink::{LogSink, OutputStream, TracingSink};

// ── ChildProcessHandle ────────────────────────────────────────────────────────

/// The live backend process. At most one exists per supervisor.
#[derive(Debug)]
pub struct ChildProcessHandle {
    child: Child,
    pid: u32,
}

impl ChildProcessHandle {
    /// OS process id of the backend.
    pub fn pid(&self) -> u32 {
        self.pid
    }
}

// ── ProcessSupervisor ─────────────────────────────────────────────────────────

/// Launches, observes and tears down the backend process.
pub struct ProcessSupervisor {
    target: ExecutableTarget,
    sink: Arc<dyn LogSink>,
    slot: Option<ChildProcessHandle>,
}

impl ProcessSupervisor {
    /// Create a supervisor for `target` forwarding output to `sink`.
    pub fn new(target: ExecutableTarget, sink: Arc<dyn LogSink>) -> Self {
        Self {
            target,
            sink,
            slot: None,
        }
    }

    /// Create a supervisor that forwards output to `tracing`.
    pub fn with_tracing(target: ExecutableTarget) -> Self {
        Self::new(target, Arc::new(TracingSink))
    }

    /// The executable this supervisor launches.
    pub fn target(&self) -> &ExecutableTarget {
        &self.target
    }

    /// Pid of the current child, if one is held.
    pub fn pid(&self) -> Option<u32> {
        self.slot.as_ref().map(ChildProcessHandle::pid)
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Spawn the backend.
    ///
    /// Fails with [`LauncherError::AlreadyRunning`] while a live child is
    /// held; the existing handle is left untouched. A spawn failure is also
    /// written to the sink's error stream before being returned.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) -> Result<u32> {
        if self.is_running() {
            let pid = self.pid().unwrap_or_default();
            return Err(LauncherError::AlreadyRunning { pid });
        }

        tracing::info!(executable = %self.target, "starting backend");

        let mut command = Command::new(&self.target.path);
        command
            .args(&self.target.arguments)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.target.working_dir {
            command.current_dir(dir);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(source) => {
                self.sink.line(
                    OutputStream::Stderr,
                    &format!(
                        "failed to start backend {}: {}",
                        self.target.path.display(),
                        source
                    ),
                );
                return Err(LauncherError::Spawn {
                    path: self.target.path.clone(),
                    source,
                });
            }
        };

        let pid = child.id().unwrap_or_default();

        if let Some(stdout) = child.stdout.take() {
            forward_lines(stdout, OutputStream::Stdout, Arc::clone(&self.sink));
        }
        if let Some(stderr) = child.stderr.take() {
            forward_lines(stderr, OutputStream::Stderr, Arc::clone(&self.sink));
        }

        tracing::info!(pid, "backend started");
        self.slot = Some(ChildProcessHandle { child, pid });
        Ok(pid)
    }

    /// Request termination of the backend and release the handle.
    ///
    /// Sends `SIGTERM` on unix so the backend can run its shutdown handlers;
    /// on other platforms the process is terminated outright. Does not wait
    /// for the exit: the child is reaped by a background task when a runtime
    /// is available.
    ///
    /// A no-op when nothing is running. The slot is cleared even when the
    /// signal cannot be delivered; that case is returned as
    /// [`LauncherError::Termination`] for the caller to report.
    pub fn stop(&mut self) -> Result<()> {
        let Some(mut handle) = self.slot.take() else {
            tracing::debug!("stop requested with no backend running");
            return Ok(());
        };

        if let Ok(Some(status)) = handle.child.try_wait() {
            tracing::info!(pid = handle.pid, %status, "backend had already exited");
            return Ok(());
        }

        let pid = handle.pid;
        let result = terminate(&mut handle.child);
        reap(handle.child, pid);

        match result {
            Ok(()) => {
                tracing::info!(pid, "backend termination requested");
                Ok(())
            }
            Err(source) => Err(LauncherError::Termination { pid, source }),
        }
    }

    /// Whether a live child is held.
    ///
    /// Polls the child without blocking and clears the slot if it exited on
    /// its own.
    pub fn is_running(&mut self) -> bool {
        let Some(handle) = self.slot.as_mut() else {
            return false;
        };

        match handle.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                tracing::warn!(pid = handle.pid, %status, "backend exited unexpectedly");
                self.slot = None;
                false
            }
            Err(e) => {
                tracing::warn!(pid = handle.pid, error = %e, "cannot poll backend status");
                true
            }
        }
    }
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!(error = %e, "backend cleanup on drop failed");
        }
    }
}

// ── Private helpers ───────────────────────────────────────────────────────────

/// Ask a still-running child to exit.
#[cfg(unix)]
fn terminate(child: &mut Child) -> std::io::Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    // `id()` is `None` once the child was reaped; never signal pid 0.
    let Some(pid) = child.id() else {
        return Ok(());
    };
    let pid = i32::try_from(pid)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    kill(Pid::from_raw(pid), Signal::SIGTERM).map_err(std::io::Error::from)
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) -> std::io::Result<()> {
    child.start_kill()
}

/// Wait for `child` on the current runtime and log its exit status.
///
/// Outside a runtime the child is dropped and left to tokio's orphan reaper.
fn reap(mut child: Child, pid: u32) {
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        tracing::debug!(pid, "no runtime to reap backend; leaving it to the orphan reaper");
        return;
    };
    runtime.spawn(async move {
        match child.wait().await {
            Ok(status) => tracing::info!(pid, %status, "backend exited"),
            Err(e) => tracing::warn!(pid, error = %e, "cannot wait for backend exit"),
        }
    });
}

/// Spawn a task that reads `reader` line by line into `sink`.
///
/// Bytes are decoded lossily so non-UTF-8 output is still forwarded. The
/// task ends at EOF, i.e. when the child closes the stream or exits.
fn forward_lines<R>(reader: R, stream: OutputStream, sink: Arc<dyn LogSink>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    sink.line(stream, line.trim_end_matches(['\n', '\r']));
                }
                Err(e) => {
                    tracing::debug!(%stream, error = %e, "backend stream read failed");
                    break;
                }
            }
        }
        tracing::debug!(%stream, "backend stream closed");
    });
}

// ── Test support ──────────────────────────────────────────────────────────────

/// Poll until no process with `pid` exists, up to `timeout`.
///
/// A zombie still answers signal 0, so this only succeeds once the child
/// was reaped.
#[cfg(all(test, unix))]
pub(crate) async fn process_exited(pid: u32, timeout: std::time::Duration) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let pid = Pid::from_raw(pid as i32);
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if kill(pid, None).is_err() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use std::time::Duration;

    fn supervisor_with_sink(target: ExecutableTarget) -> (ProcessSupervisor, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::default());
        let supervisor = ProcessSupervisor::new(target, sink.clone());
        (supervisor, sink)
    }

    #[cfg(unix)]
    fn sleeper() -> ExecutableTarget {
        ExecutableTarget::new("sleep").arg("30")
    }

    #[cfg(unix)]
    fn shell(script: &str) -> ExecutableTarget {
        ExecutableTarget::new("sh").arg("-c").arg(script)
    }

    // ── stop without start ────────────────────────────────────────────────

    #[test]
    fn test_stop_without_child_is_noop() {
        let (mut supervisor, sink) =
            supervisor_with_sink(ExecutableTarget::new("/does/not/matter"));

        assert!(supervisor.stop().is_ok());
        assert!(supervisor.stop().is_ok());
        assert!(supervisor.pid().is_none());
        assert!(sink.snapshot().is_empty());
    }

    // ── spawn failure ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_spawn_failure_reported_on_error_stream() {
        let (mut supervisor, sink) =
            supervisor_with_sink(ExecutableTarget::new("/nonexistent/venv/bin/python"));

        let err = supervisor.start().unwrap_err();

        assert!(matches!(err, LauncherError::Spawn { .. }));
        assert!(supervisor.pid().is_none());
        assert!(!supervisor.is_running());
        let errors = sink.stream(OutputStream::Stderr);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("/nonexistent/venv/bin/python"));
        assert!(sink.stream(OutputStream::Stdout).is_empty());
    }

    // ── re-entrant start ──────────────────────────────────────────────────

    #[cfg(unix)]
    #[tokio::test]
    async fn test_double_start_rejected_and_handle_kept() {
        let (mut supervisor, _sink) = supervisor_with_sink(sleeper());

        let pid = supervisor.start().expect("first start");
        let err = supervisor.start().unwrap_err();

        match err {
            LauncherError::AlreadyRunning { pid: running } => assert_eq!(running, pid),
            other => panic!("expected AlreadyRunning, got {other:?}"),
        }
        assert_eq!(supervisor.pid(), Some(pid));
        assert!(supervisor.is_running());

        supervisor.stop().expect("stop");
    }

    // ── slot reuse ────────────────────────────────────────────────────────

    #[cfg(unix)]
    #[tokio::test]
    async fn test_start_stop_start_reuses_slot() {
        let (mut supervisor, _sink) = supervisor_with_sink(sleeper());

        let first = supervisor.start().expect("first start");
        supervisor.stop().expect("stop");
        assert!(supervisor.pid().is_none());
        assert!(!supervisor.is_running());

        let second = supervisor.start().expect("second start");
        assert_ne!(first, second);
        assert_eq!(supervisor.pid(), Some(second));

        supervisor.stop().expect("final stop");
        assert!(supervisor.stop().is_ok());
    }

    // ── output forwarding ─────────────────────────────────────────────────

    #[cfg(unix)]
    #[tokio::test]
    async fn test_output_tagged_per_stream_in_order() {
        let (mut supervisor, sink) = supervisor_with_sink(shell(
            "echo one; echo err-one >&2; echo two; echo err-two >&2; echo three",
        ));

        supervisor.start().expect("start");
        assert!(sink.wait_for(5, Duration::from_secs(5)).await, "timed out");

        assert_eq!(
            sink.stream(OutputStream::Stdout),
            vec!["one", "two", "three"]
        );
        assert_eq!(sink.stream(OutputStream::Stderr), vec!["err-one", "err-two"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_child_runs_in_working_dir() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let target = shell("pwd").current_dir(dir.path());
        let (mut supervisor, sink) = supervisor_with_sink(target);

        supervisor.start().expect("start");
        assert!(sink.wait_for(1, Duration::from_secs(5)).await, "timed out");

        let out = sink.stream(OutputStream::Stdout);
        let name = dir.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(out[0].ends_with(&name), "pwd was {}", out[0]);
    }

    // ── unexpected exit ───────────────────────────────────────────────────

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unexpected_exit_clears_slot() {
        let (mut supervisor, _sink) = supervisor_with_sink(shell("exit 3"));

        supervisor.start().expect("start");

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while supervisor.is_running() {
            assert!(tokio::time::Instant::now() < deadline, "child never exited");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert!(supervisor.pid().is_none());
        // The slot is free again.
        supervisor.start().expect("restart after exit");
        supervisor.stop().expect("stop");
    }

    // ── termination ───────────────────────────────────────────────────────

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stop_sends_sigterm() {
        let (mut supervisor, sink) = supervisor_with_sink(shell(
            "trap 'echo got-term; exit 0' TERM; echo ready; while :; do sleep 0.05; done",
        ));

        let pid = supervisor.start().expect("start");
        assert!(sink.wait_for(1, Duration::from_secs(5)).await, "never ready");

        supervisor.stop().expect("stop");
        assert!(supervisor.pid().is_none());
        assert!(sink.wait_for(2, Duration::from_secs(2)).await, "no TERM handler output");

        assert_eq!(sink.stream(OutputStream::Stdout), vec!["ready", "got-term"]);
        assert!(process_exited(pid, Duration::from_secs(5)).await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stop_ends_backend_process() {
        let (mut supervisor, _sink) = supervisor_with_sink(sleeper());

        let pid = supervisor.start().expect("start");
        assert!(!process_exited(pid, Duration::ZERO).await);

        supervisor.stop().expect("stop");
        assert!(
            process_exited(pid, Duration::from_secs(5)).await,
            "backend {pid} still alive after stop"
        );
    }

    // ── drop ──────────────────────────────────────────────────────────────

    #[cfg(unix)]
    #[tokio::test]
    async fn test_drop_releases_child() {
        let (mut supervisor, _sink) = supervisor_with_sink(sleeper());
        let pid = supervisor.start().expect("start");

        drop(supervisor);

        assert!(
            process_exited(pid, Duration::from_secs(5)).await,
            "backend {pid} still alive after drop"
        );
    }
}
