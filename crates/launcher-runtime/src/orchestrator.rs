//! Application lifecycle orchestrator.
//!
//! Sequences the backend supervisor and the window presenter across the
//! platform's "ready" and "will quit" signals. The orchestrator owns both the
//! [`ProcessSupervisor`] and the window handle, so no lifecycle state lives
//! in globals.

use std::fmt;
use std::path::PathBuf;

use launcher_core::error::{LauncherError, Result};
use launcher_core::settings::WindowOptions;

use crate::presenter::WindowPresenter;
use crate::supervisor::ProcessSupervisor;

// ── LifecycleState ────────────────────────────────────────────────────────────

/// Where the application is in its single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    NotStarted,
    Running,
    ShuttingDown,
    Terminated,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::NotStarted => "NotStarted",
            LifecycleState::Running => "Running",
            LifecycleState::ShuttingDown => "ShuttingDown",
            LifecycleState::Terminated => "Terminated",
        };
        f.write_str(name)
    }
}

// ── ApplicationOrchestrator ───────────────────────────────────────────────────

/// Drives one application run: backend first, then the window; backend
/// teardown on quit.
///
/// `W` is the window handle type produced by the presenter in use.
pub struct ApplicationOrchestrator<W> {
    state: LifecycleState,
    supervisor: ProcessSupervisor,
    document: PathBuf,
    window_options: WindowOptions,
    window: Option<W>,
}

impl<W> ApplicationOrchestrator<W> {
    /// Create an orchestrator in [`LifecycleState::NotStarted`].
    ///
    /// # Parameters
    /// - `supervisor`     – supervisor for the backend process.
    /// - `document`       – local HTML file loaded into the window.
    /// - `window_options` – title and size of the window.
    pub fn new(
        supervisor: ProcessSupervisor,
        document: PathBuf,
        window_options: WindowOptions,
    ) -> Self {
        Self {
            state: LifecycleState::NotStarted,
            supervisor,
            document,
            window_options,
            window: None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn supervisor(&self) -> &ProcessSupervisor {
        &self.supervisor
    }

    pub fn supervisor_mut(&mut self) -> &mut ProcessSupervisor {
        &mut self.supervisor
    }

    /// The window, once shown and until shutdown.
    pub fn window(&self) -> Option<&W> {
        self.window.as_ref()
    }

    // ── Lifecycle events ──────────────────────────────────────────────────

    /// Handle the platform "application ready" signal.
    ///
    /// Starts the backend, then shows the window. Backend failures are logged
    /// and never keep the window from showing. A presenter failure is
    /// returned; the caller should then quit, which tears the backend down.
    pub fn on_ready<P>(&mut self, presenter: &P) -> Result<()>
    where
        P: WindowPresenter<Handle = W>,
    {
        if self.state != LifecycleState::NotStarted {
            return Err(LauncherError::InvalidTransition {
                from: self.state.to_string(),
                event: "ready".to_string(),
            });
        }
        self.state = LifecycleState::Running;

        match self.supervisor.start() {
            Ok(pid) => tracing::debug!(pid, "backend launched"),
            Err(e) => tracing::error!(error = %e, "backend unavailable; showing UI anyway"),
        }

        let window = presenter.show(&self.window_options, &self.document)?;
        self.window = Some(window);
        tracing::info!(document = %self.document.display(), "window shown");
        Ok(())
    }

    /// Handle the platform "will quit" signal.
    ///
    /// Stops the backend unconditionally and releases the window. Calling it
    /// again after termination does nothing.
    pub fn on_will_quit(&mut self) {
        if self.state == LifecycleState::Terminated {
            return;
        }
        self.state = LifecycleState::ShuttingDown;
        tracing::info!("shutting down");

        if let Err(e) = self.supervisor.stop() {
            tracing::warn!(error = %e, "backend termination failed; treating as released");
        }
        self.window = None;

        self.state = LifecycleState::Terminated;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::ensure_document;
    use crate::sink::{MemorySink, OutputStream};
    use launcher_core::target::ExecutableTarget;
    use std::cell::RefCell;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    // ── helpers ───────────────────────────────────────────────────────────

    /// Presenter that records calls instead of opening a window.
    #[derive(Default)]
    struct RecordingPresenter {
        shown: RefCell<Vec<(WindowOptions, PathBuf)>>,
    }

    struct FakeWindow {
        document: PathBuf,
    }

    impl WindowPresenter for RecordingPresenter {
        type Handle = FakeWindow;

        fn show(&self, options: &WindowOptions, document: &Path) -> Result<FakeWindow> {
            let document = ensure_document(document)?;
            self.shown
                .borrow_mut()
                .push((options.clone(), document.clone()));
            Ok(FakeWindow { document })
        }
    }

    fn ui_fixture() -> (TempDir, PathBuf) {
        let tmp = TempDir::new().expect("tempdir");
        let ui = tmp.path().join("src").join("ui");
        std::fs::create_dir_all(&ui).expect("mkdir");
        let doc = ui.join("index.html");
        std::fs::write(&doc, "<html><body>Vault</body></html>").expect("write");
        (tmp, doc)
    }

    fn orchestrator(
        target: ExecutableTarget,
        document: PathBuf,
    ) -> (ApplicationOrchestrator<FakeWindow>, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::default());
        let supervisor = ProcessSupervisor::new(target, sink.clone());
        let orch = ApplicationOrchestrator::new(supervisor, document, WindowOptions::default());
        (orch, sink)
    }

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn test_orchestrator_creation() {
        let (orch, _) = orchestrator(ExecutableTarget::new("/nope"), PathBuf::from("/x.html"));
        assert_eq!(orch.state(), LifecycleState::NotStarted);
        assert!(orch.window().is_none());
        assert_eq!(orch.supervisor().target().path, PathBuf::from("/nope"));
    }

    // ── ready: backend failure does not block the UI ──────────────────────

    #[tokio::test]
    async fn test_ready_shows_window_when_backend_missing() {
        let (_tmp, doc) = ui_fixture();
        let (mut orch, sink) = orchestrator(ExecutableTarget::new("/missing/api"), doc);
        let presenter = RecordingPresenter::default();

        orch.on_ready(&presenter).expect("ready");

        assert_eq!(orch.state(), LifecycleState::Running);
        assert!(orch.window().is_some());
        assert_eq!(presenter.shown.borrow().len(), 1);
        assert_eq!(presenter.shown.borrow()[0].0.width, 1000);
        assert_eq!(presenter.shown.borrow()[0].0.height, 700);
        assert_eq!(sink.stream(OutputStream::Stderr).len(), 1);
    }

    // ── ready: missing document ───────────────────────────────────────────

    #[tokio::test]
    async fn test_ready_fails_on_missing_document() {
        let tmp = TempDir::new().expect("tempdir");
        let missing = tmp.path().join("src/ui/index.html");
        let (mut orch, _) = orchestrator(ExecutableTarget::new("/missing/api"), missing);

        let err = orch.on_ready(&RecordingPresenter::default()).unwrap_err();

        assert!(matches!(err, LauncherError::DocumentNotFound(_)));
        assert!(orch.window().is_none());

        orch.on_will_quit();
        assert_eq!(orch.state(), LifecycleState::Terminated);
    }

    // ── ready twice ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_ready_twice_rejected() {
        let (_tmp, doc) = ui_fixture();
        let (mut orch, _) = orchestrator(ExecutableTarget::new("/missing/api"), doc);
        let presenter = RecordingPresenter::default();

        orch.on_ready(&presenter).expect("ready");
        let err = orch.on_ready(&presenter).unwrap_err();

        assert!(matches!(err, LauncherError::InvalidTransition { .. }));
        assert_eq!(presenter.shown.borrow().len(), 1, "window created once");
    }

    // ── quit ──────────────────────────────────────────────────────────────

    #[test]
    fn test_quit_before_ready_terminates() {
        let (mut orch, _) = orchestrator(ExecutableTarget::new("/nope"), PathBuf::from("/x.html"));
        orch.on_will_quit();
        assert_eq!(orch.state(), LifecycleState::Terminated);

        // Idempotent.
        orch.on_will_quit();
        assert_eq!(orch.state(), LifecycleState::Terminated);
    }

    #[tokio::test]
    async fn test_ready_after_terminated_rejected() {
        let (_tmp, doc) = ui_fixture();
        let (mut orch, _) = orchestrator(ExecutableTarget::new("/missing/api"), doc);
        orch.on_will_quit();

        let err = orch.on_ready(&RecordingPresenter::default()).unwrap_err();
        assert!(err.to_string().contains("Terminated"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_full_lifecycle_stops_backend() {
        let (_tmp, doc) = ui_fixture();
        let (mut orch, _) = orchestrator(ExecutableTarget::new("sleep").arg("30"), doc);
        let presenter = RecordingPresenter::default();

        orch.on_ready(&presenter).expect("ready");
        let pid = orch.supervisor().pid().expect("backend running");
        assert!(pid > 0);
        assert!(orch.supervisor_mut().is_running());
        assert!(orch
            .window()
            .map(|w| w.document.ends_with("index.html"))
            .unwrap_or(false));

        orch.on_will_quit();

        assert_eq!(orch.state(), LifecycleState::Terminated);
        assert!(orch.supervisor().pid().is_none());
        assert!(orch.window().is_none());
        assert!(
            crate::supervisor::process_exited(pid, Duration::from_secs(5)).await,
            "backend {pid} outlived the application"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_drop_before_quit_stops_backend() {
        let (_tmp, doc) = ui_fixture();
        let (mut orch, _) = orchestrator(ExecutableTarget::new("sleep").arg("30"), doc);

        orch.on_ready(&RecordingPresenter::default()).expect("ready");
        let pid = orch.supervisor().pid().expect("backend running");

        drop(orch);

        assert!(
            crate::supervisor::process_exited(pid, Duration::from_secs(5)).await,
            "backend {pid} outlived the orchestrator"
        );
    }
}
