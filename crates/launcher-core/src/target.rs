//! Run-mode detection and backend executable resolution.
//!
//! [`resolve_executable_target`] is a pure function of the run mode and the
//! two installation directories, so it can be tested without spawning
//! anything.

use std::fmt;
use std::path::{Path, PathBuf};

// ── Platform file names ───────────────────────────────────────────────────────

/// Folder under the resources directory holding the bundled backend.
pub const BACKEND_DIST_DIR: &str = "backend-dist";

/// Development entry script, relative to `<baseDir>/src/backend`.
pub const ENTRY_SCRIPT: &str = "main.py";

/// Self-contained backend executable shipped in packaged builds.
#[cfg(windows)]
pub const PACKAGED_EXECUTABLE: &str = "api.exe";
#[cfg(not(windows))]
pub const PACKAGED_EXECUTABLE: &str = "api";

/// Interpreter location inside the development virtualenv.
#[cfg(windows)]
const VENV_INTERPRETER: [&str; 2] = ["Scripts", "python.exe"];
#[cfg(not(windows))]
const VENV_INTERPRETER: [&str; 2] = ["bin", "python"];

/// Path of the virtualenv interpreter relative to the venv root.
pub fn venv_interpreter() -> PathBuf {
    VENV_INTERPRETER.iter().collect()
}

// ── RunMode ───────────────────────────────────────────────────────────────────

/// Whether the launcher runs from a packaged distribution or a checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Packaged,
    Development,
}

impl RunMode {
    /// Pick the run mode for this process.
    ///
    /// An explicit `forced` value wins; otherwise the launcher counts as
    /// packaged when a bundled backend sits in `<resources_dir>/backend-dist`.
    pub fn detect(forced: Option<bool>, resources_dir: &Path) -> Self {
        let packaged = forced.unwrap_or_else(|| resources_dir.join(BACKEND_DIST_DIR).is_dir());
        if packaged {
            RunMode::Packaged
        } else {
            RunMode::Development
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Packaged => write!(f, "packaged"),
            RunMode::Development => write!(f, "development"),
        }
    }
}

// ── ExecutableTarget ──────────────────────────────────────────────────────────

/// What to spawn for the backend and with which arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableTarget {
    /// Program to execute.
    pub path: PathBuf,
    /// Arguments in order; empty for the packaged executable.
    pub arguments: Vec<String>,
    /// Directory the child is started in, if any.
    pub working_dir: Option<PathBuf>,
}

impl ExecutableTarget {
    /// Build a target that runs `path` with no arguments.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            arguments: Vec::new(),
            working_dir: None,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.arguments.push(arg.into());
        self
    }

    /// Set the child's working directory.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

impl fmt::Display for ExecutableTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())?;
        for arg in &self.arguments {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Resolve the backend executable for `run_mode`.
///
/// - Packaged: `<resources_dir>/backend-dist/<executable>`, no arguments.
/// - Development: `<base_dir>/venv/<interpreter>` running
///   `<base_dir>/src/backend/main.py`.
pub fn resolve_executable_target(
    run_mode: RunMode,
    base_dir: &Path,
    resources_dir: &Path,
) -> ExecutableTarget {
    match run_mode {
        RunMode::Packaged => {
            let dist = resources_dir.join(BACKEND_DIST_DIR);
            ExecutableTarget::new(dist.join(PACKAGED_EXECUTABLE)).current_dir(dist)
        }
        RunMode::Development => {
            let backend_dir = base_dir.join("src").join("backend");
            let script = backend_dir.join(ENTRY_SCRIPT);
            ExecutableTarget::new(base_dir.join("venv").join(venv_interpreter()))
                .arg(script.to_string_lossy())
                .current_dir(backend_dir)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
