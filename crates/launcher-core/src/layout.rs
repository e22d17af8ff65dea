//! Installation layout: where the UI document and backend live on disk.
//!
//! [`AppLayout`] is computed once at startup from the settings and the
//! location of the running executable, then stays fixed for the process
//! lifetime.

use std::path::{Path, PathBuf};

use crate::settings::Settings;
use crate::target::{resolve_executable_target, ExecutableTarget, RunMode};

/// Resources folder next to the executable in packaged builds.
pub const RESOURCES_DIR: &str = "resources";

/// Resolved directories and run mode for this launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppLayout {
    pub run_mode: RunMode,
    pub base_dir: PathBuf,
    pub resources_dir: PathBuf,
}

impl AppLayout {
    /// Resolve the layout.
    ///
    /// # Parameters
    /// - `settings` – explicit overrides for mode and directories.
    /// - `exe_dir`  – directory containing the running executable.
    /// - `cwd`      – current working directory, the development base.
    pub fn resolve(settings: &Settings, exe_dir: &Path, cwd: &Path) -> Self {
        let resources_dir = settings
            .resources_dir
            .clone()
            .unwrap_or_else(|| exe_dir.join(RESOURCES_DIR));

        let run_mode = RunMode::detect(settings.packaged, &resources_dir);

        let base_dir = settings.base_dir.clone().unwrap_or_else(|| match run_mode {
            RunMode::Packaged => exe_dir.to_path_buf(),
            RunMode::Development => cwd.to_path_buf(),
        });

        Self {
            run_mode,
            base_dir,
            resources_dir,
        }
    }

    /// `<base_dir>/src/ui/index.html`.
    pub fn document_path(&self) -> PathBuf {
        self.base_dir.join("src").join("ui").join("index.html")
    }

    /// Backend executable for this layout.
    pub fn executable_target(&self) -> ExecutableTarget {
        resolve_executable_target(self.run_mode, &self.base_dir, &self.resources_dir)
    }
}
