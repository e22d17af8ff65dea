use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the Vault launcher.
#[derive(Error, Debug)]
pub enum LauncherError {
    /// `start()` was called while a backend process is still alive.
    #[error("Backend process already running (pid {pid})")]
    AlreadyRunning { pid: u32 },

    /// The UI document does not exist or is not a regular file.
    #[error("UI document not found: {0}")]
    DocumentNotFound(PathBuf),

    /// The backend executable could not be started.
    #[error("Failed to spawn backend {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The termination signal could not be delivered to the backend.
    #[error("Failed to terminate backend (pid {pid}): {source}")]
    Termination {
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    /// A lifecycle event arrived in a state that does not accept it.
    #[error("Invalid lifecycle transition: {event} while {from}")]
    InvalidTransition { from: String, event: String },

    /// The native window or webview could not be created.
    #[error("Window error: {0}")]
    Window(String),
}

/// Convenience alias used throughout the launcher crates.
pub type Result<T> = std::result::Result<T, LauncherError>;
