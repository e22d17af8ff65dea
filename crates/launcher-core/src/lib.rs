//! Core types for the Vault launcher.
//!
//! Holds the shared error type, settings and config-file handling, and the
//! pure run-mode / executable-target resolution used by the runtime.

pub mod error;
pub mod layout;
pub mod settings;
pub mod target;

pub use error::{LauncherError, Result};
pub use target::{resolve_executable_target, ExecutableTarget, RunMode};
