//! Window presenter contract.
//!
//! A presenter turns a [`WindowOptions`] and a local HTML document into a
//! visible window. Concrete presenters live in the UI crate; this module only
//! fixes the contract and the document checks every presenter shares.

use std::path::{Path, PathBuf};

use launcher_core::error::{LauncherError, Result};
use launcher_core::settings::WindowOptions;
use url::Url;

/// Creates the single top-level UI surface.
pub trait WindowPresenter {
    /// Keeps the window alive; dropping it closes the window.
    type Handle;

    /// Create a window sized by `options` and load `document` into it.
    ///
    /// Implementations call [`ensure_document`] first so a missing document
    /// fails with [`LauncherError::DocumentNotFound`] before any window
    /// exists.
    fn show(&self, options: &WindowOptions, document: &Path) -> Result<Self::Handle>;
}

/// Check that `document` is an existing regular file and return its
/// absolute, canonical path.
pub fn ensure_document(document: &Path) -> Result<PathBuf> {
    match std::fs::canonicalize(document) {
        Ok(path) if path.is_file() => Ok(path),
        _ => Err(LauncherError::DocumentNotFound(document.to_path_buf())),
    }
}

/// `file://` URL for an absolute local path.
///
/// Fails with [`LauncherError::Window`] for a relative path, which no
/// webview can load.
pub fn document_url(path: &Path) -> Result<String> {
    Url::from_file_path(path).map(String::from).map_err(|()| {
        LauncherError::Window(format!("cannot build file URL for {}", path.display()))
    })
}
