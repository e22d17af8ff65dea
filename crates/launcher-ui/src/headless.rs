//! Presenter for builds without a native webview.

use std::path::{Path, PathBuf};

use launcher_core::error::Result;
use launcher_core::settings::WindowOptions;
use launcher_runtime::presenter::{document_url, ensure_document, WindowPresenter};

/// Stand-in window: remembers what would have been displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessWindow {
    pub document: PathBuf,
    pub url: String,
    pub options: WindowOptions,
}

/// Checks the document and logs it instead of opening a window.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessPresenter;

impl WindowPresenter for HeadlessPresenter {
    type Handle = HeadlessWindow;

    fn show(&self, options: &WindowOptions, document: &Path) -> Result<HeadlessWindow> {
        let document = ensure_document(document)?;
        let url = document_url(&document)?;
        tracing::info!(
            %url,
            width = options.width,
            height = options.height,
            "headless mode: UI document ready (build with `webview` for a window)"
        );
        Ok(HeadlessWindow {
            document,
            url,
            options: options.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use launcher_core::error::LauncherError;
    use tempfile::TempDir;

    #[test]
    fn test_show_existing_document() {
        let tmp = TempDir::new().expect("tempdir");
        let doc = tmp.path().join("index.html");
        std::fs::write(&doc, "<html></html>").expect("write");
        let options = WindowOptions {
            title: "Vault".to_string(),
            width: 640,
            height: 480,
        };

        let window = HeadlessPresenter.show(&options, &doc).expect("show");

        assert!(window.url.starts_with("file://"));
        assert!(window.url.ends_with("/index.html"));
        assert_eq!(window.options, options);
    }

    #[test]
    fn test_show_missing_document() {
        let tmp = TempDir::new().expect("tempdir");
        let err = HeadlessPresenter
            .show(&WindowOptions::default(), &tmp.path().join("index.html"))
            .unwrap_err();
        assert!(matches!(err, LauncherError::DocumentNotFound(_)));
    }
}
