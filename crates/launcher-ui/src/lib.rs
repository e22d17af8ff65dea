//! Window presenters for the Vault launcher.
//!
//! [`headless::HeadlessPresenter`] validates and logs the UI document without
//! drawing anything. With the `webview` feature, [`webview`] opens a native
//! window hosting the system webview and runs the platform event loop.

pub mod headless;
#[cfg(feature = "webview")]
pub mod webview;

pub use launcher_runtime as runtime;
