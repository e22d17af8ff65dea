//! Runtime lifecycle layer for the Vault launcher.
//!
//! Supervises the backend child process, defines the window presenter
//! contract, and sequences both through the application orchestrator.

pub mod orchestrator;
pub mod presenter;
pub mod sink;
pub mod supervisor;

pub use launcher_core as core;
