use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use launcher_core::layout::AppLayout;
use launcher_core::settings::Settings;
use launcher_core::target::RunMode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// The user's home directory, falling back to the current directory.
pub fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// `.vault-launcher/` under `home`.
pub fn app_dir_in(home: &Path) -> PathBuf {
    home.join(".vault-launcher")
}

/// Ensure the `.vault-launcher/` directory hierarchy exists under `home`.
///
/// Creates the following directories if absent (including any missing parents):
/// - `<home>/.vault-launcher/`
/// - `<home>/.vault-launcher/logs/`
pub fn ensure_directories_in(home: &Path) -> anyhow::Result<()> {
    let dir = app_dir_in(home);
    std::fs::create_dir_all(&dir)?;
    std::fs::create_dir_all(dir.join("logs"))?;
    Ok(())
}

// ── Layout discovery ───────────────────────────────────────────────────────────

/// Resolve the installation layout from the running executable and cwd.
pub fn resolve_layout(settings: &Settings) -> anyhow::Result<AppLayout> {
    let exe = std::env::current_exe()?;
    let exe_dir = exe.parent().unwrap_or_else(|| Path::new("."));
    let cwd = std::env::current_dir()?;
    Ok(AppLayout::resolve(settings, exe_dir, &cwd))
}

/// Log destination: the explicit `--log-file`, else a file under
/// `<home>/.vault-launcher/logs/` for packaged runs, else stderr (`None`).
pub fn log_destination(settings: &Settings, layout: &AppLayout, home: &Path) -> Option<PathBuf> {
    match (&settings.log_file, layout.run_mode) {
        (Some(path), _) => Some(path.clone()),
        (None, RunMode::Packaged) => Some(app_dir_in(home).join("logs").join("launcher.log")),
        (None, RunMode::Development) => None,
    }
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a `--log-level` name to an [`EnvFilter`] directive.
pub fn filter_directive(log_level: &str) -> &'static str {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug",
        "INFO" => "info",
        "WARNING" | "WARN" => "warn",
        "ERROR" => "error",
        _ => "info",
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Writes to `log_file` (appending) when given, otherwise to stderr.
pub fn setup_logging(log_level: &str, log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(filter_directive(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let layer = fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            registry.with(layer).init();
        }
        None => {
            let layer = fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_writer(std::io::stderr);
            registry.with(layer).init();
        }
    }

    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
