use clap::{CommandFactory, Parser};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default window width in logical pixels.
pub const DEFAULT_WIDTH: u32 = 1000;
/// Default window height in logical pixels.
pub const DEFAULT_HEIGHT: u32 = 700;
/// Default window title.
pub const DEFAULT_TITLE: &str = "Vault";

// ── Settings (CLI + environment) ───────────────────────────────────────────────

/// Desktop launcher for the Vault backend and UI
#[derive(Parser, Debug, Clone)]
#[command(
    name = "vault-launcher",
    about = "Desktop launcher for the Vault backend and UI",
    version
)]
pub struct Settings {
    /// Force packaged (true) or development (false) mode instead of detecting it
    #[arg(
        long,
        env = "VAULT_PACKAGED",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub packaged: Option<bool>,

    /// Application directory holding `src/` and `venv/`
    #[arg(long, env = "VAULT_BASE_DIR")]
    pub base_dir: Option<PathBuf>,

    /// Resources directory holding `backend-dist/` in packaged builds
    #[arg(long, env = "VAULT_RESOURCES_DIR")]
    pub resources_dir: Option<PathBuf>,

    /// Window title
    #[arg(long, env = "VAULT_WINDOW_TITLE", default_value = DEFAULT_TITLE)]
    pub title: String,

    /// Window width in logical pixels
    #[arg(
        long,
        env = "VAULT_WINDOW_WIDTH",
        default_value_t = DEFAULT_WIDTH,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub width: u32,

    /// Window height in logical pixels
    #[arg(
        long,
        env = "VAULT_WINDOW_HEIGHT",
        default_value_t = DEFAULT_HEIGHT,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub height: u32,

    /// Optional JSON config file with window overrides
    #[arg(long, env = "VAULT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level
    #[arg(long, env = "VAULT_LOG_LEVEL", default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Log file path
    #[arg(long, env = "VAULT_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── WindowOptions ──────────────────────────────────────────────────────────────

/// Size and title of the single UI window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowOptions {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

// ── ConfigFile ─────────────────────────────────────────────────────────────────

/// Window overrides read from `~/.vault-launcher/config.json`.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl ConfigFile {
    /// Default config location, `~/.vault-launcher/config.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".vault-launcher").join("config.json")
    }

    /// Load overrides from `path`.
    ///
    /// A missing file yields the default; an unreadable or malformed file is
    /// logged and also yields the default so a bad config never blocks launch.
    pub fn load_from(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read config file");
                return Self::default();
            }
        };
        match serde_json::from_str::<ConfigFile>(&content) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config file");
                Self::default()
            }
        }
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse process arguments and environment, then merge the config file
    /// for any window value that was not given explicitly.
    pub fn load() -> Self {
        let args: Vec<std::ffi::OsString> = std::env::args_os().collect();
        let explicit_config = Settings::parse_from(args.clone()).config;
        let config_path = explicit_config.unwrap_or_else(ConfigFile::config_path);
        Self::load_impl(args, &config_path)
    }

    /// Same as [`Settings::load`] but with an explicit argument list and
    /// config path so tests can redirect both.
    pub fn load_impl(args: Vec<std::ffi::OsString>, config_path: &Path) -> Self {
        // Raw matches tell us where each value came from.
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        let file = ConfigFile::load_from(config_path);

        if !is_arg_explicitly_set(&matches, "title") {
            if let Some(v) = file.title {
                settings.title = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "width") {
            if let Some(v) = file.width.filter(|w| *w > 0) {
                settings.width = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "height") {
            if let Some(v) = file.height.filter(|h| *h > 0) {
                settings.height = v;
            }
        }

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        settings
    }

    /// Window options after all overrides were applied.
    pub fn window_options(&self) -> WindowOptions {
        WindowOptions {
            title: self.title.clone(),
            width: self.width,
            height: self.height,
        }
    }
}

// ── Helper: check if an arg was given explicitly ───────────────────────────────

/// Returns `true` when `name` came from the command line or the environment
/// rather than its default value.
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches!(
        matches.value_source(name),
        Some(clap::parser::ValueSource::CommandLine) | Some(clap::parser::ValueSource::EnvVariable)
    )
}

// ── Tests ──────────────────────────────────────────────────────────────────────
