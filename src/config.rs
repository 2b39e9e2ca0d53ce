use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::stats::{FOOTER_REFRESH, HEADER_REFRESH};

const DEFAULT_TICK: Duration = Duration::from_millis(250);
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UiConfig {
    pub header_refresh_ms: Option<u64>,
    pub footer_refresh_ms: Option<u64>,
    pub tick_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    pub level: Option<String>,
    pub file: Option<PathBuf>,
}

fn home_dir() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()))
}

/// `$HOME/.taskmaster`, used for both the config file and task data.
pub fn default_base_dir() -> PathBuf {
    home_dir().join(".taskmaster")
}

impl Config {
    /// Load config from `path`, or `~/.taskmaster/config.toml` when `None`.
    /// Returns default config if the file doesn't exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from(p),
            None => Self::load_from(&default_base_dir().join("config.toml")),
        }
    }

    fn load_from(path: &Path) -> Result<Self> {
        let config: Config = match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents)
                .with_context(|| format!("failed to parse {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
        };
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let intervals = [
            ("ui.header_refresh_ms", self.ui.header_refresh_ms),
            ("ui.footer_refresh_ms", self.ui.footer_refresh_ms),
            ("ui.tick_ms", self.ui.tick_ms),
        ];
        for (name, value) in intervals {
            if value == Some(0) {
                bail!("failed to parse {}: {name} must be greater than zero", path.display());
            }
        }
        Ok(())
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub data_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

/// Fully resolved settings: CLI > config file > defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub header_refresh: Duration,
    pub footer_refresh: Duration,
    pub tick: Duration,
    pub log_level: String,
    pub log_file: PathBuf,
}

impl Settings {
    pub fn resolve(overrides: Overrides, config: Config) -> Self {
        let ms = |v: Option<u64>, default: Duration| v.map(Duration::from_millis).unwrap_or(default);
        Self {
            data_dir: overrides
                .data_dir
                .or(config.data_dir)
                .unwrap_or_else(default_base_dir),
            header_refresh: ms(config.ui.header_refresh_ms, HEADER_REFRESH),
            footer_refresh: ms(config.ui.footer_refresh_ms, FOOTER_REFRESH),
            tick: ms(config.ui.tick_ms, DEFAULT_TICK),
            log_level: overrides
                .log_level
                .or(config.log.level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            log_file: overrides
                .log_file
                .or(config.log.file)
                .unwrap_or_else(|| std::env::temp_dir().join("taskmaster.log")),
        }
    }
}
