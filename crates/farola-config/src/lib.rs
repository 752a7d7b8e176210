//! Shared configuration for farola tools.
//!
//! One TOML file plus `FAROLA_` environment overrides, translated into
//! `farola_core::DashboardConfig`. The CLI layers its `GlobalOpts` on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use farola_core::DashboardConfig;
use farola_core::config::DEFAULT_COLLECTION;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Output defaults for the CLI.
    #[serde(default)]
    pub defaults: Defaults,

    /// Live dashboard settings.
    #[serde(default)]
    pub dashboard: DashboardSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DashboardSettings {
    /// Live collection holding the controllers.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Seconds a last-seen timestamp keeps a device online.
    #[serde(default = "default_online_window")]
    pub online_window_secs: u64,

    /// Seconds a failed command stays visible.
    #[serde(default = "default_command_error_ttl")]
    pub command_error_ttl_secs: u64,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            online_window_secs: default_online_window(),
            command_error_ttl_secs: default_command_error_ttl(),
        }
    }
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.into()
}
fn default_online_window() -> u64 {
    300
}
fn default_command_error_ttl() -> u64 {
    5
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "farola", "farola").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("farola");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the default path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. A missing file yields the defaults.
///
/// Environment keys use `__` between sections, e.g.
/// `FAROLA_DASHBOARD__COLLECTION=postes_norte`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("FAROLA_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

impl Config {
    /// Validate and build the core dashboard configuration.
    pub fn to_dashboard_config(&self) -> Result<DashboardConfig, ConfigError> {
        let settings = &self.dashboard;
        let collection = settings.collection.trim();
        if collection.is_empty() {
            return Err(ConfigError::Validation {
                field: "dashboard.collection".into(),
                reason: "must not be empty".into(),
            });
        }
        if settings.online_window_secs == 0 {
            return Err(ConfigError::Validation {
                field: "dashboard.online_window_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if settings.command_error_ttl_secs == 0 {
            return Err(ConfigError::Validation {
                field: "dashboard.command_error_ttl_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }

        Ok(DashboardConfig {
            collection: collection.to_owned(),
            online_window: Duration::from_secs(settings.online_window_secs),
            command_error_ttl: Duration::from_secs(settings.command_error_ttl_secs),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_core_defaults() {
        let dashboard = Config::default().to_dashboard_config().unwrap();
        assert_eq!(dashboard, DashboardConfig::default());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.dashboard.collection, "postes");
        assert_eq!(cfg.defaults.output, "table");
    }

    #[test]
    fn partial_file_overrides_only_what_it_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[dashboard]\ncollection = \"postes_norte\"\nonline_window_secs = 120\n",
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        let dashboard = cfg.to_dashboard_config().unwrap();
        assert_eq!(dashboard.collection, "postes_norte");
        assert_eq!(dashboard.online_window, Duration::from_secs(120));
        assert_eq!(dashboard.command_error_ttl, Duration::from_secs(5));
    }

    #[test]
    fn malformed_file_is_a_figment_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[dashboard]\nonline_window_secs = \"soon\"\n").unwrap();
        assert!(matches!(load_config_from(&path), Err(ConfigError::Figment(_))));
    }

    #[test]
    fn blank_collection_and_zero_windows_are_rejected() {
        let mut cfg = Config::default();
        cfg.dashboard.collection = "  ".into();
        assert!(matches!(
            cfg.to_dashboard_config(),
            Err(ConfigError::Validation { ref field, .. }) if field == "dashboard.collection"
        ));

        let mut cfg = Config::default();
        cfg.dashboard.online_window_secs = 0;
        assert!(cfg.to_dashboard_config().is_err());

        let mut cfg = Config::default();
        cfg.dashboard.command_error_ttl_secs = 0;
        assert!(cfg.to_dashboard_config().is_err());
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.dashboard.collection = "luminarias".into();
        cfg.defaults.output = "json".into();

        save_config_to(&cfg, &path).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), cfg);
    }
}
