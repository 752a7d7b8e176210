//! CLI configuration: thin wrapper around `farola_config`.
//!
//! Loads the config file named by `--config` (or the platform default) and
//! applies `GlobalOpts` flag overrides on top.

use std::path::PathBuf;
use std::time::Duration;

use farola_core::DashboardConfig;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

pub use farola_config::{Config, config_path, load_config_from, save_config_to};

/// Config file in effect: `--config` / `FAROLA_CONFIG`, else the default.
pub fn active_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(load_config_from(&active_path(global))?)
}

/// Build the core dashboard configuration. CLI flags win over the file.
pub fn dashboard_config(global: &GlobalOpts, cfg: &Config) -> Result<DashboardConfig, CliError> {
    let mut dashboard = cfg.to_dashboard_config()?;
    if let Some(secs) = global.online_window {
        if secs == 0 {
            return Err(CliError::Validation {
                field: "--online-window".into(),
                reason: "must be greater than zero".into(),
            });
        }
        dashboard.online_window = Duration::from_secs(secs);
    }
    Ok(dashboard)
}

/// Output format: flag, then `defaults.output`, then table.
pub fn output_format(global: &GlobalOpts, cfg: &Config) -> OutputFormat {
    global.output.unwrap_or_else(|| {
        match cfg.defaults.output.as_str() {
            "json" => OutputFormat::Json,
            "json-compact" | "json_compact" => OutputFormat::JsonCompact,
            "plain" => OutputFormat::Plain,
            _ => OutputFormat::Table,
        }
    })
}

/// Color mode: flag, then `defaults.color`, then auto.
pub fn color_mode(global: &GlobalOpts, cfg: &Config) -> ColorMode {
    global.color.unwrap_or_else(|| match cfg.defaults.color.as_str() {
        "always" => ColorMode::Always,
        "never" => ColorMode::Never,
        _ => ColorMode::Auto,
    })
}

/// Everything a command handler needs once config is resolved.
pub struct Context {
    pub dashboard: DashboardConfig,
    pub output: OutputFormat,
    pub color: bool,
    pub quiet: bool,
}

impl Context {
    pub fn resolve(global: &GlobalOpts) -> Result<Self, CliError> {
        let cfg = load(global)?;
        Ok(Self {
            dashboard: dashboard_config(global, &cfg)?,
            output: output_format(global, &cfg),
            color: crate::output::should_color(color_mode(global, &cfg)),
            quiet: global.quiet,
        })
    }
}
