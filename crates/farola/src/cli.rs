//! Clap derive structures for the `farola` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// farola -- street-light controller telemetry from the command line
#[derive(Debug, Parser)]
#[command(
    name = "farola",
    version,
    about = "Inspect street-light controller telemetry",
    long_about = "Normalize raw controller records, compute fleet statistics,\n\
        and follow a live snapshot feed.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "FAROLA_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "FAROLA_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: from config, else auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Seconds a last-seen timestamp keeps a device online (overrides config)
    #[arg(long, global = true)]
    pub online_window: Option<u64>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Normalize raw controller records into canonical device states
    #[command(alias = "norm")]
    Normalize(NormalizeArgs),

    /// Fleet statistics, zones and device list for a record file
    #[command(alias = "st")]
    Stats(StatsArgs),

    /// Follow a JSON-lines snapshot feed and summarize every batch
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Inspect or initialize the configuration file
    Config(ConfigArgs),
}

// ── Command Arguments ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct NormalizeArgs {
    /// Record file: a JSON object keyed by id, or an array of objects with an
    /// `id` field. Use `-` for stdin.
    pub file: PathBuf,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Record file (same shapes as `normalize`). Use `-` for stdin.
    pub file: PathBuf,

    /// Only list devices in this zone (`all` for every zone)
    #[arg(long, short = 'z')]
    pub zone: Option<String>,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Feed file with one batch per line. Use `-` for stdin.
    pub feed: PathBuf,

    /// Only count devices in this zone in the per-batch listing
    #[arg(long, short = 'z')]
    pub zone: Option<String>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Show the effective configuration (file + environment)
    Show,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }
}
