//! CLI error types with miette diagnostics.
//!
//! Maps core and config errors into user-facing errors with help text.

use miette::Diagnostic;
use thiserror::Error;

use farola_config::ConfigError;
use farola_core::{CoreError, SourceError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Input ────────────────────────────────────────────────────────
    #[error("Could not read {path}")]
    #[diagnostic(
        code(farola::input),
        help("Check that the file exists and is readable, or pass `-` to read stdin.")
    )]
    ReadInput {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    #[diagnostic(
        code(farola::json),
        help(
            "Expected an object keyed by device id, e.g. {{\"p-1\": {{...}}}},\n\
             or an array of objects that each carry an \"id\" field."
        )
    )]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(farola::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(farola::config),
        help("Inspect the effective settings with: farola config show")
    )]
    Config(#[from] ConfigError),

    #[error("Configuration file already exists at {path}")]
    #[diagnostic(code(farola::config_exists), help("Use --force to overwrite it."))]
    ConfigExists { path: String },

    // ── Live feed ────────────────────────────────────────────────────
    #[error("Could not open the snapshot feed")]
    #[diagnostic(code(farola::feed))]
    Feed(#[source] SourceError),

    #[error("{0}")]
    #[diagnostic(code(farola::internal))]
    Internal(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to render config: {0}")]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ReadInput { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                exit_code::NOT_FOUND
            }
            Self::Json { .. } | Self::Validation { .. } | Self::ConfigExists { .. } => {
                exit_code::USAGE
            }
            Self::Feed(_) => exit_code::CONNECTION,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Source(source) => Self::Feed(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_maps_to_not_found() {
        let err = CliError::ReadInput {
            path: "postes.json".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
    }

    #[test]
    fn feed_errors_map_to_connection() {
        let err = CliError::from(CoreError::Source(SourceError::Closed));
        assert_eq!(err.exit_code(), exit_code::CONNECTION);
    }
}
