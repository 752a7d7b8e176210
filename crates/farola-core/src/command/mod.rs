// ── Control command taxonomy ──
//
// Outbound commands are named kinds with a JSON parameter payload. The core
// defines and validates them; delivery to the controllers belongs to a
// `CommandSink` supplied by the embedding application.

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::CommandError;

/// Every command the dashboard knows how to issue.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CommandKind {
    /// Switch the targeted lights on.
    Encender,
    /// Switch the targeted lights off.
    Apagar,
    /// Set LED intensity on the targeted lights. Params: `{"intensidad": 0-100}`.
    Intensidad,
    /// Set LED intensity fleet-wide. Params: `{"intensidad": 0-100}`.
    IntensidadGlobal,
    /// Hand control to the on-device automation program.
    ModoAutomatico,
    /// Take control back from the automation program.
    ModoManual,
    /// Replace the schedule program. Params: `{"horarios": [...]}`.
    Horarios,
    /// Reboot the targeted controllers.
    Reiniciar,
}

impl CommandKind {
    /// Fleet-wide kinds apply to every device and take no target list.
    pub fn is_fleet_wide(self) -> bool {
        matches!(self, Self::IntensidadGlobal)
    }
}

/// One command ready to hand to a sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlCommand {
    pub kind: CommandKind,
    /// Device ids. Empty for fleet-wide kinds.
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default)]
    pub params: Value,
}

impl ControlCommand {
    pub fn new(kind: CommandKind, targets: Vec<String>, params: Value) -> Self {
        Self {
            kind,
            targets,
            params,
        }
    }

    pub fn power(on: bool, targets: Vec<String>) -> Self {
        let kind = if on {
            CommandKind::Encender
        } else {
            CommandKind::Apagar
        };
        Self::new(kind, targets, Value::Null)
    }

    pub fn intensity(targets: Vec<String>, intensity: f64) -> Self {
        Self::new(
            CommandKind::Intensidad,
            targets,
            json!({ "intensidad": intensity }),
        )
    }

    pub fn global_intensity(intensity: f64) -> Self {
        Self::new(
            CommandKind::IntensidadGlobal,
            Vec::new(),
            json!({ "intensidad": intensity }),
        )
    }

    pub fn automatic_mode(targets: Vec<String>, enabled: bool) -> Self {
        let kind = if enabled {
            CommandKind::ModoAutomatico
        } else {
            CommandKind::ModoManual
        };
        Self::new(kind, targets, Value::Null)
    }

    /// Check targets and parameters against the command kind.
    pub fn validate(&self) -> Result<(), CommandError> {
        let invalid = |reason: &str| CommandError::Invalid {
            kind: self.kind,
            reason: reason.into(),
        };

        if !self.kind.is_fleet_wide() && self.targets.is_empty() {
            return Err(invalid("at least one target device is required"));
        }
        if self.targets.iter().any(|t| t.trim().is_empty()) {
            return Err(invalid("target ids must not be empty"));
        }

        match self.kind {
            CommandKind::Intensidad | CommandKind::IntensidadGlobal => {
                let level = self
                    .params
                    .get("intensidad")
                    .and_then(Value::as_f64)
                    .ok_or_else(|| invalid("missing numeric 'intensidad' parameter"))?;
                if !(0.0..=100.0).contains(&level) {
                    return Err(invalid("'intensidad' must be between 0 and 100"));
                }
            }
            CommandKind::Horarios => {
                if !self.params.get("horarios").is_some_and(Value::is_array) {
                    return Err(invalid("missing 'horarios' array parameter"));
                }
            }
            CommandKind::Encender
            | CommandKind::Apagar
            | CommandKind::ModoAutomatico
            | CommandKind::ModoManual
            | CommandKind::Reiniciar => {}
        }
        Ok(())
    }
}

/// Acknowledgement from a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// The sink accepted the command for these many devices.
    Accepted { devices: usize },
}

/// Delivery path for control commands.
pub trait CommandSink: Send + Sync + 'static {
    fn send<'a>(
        &'a self,
        command: &'a ControlCommand,
    ) -> BoxFuture<'a, Result<CommandResult, CommandError>>;
}

/// Sink for deployments without an actuation path: rejects everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedSink;

impl CommandSink for UnsupportedSink {
    fn send<'a>(
        &'a self,
        command: &'a ControlCommand,
    ) -> BoxFuture<'a, Result<CommandResult, CommandError>> {
        let kind = command.kind;
        Box::pin(async move { Err(CommandError::Unsupported { kind }) })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn wire_names_are_snake_case() {
        assert_eq!(CommandKind::IntensidadGlobal.to_string(), "intensidad_global");
        assert_eq!(CommandKind::ModoAutomatico.as_ref(), "modo_automatico");
        assert_eq!(CommandKind::from_str("reiniciar").unwrap(), CommandKind::Reiniciar);
        assert!(CommandKind::from_str("autodestruir").is_err());
        assert_eq!(
            serde_json::to_value(CommandKind::ModoManual).unwrap(),
            serde_json::json!("modo_manual")
        );
    }

    #[test]
    fn every_kind_round_trips_through_its_name() {
        for kind in CommandKind::iter() {
            assert_eq!(CommandKind::from_str(kind.as_ref()).unwrap(), kind);
        }
    }

    #[test]
    fn device_commands_need_targets() {
        let err = ControlCommand::power(true, Vec::new()).validate().unwrap_err();
        assert!(matches!(err, CommandError::Invalid { kind: CommandKind::Encender, .. }));
        assert!(ControlCommand::power(false, vec!["p-1".into()]).validate().is_ok());
    }

    #[test]
    fn global_intensity_needs_no_targets() {
        assert!(ControlCommand::global_intensity(60.0).validate().is_ok());
    }

    #[test]
    fn intensity_is_range_checked() {
        assert!(ControlCommand::global_intensity(101.0).validate().is_err());
        assert!(ControlCommand::intensity(vec!["p".into()], -1.0).validate().is_err());
        let missing = ControlCommand::new(CommandKind::Intensidad, vec!["p".into()], Value::Null);
        assert!(missing.validate().is_err());
    }

    #[test]
    fn schedule_command_needs_array() {
        let targets = vec!["p".to_owned()];
        let kind = CommandKind::Horarios;
        let bad = ControlCommand::new(kind, targets.clone(), json!({"horarios": 3}));
        assert!(bad.validate().is_err());
        let good = ControlCommand::new(kind, targets, json!({"horarios": []}));
        assert!(good.validate().is_ok());
    }

    #[tokio::test]
    async fn unsupported_sink_rejects() {
        let cmd = ControlCommand::automatic_mode(vec!["p".into()], true);
        let err = UnsupportedSink.send(&cmd).await.unwrap_err();
        assert_eq!(err, CommandError::Unsupported { kind: CommandKind::ModoAutomatico });
    }
}
