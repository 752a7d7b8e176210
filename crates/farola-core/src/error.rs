// ── Core error types ──
//
// Nothing here crosses a component boundary as a panic. Stream and
// processing failures are stored in the observable store status; command
// failures are surfaced transiently by the dashboard.

use thiserror::Error;

use crate::command::CommandKind;

/// Failure reported by a snapshot source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("Snapshot stream connection failed: {reason}")]
    Connection { reason: String },

    #[error("Could not decode snapshot batch: {reason}")]
    Decode { reason: String },

    #[error("Snapshot stream closed by the source")]
    Closed,
}

/// Error state held by the live snapshot store.
///
/// `Clone` so it can live inside the `watch`-published status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The subscription failed or dropped. Existing data is kept.
    #[error("Live data stream error: {message}")]
    Stream { message: String },

    /// A batch could not be processed. The store stays usable.
    #[error("Error processing device data: {message}")]
    Processing { message: String },
}

impl From<SourceError> for StoreError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Decode { .. } => Self::Processing {
                message: err.to_string(),
            },
            SourceError::Connection { .. } | SourceError::Closed => Self::Stream {
                message: err.to_string(),
            },
        }
    }
}

/// Failure of an outbound control command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Command '{kind}' is not supported: no actuation path is configured")]
    Unsupported { kind: CommandKind },

    #[error("Invalid '{kind}' command: {reason}")]
    Invalid { kind: CommandKind, reason: String },

    #[error("Command '{kind}' failed: {message}")]
    Failed { kind: CommandKind, message: String },
}

/// Unified error type for the dashboard facade.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The source refused the subscription.
    #[error(transparent)]
    Source(#[from] SourceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_errors_become_processing_errors() {
        let err = StoreError::from(SourceError::Decode {
            reason: "expected value at line 1".into(),
        });
        assert!(matches!(err, StoreError::Processing { .. }));
    }

    #[test]
    fn connection_errors_become_stream_errors() {
        let err = StoreError::from(SourceError::Connection {
            reason: "permission denied".into(),
        });
        assert_eq!(
            err.to_string(),
            "Live data stream error: Snapshot stream connection failed: permission denied"
        );
        assert!(matches!(
            StoreError::from(SourceError::Closed),
            StoreError::Stream { .. }
        ));
    }

    #[test]
    fn core_errors_display_the_source_failure() {
        let err = CoreError::from(SourceError::Closed);
        assert_eq!(err.to_string(), "Snapshot stream closed by the source");
    }
}
