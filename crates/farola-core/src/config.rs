// ── Runtime dashboard configuration ──
//
// Describes which collection to follow and how to interpret it. Core never
// reads config files; `farola-config` or the embedding application builds a
// `DashboardConfig` and hands it in.

use std::time::Duration;

use crate::resolve::DEFAULT_RECENCY_WINDOW;

/// Default name of the live collection holding street-light controllers.
pub const DEFAULT_COLLECTION: &str = "postes";

/// How long a control-command error stays visible.
pub const DEFAULT_COMMAND_ERROR_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Collection passed to `SnapshotSource::subscribe`.
    pub collection: String,
    /// Last-seen recency window used for the `online` status.
    pub online_window: Duration,
    /// Time after which a command error is cleared.
    pub command_error_ttl: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.into(),
            online_window: DEFAULT_RECENCY_WINDOW,
            command_error_ttl: DEFAULT_COMMAND_ERROR_TTL,
        }
    }
}
