//! Live telemetry core for a fleet of networked street-light controllers.
//!
//! Raw device records arrive from a live document source in whatever shape
//! each firmware generation produces. This crate turns them into one
//! canonical model and keeps a reactive view of the fleet:
//!
//! - **[`resolve`]**: tolerant field lookup over untyped JSON records
//!   (alternate paths, type coercion, defaults, boolean-OR signals).
//!
//! - **[`Normalizer`]**: pure projection of a raw record into a total
//!   [`DeviceState`]. Every field is present; nothing is ever null.
//!
//! - **[`SnapshotStore`]**: current id-to-state map for one subscription,
//!   built on `DashMap` + `tokio::sync::watch`, with an observable
//!   [`StoreStatus`] (phase, loading, error, last update).
//!
//! - **[`FleetView`]**: zone filtering, available zones and fleet-wide
//!   [`FleetStats`], recomputed from each snapshot.
//!
//! - **[`Dashboard`]**: facade owning the subscription lifecycle
//!   ([`start()`](Dashboard::start) / [`stop()`](Dashboard::stop) /
//!   [`retry()`](Dashboard::retry)), the zone filter, the user
//!   [`Selection`] and outbound [`ControlCommand`]s.

pub mod aggregate;
pub mod command;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod normalize;
pub mod resolve;
pub mod selection;
pub mod source;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use aggregate::{FleetStats, FleetView, ZoneFilter};
pub use command::{CommandKind, CommandResult, CommandSink, ControlCommand, UnsupportedSink};
pub use config::DashboardConfig;
pub use dashboard::Dashboard;
pub use error::{CommandError, CoreError, SourceError, StoreError};
pub use normalize::{Normalizer, normalize};
pub use selection::{SelectedDevice, Selection};
pub use source::{ChannelSource, SnapshotBatch, SnapshotFeed, SnapshotSource};
pub use store::{ApplyOutcome, BatchSummary, SnapshotStore, StorePhase, StoreStatus};
pub use stream::{Subscription, SubscriptionStream};

pub use model::{
    Automation, CurrentSensor, DeviceMeta, DeviceMetrics, DeviceState, DeviceStatus, LightSensor,
    MotionSensor, NetworkInfo, RawRecord, Schedule, Sensors, SnapshotMap,
};
