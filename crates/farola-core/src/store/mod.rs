// ── Reactive snapshot store ──
//
// Concurrent device storage with push-based change notification.

mod collection;
mod snapshot_store;

pub use collection::ApplyOutcome;
pub use snapshot_store::{BatchSummary, SnapshotStore, StorePhase, StoreStatus};
