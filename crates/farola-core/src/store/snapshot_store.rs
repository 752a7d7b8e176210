// ── Live snapshot store ──
//
// Holds the current id -> DeviceState map for one subscription and the
// observable status around it (phase, loading flag, last error, last
// update). Single writer: only the subscription pump mutates it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, warn};

use super::collection::{ApplyOutcome, DeviceCollection};
use crate::error::StoreError;
use crate::model::{DeviceState, SnapshotMap};
use crate::normalize::Normalizer;
use crate::source::SnapshotBatch;
use crate::stream::Subscription;

/// Subscription lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorePhase {
    #[default]
    Uninitialized,
    Subscribed,
    Unsubscribed,
}

/// Observable state around the snapshot map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStatus {
    pub phase: StorePhase,
    /// True from subscribe until the first batch or error.
    pub loading: bool,
    pub error: Option<StoreError>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Result of feeding one batch to the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub applied: ApplyOutcome,
    /// Upserts dropped for having an empty id.
    pub skipped: usize,
}

pub struct SnapshotStore {
    devices: DeviceCollection,
    normalizer: Normalizer,
    status: watch::Sender<StoreStatus>,
}

impl SnapshotStore {
    pub fn new(normalizer: Normalizer) -> Self {
        let (status, _) = watch::channel(StoreStatus::default());
        Self {
            devices: DeviceCollection::new(),
            normalizer,
            status,
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Enter `Subscribed` with an empty map and the loading flag raised.
    pub fn begin_subscription(&self) {
        self.devices.clear();
        self.status.send_modify(|s| {
            s.phase = StorePhase::Subscribed;
            s.loading = true;
            s.error = None;
        });
    }

    /// Enter `Unsubscribed`. The map is left for the owner to keep or clear.
    pub fn end_subscription(&self) {
        self.status.send_modify(|s| {
            s.phase = StorePhase::Unsubscribed;
            s.loading = false;
        });
    }

    /// Discard every device state.
    pub fn clear(&self) {
        self.devices.clear();
    }

    // ── Mutation ─────────────────────────────────────────────────────

    pub fn apply_batch(&self, batch: SnapshotBatch) -> Option<BatchSummary> {
        self.apply_batch_at(batch, Utc::now())
    }

    /// Normalize and apply one batch as of `now`.
    ///
    /// Returns `None` when the store is not subscribed; late deliveries
    /// after unsubscribe are dropped.
    pub fn apply_batch_at(&self, batch: SnapshotBatch, now: DateTime<Utc>) -> Option<BatchSummary> {
        if self.phase() != StorePhase::Subscribed {
            debug!(phase = ?self.phase(), "ignoring batch outside an active subscription");
            return None;
        }

        let mut skipped = 0;
        let normalizer = self.normalizer;
        let states: Vec<DeviceState> = batch
            .upserts
            .iter()
            .filter_map(|(id, raw)| {
                if id.trim().is_empty() {
                    skipped += 1;
                    return None;
                }
                Some(normalizer.normalize(raw, id, now))
            })
            .collect();
        if skipped > 0 {
            warn!(skipped, "dropped records without an identifier");
        }

        let applied = self.devices.apply(states, &batch.removed);
        self.status.send_modify(|s| {
            s.loading = false;
            s.error = None;
            s.updated_at = Some(now);
        });

        debug!(
            inserted = applied.inserted,
            updated = applied.updated,
            removed = applied.removed,
            devices = self.devices.len(),
            "snapshot batch applied"
        );
        Some(BatchSummary { applied, skipped })
    }

    /// Record a stream or processing failure. Existing data is kept.
    pub fn fail(&self, error: StoreError) {
        warn!(error = %error, "live snapshot error");
        self.status.send_modify(|s| {
            s.loading = false;
            s.error = Some(error);
        });
    }

    // ── Readers ──────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Arc<SnapshotMap> {
        self.devices.snapshot()
    }

    pub fn device(&self, id: &str) -> Option<Arc<DeviceState>> {
        self.devices.get(id)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Number of snapshots published so far.
    pub fn version(&self) -> u64 {
        self.devices.version()
    }

    pub fn status(&self) -> StoreStatus {
        self.status.borrow().clone()
    }

    pub fn phase(&self) -> StorePhase {
        self.status.borrow().phase
    }

    pub fn is_loading(&self) -> bool {
        self.status.borrow().loading
    }

    pub fn error(&self) -> Option<StoreError> {
        self.status.borrow().error.clone()
    }

    /// How long ago the last batch was applied, or `None` if never.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.status.borrow().updated_at.map(|t| Utc::now() - t)
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe(&self) -> Subscription<SnapshotMap> {
        Subscription::new(self.devices.subscribe())
    }

    pub fn subscribe_status(&self) -> watch::Receiver<StoreStatus> {
        self.status.subscribe()
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(Normalizer::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn subscribed() -> SnapshotStore {
        let store = SnapshotStore::default();
        store.begin_subscription();
        store
    }

    #[test]
    fn starts_uninitialized_and_ignores_batches() {
        let store = SnapshotStore::default();
        assert_eq!(store.phase(), StorePhase::Uninitialized);
        assert!(store.apply_batch(SnapshotBatch::new().upsert("a", json!({}))).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn subscribe_raises_loading_until_first_batch() {
        let store = subscribed();
        assert!(store.is_loading());
        assert_eq!(store.status().updated_at, None);

        let now = Utc::now();
        store.apply_batch_at(SnapshotBatch::new(), now).unwrap();
        let status = store.status();
        assert!(!status.loading);
        assert_eq!(status.updated_at, Some(now));
    }

    #[test]
    fn updates_replace_state_wholesale() {
        let store = subscribed();
        let first = json!({"zona": "Norte", "intensidad": 70});
        store.apply_batch(SnapshotBatch::new().upsert("a", first));
        store.apply_batch(SnapshotBatch::new().upsert("a", json!({"intensidad": 20})));

        let a = store.device("a").unwrap();
        assert_eq!(a.zone, crate::model::device::defaults::ZONE);
        assert!((a.metrics.led_intensity - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn removals_delete_entries() {
        let store = subscribed();
        store.apply_batch(SnapshotBatch::new().upsert("a", json!({})).upsert("b", json!({})));
        let summary = store.apply_batch(SnapshotBatch::new().remove("a")).unwrap();
        assert_eq!(summary.applied.removed, 1);
        assert_eq!(store.snapshot().keys().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn records_without_ids_are_skipped() {
        let store = subscribed();
        let summary = store
            .apply_batch(SnapshotBatch::new().upsert(" ", json!({})).upsert("ok", json!({})))
            .unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn error_keeps_existing_snapshot() {
        let store = subscribed();
        store.apply_batch(SnapshotBatch::new().upsert("a", json!({})).upsert("b", json!({})));
        let before = store.snapshot();

        store.fail(StoreError::Stream {
            message: "unavailable".into(),
        });

        assert_eq!(store.snapshot(), before);
        assert!(!store.is_loading());
        assert!(matches!(store.error(), Some(StoreError::Stream { .. })));
    }

    #[test]
    fn next_batch_clears_error() {
        let store = subscribed();
        store.fail(StoreError::Processing {
            message: "bad".into(),
        });
        store.apply_batch(SnapshotBatch::new().upsert("a", json!({})));
        assert_eq!(store.error(), None);
    }

    #[test]
    fn unsubscribe_keeps_map_and_rejects_late_batches() {
        let store = subscribed();
        store.apply_batch(SnapshotBatch::new().upsert("a", json!({})));
        store.end_subscription();

        assert_eq!(store.phase(), StorePhase::Unsubscribed);
        assert_eq!(store.len(), 1);
        assert!(store.apply_batch(SnapshotBatch::new().upsert("b", json!({}))).is_none());
    }

    #[test]
    fn resubscribe_starts_from_empty_map() {
        let store = subscribed();
        store.apply_batch(SnapshotBatch::new().upsert("a", json!({})));
        store.end_subscription();
        store.begin_subscription();
        assert!(store.is_empty());
        assert!(store.is_loading());
    }
}
