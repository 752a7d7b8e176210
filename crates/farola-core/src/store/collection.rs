// ── Device state collection ──
//
// Concurrent storage with O(1) lookups and push-based change notification
// via `watch` channels. Writers mutate the map, then publish one immutable
// snapshot per batch; readers only ever see whole published snapshots.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

use crate::model::{DeviceState, SnapshotMap};

/// Counts for one applied batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub inserted: usize,
    pub updated: usize,
    pub removed: usize,
}

impl ApplyOutcome {
    pub fn changed(&self) -> bool {
        self.inserted + self.updated + self.removed > 0
    }
}

/// Reactive collection of canonical device states keyed by device id.
///
/// Every published mutation bumps a version counter and rebuilds the
/// snapshot that subscribers receive.
pub(crate) struct DeviceCollection {
    /// Primary storage: device id -> state.
    by_id: DashMap<String, Arc<DeviceState>>,

    /// Version counter, bumped on every published mutation.
    version: watch::Sender<u64>,

    /// Full snapshot, rebuilt on mutation for efficient subscription.
    snapshot: watch::Sender<Arc<SnapshotMap>>,
}

impl DeviceCollection {
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(SnapshotMap::new()));

        Self {
            by_id: DashMap::new(),
            version,
            snapshot,
        }
    }

    /// Replace entries for every state and delete every removed id, then
    /// publish a single new snapshot.
    ///
    /// Removals run after upserts, so an id present in both ends up deleted.
    pub(crate) fn apply(
        &self,
        states: impl IntoIterator<Item = DeviceState>,
        removed: &[String],
    ) -> ApplyOutcome {
        let mut outcome = ApplyOutcome::default();

        for state in states {
            let id = state.id.clone();
            if self.by_id.insert(id, Arc::new(state)).is_some() {
                outcome.updated += 1;
            } else {
                outcome.inserted += 1;
            }
        }

        for id in removed {
            if self.by_id.remove(id).is_some() {
                outcome.removed += 1;
            }
        }

        if outcome.changed() {
            self.rebuild_snapshot();
            self.bump_version();
        }
        outcome
    }

    pub(crate) fn get(&self, id: &str) -> Option<Arc<DeviceState>> {
        self.by_id.get(id).map(|r| Arc::clone(r.value()))
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<SnapshotMap> {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<SnapshotMap>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// Remove all entities.
    pub(crate) fn clear(&self) {
        if self.by_id.is_empty() {
            return;
        }
        self.by_id.clear();
        self.rebuild_snapshot();
        self.bump_version();
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Collect all values into a snapshot map and broadcast to subscribers.
    fn rebuild_snapshot(&self) {
        let values: SnapshotMap = self
            .by_id
            .iter()
            .map(|r| (r.key().clone(), Arc::clone(r.value())))
            .collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }

    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use chrono::Utc;
    use serde_json::json;

    fn state(id: &str, zone: &str) -> DeviceState {
        normalize(&json!({ "zona": zone }), id, Utc::now())
    }

    #[test]
    fn apply_counts_inserts_updates_and_removals() {
        let col = DeviceCollection::new();
        let first = col.apply([state("a", "Norte"), state("b", "Sur")], &[]);
        assert_eq!(
            first,
            ApplyOutcome {
                inserted: 2,
                updated: 0,
                removed: 0
            }
        );

        let second = col.apply([state("a", "Centro")], &["b".into(), "zz".into()]);
        assert_eq!(
            second,
            ApplyOutcome {
                inserted: 0,
                updated: 1,
                removed: 1
            }
        );
        assert_eq!(col.len(), 1);
        assert_eq!(col.get("a").unwrap().zone, "Centro");
        assert!(col.get("b").is_none());
    }

    #[test]
    fn one_snapshot_per_batch() {
        let col = DeviceCollection::new();
        let rx = col.subscribe();
        col.apply([state("a", "x"), state("b", "x"), state("c", "x")], &[]);
        assert_eq!(col.version(), 1);
        assert_eq!(rx.borrow().len(), 3);
    }

    #[test]
    fn noop_batch_does_not_publish() {
        let col = DeviceCollection::new();
        col.apply(std::iter::empty(), &["ghost".into()]);
        assert_eq!(col.version(), 0);
    }

    #[test]
    fn held_snapshots_are_never_mutated() {
        let col = DeviceCollection::new();
        col.apply([state("a", "x")], &[]);
        let held = col.snapshot();

        col.apply([state("b", "x")], &["a".into()]);
        assert_eq!(held.keys().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(col.snapshot().keys().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn removal_wins_over_upsert_in_same_batch() {
        let col = DeviceCollection::new();
        col.apply([state("a", "x")], &["a".into()]);
        assert!(col.is_empty());
    }

    #[test]
    fn clear_publishes_empty_snapshot() {
        let col = DeviceCollection::new();
        col.apply([state("a", "x")], &[]);
        col.clear();
        assert!(col.snapshot().is_empty());
        assert_eq!(col.version(), 2);
    }
}
