// ── Snapshot source seam ──
//
// The live document database is external. The core only sees an abstract
// subscription: a stream of change batches (or errors) for one collection.

use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};

use futures_core::Stream;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::error::SourceError;
use crate::model::RawRecord;

// ── SnapshotBatch ───────────────────────────────────────────────────

/// One delivery from the live source: added/updated records and removed ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotBatch {
    pub upserts: Vec<(String, RawRecord)>,
    pub removed: Vec<String>,
}

impl SnapshotBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace one device record.
    pub fn upsert(mut self, id: impl Into<String>, raw: RawRecord) -> Self {
        self.upserts.push((id.into(), raw));
        self
    }

    pub fn remove(mut self, id: impl Into<String>) -> Self {
        self.removed.push(id.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.removed.is_empty()
    }

    /// Decode the JSON wire shape:
    ///
    /// ```json
    /// {"changes": [{"type": "modified", "id": "p-1", "data": {...}}],
    ///  "removed": ["p-9"]}
    /// ```
    ///
    /// `type` defaults to `"added"`; `"removed"` entries need no `data`.
    pub fn from_json(line: &str) -> Result<Self, SourceError> {
        let wire: WireBatch = serde_json::from_str(line).map_err(|e| SourceError::Decode {
            reason: e.to_string(),
        })?;
        Ok(wire.into())
    }
}

#[derive(Debug, Deserialize)]
struct WireBatch {
    #[serde(default)]
    changes: Vec<WireChange>,
    #[serde(default)]
    removed: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WireChange {
    #[serde(default, rename = "type")]
    kind: ChangeKind,
    id: String,
    #[serde(default)]
    data: RawRecord,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ChangeKind {
    #[default]
    Added,
    Modified,
    Removed,
}

impl From<WireBatch> for SnapshotBatch {
    fn from(wire: WireBatch) -> Self {
        let mut batch = Self {
            upserts: Vec::with_capacity(wire.changes.len()),
            removed: wire.removed,
        };
        for change in wire.changes {
            match change.kind {
                ChangeKind::Added | ChangeKind::Modified => {
                    batch.upserts.push((change.id, change.data));
                }
                ChangeKind::Removed => batch.removed.push(change.id),
            }
        }
        batch
    }
}

// ── SnapshotSource ──────────────────────────────────────────────────

/// Stream of batches for one subscription. Dropping it unsubscribes.
pub type SnapshotFeed = Pin<Box<dyn Stream<Item = Result<SnapshotBatch, SourceError>> + Send>>;

/// Anything that can open a live subscription to a collection.
pub trait SnapshotSource: Send + Sync + 'static {
    fn subscribe(&self, collection: &str) -> Result<SnapshotFeed, SourceError>;
}

// ── ChannelSource ───────────────────────────────────────────────────

type FeedSender = mpsc::UnboundedSender<Result<SnapshotBatch, SourceError>>;

#[derive(Default)]
struct Slot {
    collection: Option<String>,
    tx: Option<FeedSender>,
    subscriptions: usize,
}

/// In-process source driven by explicit `push` calls.
///
/// Every `subscribe` opens a fresh channel and makes it the current one;
/// pushes always go to the latest subscription. Clones share the slot.
#[derive(Clone, Default)]
pub struct ChannelSource {
    slot: Arc<Mutex<Slot>>,
}

impl ChannelSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a batch. Returns `false` if nobody is subscribed.
    pub fn push(&self, batch: SnapshotBatch) -> bool {
        self.send(Ok(batch))
    }

    /// Deliver a stream error. Returns `false` if nobody is subscribed.
    pub fn push_error(&self, err: SourceError) -> bool {
        self.send(Err(err))
    }

    /// End the current subscription's stream from the source side.
    pub fn close(&self) {
        self.lock().tx = None;
    }

    /// Whether a subscriber is currently holding the feed open.
    pub fn is_subscribed(&self) -> bool {
        self.lock().tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Collection named by the most recent subscription.
    pub fn collection(&self) -> Option<String> {
        self.lock().collection.clone()
    }

    /// Number of `subscribe` calls served so far.
    pub fn subscriptions(&self) -> usize {
        self.lock().subscriptions
    }

    fn send(&self, item: Result<SnapshotBatch, SourceError>) -> bool {
        self.lock().tx.as_ref().is_some_and(|tx| tx.send(item).is_ok())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SnapshotSource for ChannelSource {
    fn subscribe(&self, collection: &str) -> Result<SnapshotFeed, SourceError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut slot = self.lock();
        slot.collection = Some(collection.to_owned());
        slot.tx = Some(tx);
        slot.subscriptions += 1;
        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }
}
