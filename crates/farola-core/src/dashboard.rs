// ── Dashboard facade ──
//
// Full lifecycle of one live subscription: opens the snapshot source,
// pumps batches into the store, recomputes the fleet view after every
// change, and owns the user-driven state (zone filter, selection) plus
// the transient command error.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, Weak};

use arc_swap::ArcSwap;
use futures_util::StreamExt;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::aggregate::{FleetView, ZoneFilter};
use crate::command::{CommandResult, CommandSink, ControlCommand, UnsupportedSink};
use crate::config::DashboardConfig;
use crate::error::{CommandError, CoreError, SourceError, StoreError};
use crate::normalize::Normalizer;
use crate::selection::{SelectedDevice, Selection};
use crate::source::{SnapshotFeed, SnapshotSource};
use crate::store::{SnapshotStore, StoreStatus};
use crate::stream::Subscription;

// ── Dashboard ────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<DashboardInner>`. All store writes happen on
/// the single pump task; reads go through published `Arc` snapshots.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<DashboardInner>,
}

struct DashboardInner {
    config: DashboardConfig,
    source: Arc<dyn SnapshotSource>,
    sink: Arc<dyn CommandSink>,
    store: SnapshotStore,
    filter: ArcSwap<ZoneFilter>,
    selection: ArcSwap<Selection>,
    view: watch::Sender<Arc<FleetView>>,
    /// Held across filter load, compute and publish so the pump and a
    /// filter change cannot publish out of order.
    view_lock: std::sync::Mutex<()>,
    command_error: watch::Sender<Option<CommandError>>,
    /// Bumped per reported command error so an old expiry timer never
    /// clears a newer error.
    command_error_seq: AtomicU64,
    pump: Mutex<Option<Pump>>,
}

/// A running subscription: its cancellation token and pump task.
struct Pump {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Dashboard {
    /// Create a dashboard without an actuation path. Does NOT subscribe;
    /// call [`start()`](Self::start).
    pub fn new(config: DashboardConfig, source: impl SnapshotSource) -> Self {
        Self::with_sink(config, source, UnsupportedSink)
    }

    pub fn with_sink(
        config: DashboardConfig,
        source: impl SnapshotSource,
        sink: impl CommandSink,
    ) -> Self {
        let store = SnapshotStore::new(Normalizer::new(config.online_window));
        let (view, _) = watch::channel(Arc::new(FleetView::default()));
        let (command_error, _) = watch::channel(None);

        Self {
            inner: Arc::new(DashboardInner {
                config,
                source: Arc::new(source),
                sink: Arc::new(sink),
                store,
                filter: ArcSwap::from_pointee(ZoneFilter::All),
                selection: ArcSwap::from_pointee(Selection::default()),
                view,
                view_lock: std::sync::Mutex::new(()),
                command_error,
                command_error_seq: AtomicU64::new(0),
                pump: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.inner.store
    }

    // ── Subscription lifecycle ───────────────────────────────────

    /// Subscribe to the configured collection and spawn the pump task.
    ///
    /// A no-op while already running. A pump whose source has ended is
    /// reaped and replaced. A failed subscribe is recorded in the store
    /// status as well as returned.
    pub async fn start(&self) -> Result<(), CoreError> {
        let mut pump = self.inner.pump.lock().await;
        match pump.take() {
            Some(running) if !running.task.is_finished() => {
                debug!("dashboard already subscribed");
                *pump = Some(running);
                return Ok(());
            }
            Some(ended) => {
                if let Err(e) = ended.task.await {
                    warn!(error = %e, "snapshot pump ended abnormally");
                }
            }
            None => {}
        }

        let collection = &self.inner.config.collection;
        self.inner.store.begin_subscription();
        self.inner.recompute();

        let feed = match self.inner.source.subscribe(collection) {
            Ok(feed) => feed,
            Err(e) => {
                self.inner.store.fail(StoreError::from(e.clone()));
                self.inner.store.end_subscription();
                return Err(e.into());
            }
        };

        let cancel = CancellationToken::new();
        let task = tokio::spawn(pump_task(
            Arc::clone(&self.inner),
            feed,
            cancel.clone(),
        ));
        *pump = Some(Pump { cancel, task });

        info!(collection = %collection, "subscribed to live snapshots");
        Ok(())
    }

    /// Cancel the subscription and wait for the pump to finish.
    ///
    /// Idempotent: only the first call after a `start` does anything.
    pub async fn stop(&self) {
        let Some(pump) = self.inner.pump.lock().await.take() else {
            return;
        };

        pump.cancel.cancel();
        if let Err(e) = pump.task.await {
            warn!(error = %e, "snapshot pump ended abnormally");
        }
        self.inner.store.end_subscription();
        info!("unsubscribed from live snapshots");
    }

    /// Explicit recovery after a stream error: resubscribe from scratch.
    pub async fn retry(&self) -> Result<(), CoreError> {
        self.stop().await;
        self.start().await
    }

    /// True while the pump is draining a live feed. False once the source
    /// has closed, even before [`stop()`](Self::stop).
    pub async fn is_running(&self) -> bool {
        self.inner
            .pump
            .lock()
            .await
            .as_ref()
            .is_some_and(|pump| !pump.task.is_finished())
    }

    pub fn status(&self) -> StoreStatus {
        self.inner.store.status()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<StoreStatus> {
        self.inner.store.subscribe_status()
    }

    // ── Fleet view ───────────────────────────────────────────────

    /// The view derived from the latest snapshot and zone filter.
    pub fn view(&self) -> Arc<FleetView> {
        self.inner.view.borrow().clone()
    }

    pub fn subscribe_view(&self) -> Subscription<FleetView> {
        Subscription::new(self.inner.view.subscribe())
    }

    pub fn zone_filter(&self) -> Arc<ZoneFilter> {
        self.inner.filter.load_full()
    }

    pub fn set_zone_filter(&self, filter: ZoneFilter) {
        debug!(filter = %filter, "zone filter changed");
        self.inner.filter.store(Arc::new(filter));
        self.inner.recompute();
    }

    // ── Selection ────────────────────────────────────────────────

    pub fn selection(&self) -> Arc<Selection> {
        self.inner.selection.load_full()
    }

    /// Replace the selection wholesale. Never pruned automatically.
    pub fn set_selection(&self, ids: impl IntoIterator<Item = impl Into<String>>) {
        self.inner.selection.store(Arc::new(Selection::new(ids)));
    }

    pub fn toggle_selection(&self, id: &str) {
        self.inner.selection.rcu(|current| {
            let mut next = Selection::clone(current);
            next.toggle(id);
            next
        });
    }

    pub fn clear_selection(&self) {
        self.inner.selection.store(Arc::new(Selection::default()));
    }

    /// Selected ids resolved against the current snapshot; missing ones
    /// come back as [`SelectedDevice::Stale`].
    pub fn selected_devices(&self) -> Vec<SelectedDevice> {
        self.selection().resolve(&self.inner.store.snapshot())
    }

    /// Drop selected ids that are no longer in the snapshot.
    pub fn prune_selection(&self) -> usize {
        let snapshot = self.inner.store.snapshot();
        let mut pruned = 0;
        self.inner.selection.rcu(|current| {
            let mut next = Selection::clone(current);
            pruned = next.prune(&snapshot);
            next
        });
        pruned
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Validate and hand a command to the sink.
    ///
    /// Failures are returned and also published on
    /// [`command_error()`](Self::command_error) until the configured TTL
    /// elapses. Commands are never retried.
    pub async fn send_command(
        &self,
        command: ControlCommand,
    ) -> Result<CommandResult, CommandError> {
        let result = match command.validate() {
            Ok(()) => self.inner.sink.send(&command).await,
            Err(e) => Err(e),
        };
        if let Err(ref e) = result {
            warn!(kind = %command.kind, error = %e, "control command failed");
            self.inner.report_command_error(e.clone());
        }
        result
    }

    /// The most recent command error, if it has not expired yet.
    pub fn command_error(&self) -> Option<CommandError> {
        self.inner.command_error.borrow().clone()
    }

    pub fn subscribe_command_error(&self) -> watch::Receiver<Option<CommandError>> {
        self.inner.command_error.subscribe()
    }
}

impl DashboardInner {
    fn recompute(&self) {
        let _guard = self.view_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let view = FleetView::compute(&self.store.snapshot(), &self.filter.load());
        self.view.send_replace(Arc::new(view));
    }

    fn report_command_error(self: &Arc<Self>, error: CommandError) {
        let seq = self.command_error_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.command_error.send_replace(Some(error));

        let ttl = self.config.command_error_ttl;
        let weak: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Some(inner) = weak.upgrade() {
                if inner.command_error_seq.load(Ordering::SeqCst) == seq {
                    inner.command_error.send_replace(None);
                }
            }
        });
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Drain the feed into the store until cancelled or the source ends. A
/// source end leaves the store `Unsubscribed` with the closed error set.
///
/// Dropping `feed` on exit releases the subscription.
async fn pump_task(inner: Arc<DashboardInner>, mut feed: SnapshotFeed, cancel: CancellationToken) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            item = feed.next() => match item {
                Some(Ok(batch)) => {
                    if inner.store.apply_batch(batch).is_some() {
                        inner.recompute();
                    }
                }
                Some(Err(e)) => inner.store.fail(StoreError::from(e)),
                None => {
                    inner.store.fail(StoreError::from(SourceError::Closed));
                    inner.store.end_subscription();
                    break;
                }
            }
        }
    }
    debug!("snapshot pump exited");
}
