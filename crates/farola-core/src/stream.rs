// ── Reactive subscriptions ──
//
// Handles vended by the store and the dashboard for consuming published
// snapshots (the device map, the fleet view).

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// A subscription to an immutable, periodically republished value.
///
/// Provides both point-in-time snapshot access and reactive change
/// notification via the `changed()` method or by converting to a `Stream`.
pub struct Subscription<T: Send + Sync + 'static> {
    current: Arc<T>,
    receiver: watch::Receiver<Arc<T>>,
}

impl<T: Send + Sync + 'static> Subscription<T> {
    pub(crate) fn new(receiver: watch::Receiver<Arc<T>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Get the snapshot captured at creation time (or the last `changed()`).
    pub fn current(&self) -> &Arc<T> {
        &self.current
    }

    /// Get the latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Arc<T> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` if the publisher has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<T>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = Arc::clone(&snap);
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> SubscriptionStream<T> {
        SubscriptionStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
///
/// Yields the current snapshot first, then a new one on every publish.
pub struct SubscriptionStream<T: Send + Sync + 'static> {
    inner: WatchStream<Arc<T>>,
}

impl<T: Send + Sync + 'static> Stream for SubscriptionStream<T> {
    type Item = Arc<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // WatchStream<Arc<T>> is Unpin, so re-pinning the field is safe.
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use tokio_test::{assert_pending, assert_ready, task};

    #[test]
    fn changed_waits_for_a_publish() {
        let (tx, rx) = watch::channel(Arc::new(1u32));
        let mut sub = Subscription::new(rx);
        {
            let mut changed = task::spawn(sub.changed());
            assert_pending!(changed.poll());

            tx.send_replace(Arc::new(2));
            assert!(changed.is_woken());
            let got = assert_ready!(changed.poll());
            assert_eq!(got.as_deref(), Some(&2));
        }
        assert_eq!(**sub.current(), 2);
        assert_eq!(*sub.latest(), 2);
    }

    #[test]
    fn changed_ends_when_publisher_drops() {
        let (tx, rx) = watch::channel(Arc::new(0u8));
        let mut sub = Subscription::new(rx);
        drop(tx);
        let mut changed = task::spawn(sub.changed());
        assert_eq!(assert_ready!(changed.poll()), None);
    }

    #[tokio::test]
    async fn stream_yields_current_then_updates() {
        let (tx, rx) = watch::channel(Arc::new("a"));
        let mut stream = Subscription::new(rx).into_stream();
        assert_eq!(*stream.next().await.unwrap(), "a");

        tx.send_replace(Arc::new("b"));
        assert_eq!(*stream.next().await.unwrap(), "b");
    }
}
