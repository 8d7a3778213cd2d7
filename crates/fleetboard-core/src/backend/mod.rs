// ── Backend collaborator ──
//
// The manager never talks HTTP itself. It is handed an `Arc<B: Backend>`
// that lists, writes, and reports changes for a collection.

mod memory;
mod rest;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::error::CoreError;
use crate::model::{Collection, EntityId, OrderedEntity, Visibility};

pub use fleetboard_api::{ChangeEvent, ChangeKind};
pub use memory::MemoryBackend;
pub use rest::RestBackend;

/// Row storage for the ordered collections.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Every row the reader may see, in position order.
    async fn list_by_position<T: OrderedEntity>(
        &self,
        visibility: Visibility,
    ) -> Result<Vec<T>, CoreError>;

    /// Insert a draft under a caller-chosen id at `position`.
    ///
    /// A second insert with the same id must fail with
    /// [`CoreError::Conflict`], which is what makes retries safe.
    async fn insert<T: OrderedEntity>(
        &self,
        id: &EntityId,
        draft: &T::Draft,
        position: i64,
    ) -> Result<T, CoreError>;

    /// Apply a partial update and return the stored row.
    async fn update_fields<T, P>(&self, id: &EntityId, patch: &P) -> Result<T, CoreError>
    where
        T: OrderedEntity,
        P: Serialize + Send + Sync;

    async fn delete<T: OrderedEntity>(&self, id: &EntityId) -> Result<(), CoreError>;

    /// Start receiving change notifications for `collection`.
    fn subscribe(&self, collection: Collection) -> Result<ChangeFeed, CoreError>;
}

// ── ChangeFeed ───────────────────────────────────────────────────────

/// What the feed reported since the last call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSignal {
    /// At least one change arrived.
    Changed(ChangeKind),
    /// The receiver fell behind and skipped notifications.
    Lagged(u64),
    /// The source lost its connection and is retrying on its own. A
    /// `Changed(Resync)` follows once it is back.
    Interrupted,
    /// The source is gone; resubscribe to continue.
    Closed,
}

/// A payload-agnostic change subscription for one collection.
///
/// Dropping the feed (or calling [`unsubscribe`](Self::unsubscribe))
/// stops the producer behind it.
pub struct ChangeFeed {
    collection: Collection,
    rx: broadcast::Receiver<Arc<ChangeEvent>>,
    interrupted: bool,
    _guard: Option<DropGuard>,
}

impl ChangeFeed {
    /// Wrap a receiver. `cancel` is fired when the feed is dropped.
    pub fn new(
        collection: Collection,
        rx: broadcast::Receiver<Arc<ChangeEvent>>,
        cancel: Option<CancellationToken>,
    ) -> Self {
        Self {
            collection,
            rx,
            interrupted: false,
            _guard: cancel.map(CancellationToken::drop_guard),
        }
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Whether the last connection notice seen was an outage.
    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    /// Wait for the next notification about this feed's table.
    pub async fn next(&mut self) -> FeedSignal {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.matches(&event) => {
                    self.track(event.kind);
                    return match event.kind {
                        ChangeKind::Disconnected => FeedSignal::Interrupted,
                        kind => FeedSignal::Changed(kind),
                    };
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => return FeedSignal::Lagged(skipped),
                Err(RecvError::Closed) => return FeedSignal::Closed,
            }
        }
    }

    /// Discard everything already queued. Returns how many were dropped.
    ///
    /// Used to fold a burst of notifications into a single refetch.
    pub fn drain(&mut self) -> usize {
        let mut drained = 0;
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    if self.matches(&event) {
                        self.track(event.kind);
                    }
                    drained += 1;
                }
                Err(TryRecvError::Lagged(_)) => drained += 1,
                Err(TryRecvError::Empty | TryRecvError::Closed) => return drained,
            }
        }
    }

    pub fn unsubscribe(self) {}

    fn matches(&self, event: &ChangeEvent) -> bool {
        event.table == self.collection.table()
    }

    /// Anything but an outage notice means the source is connected.
    fn track(&mut self, kind: ChangeKind) {
        self.interrupted = kind == ChangeKind::Disconnected;
    }
}

impl std::fmt::Debug for ChangeFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn event(table: &str, kind: ChangeKind) -> Arc<ChangeEvent> {
        Arc::new(ChangeEvent {
            table: table.into(),
            kind,
            commit_timestamp: None,
        })
    }

    #[tokio::test]
    async fn next_skips_other_tables() {
        let (tx, rx) = broadcast::channel(8);
        let mut feed = ChangeFeed::new(Collection::Faqs, rx, None);

        tx.send(event("members", ChangeKind::Insert)).unwrap();
        tx.send(event("faqs", ChangeKind::Delete)).unwrap();

        assert_eq!(feed.next().await, FeedSignal::Changed(ChangeKind::Delete));
    }

    #[tokio::test]
    async fn closed_when_sender_dropped() {
        let (tx, rx) = broadcast::channel::<Arc<ChangeEvent>>(8);
        let mut feed = ChangeFeed::new(Collection::Faqs, rx, None);
        drop(tx);
        assert_eq!(feed.next().await, FeedSignal::Closed);
    }

    #[tokio::test]
    async fn drain_folds_bursts() {
        let (tx, rx) = broadcast::channel(8);
        let mut feed = ChangeFeed::new(Collection::Faqs, rx, None);
        for _ in 0..3 {
            tx.send(event("faqs", ChangeKind::Update)).unwrap();
        }
        assert_eq!(feed.drain(), 3);
        assert_eq!(feed.drain(), 0);
    }

    #[tokio::test]
    async fn outage_is_tracked_until_resync() {
        let (tx, rx) = broadcast::channel(8);
        let mut feed = ChangeFeed::new(Collection::Faqs, rx, None);

        tx.send(event("faqs", ChangeKind::Disconnected)).unwrap();
        assert_eq!(feed.next().await, FeedSignal::Interrupted);
        assert!(feed.is_interrupted());

        // A notice folded into a burst still counts.
        tx.send(event("faqs", ChangeKind::Update)).unwrap();
        tx.send(event("faqs", ChangeKind::Disconnected)).unwrap();
        tx.send(event("faqs", ChangeKind::Resync)).unwrap();
        assert_eq!(feed.next().await, FeedSignal::Changed(ChangeKind::Update));
        assert_eq!(feed.drain(), 2);
        assert!(!feed.is_interrupted());
    }

    #[test]
    fn dropping_feed_cancels_producer() {
        let (_tx, rx) = broadcast::channel::<Arc<ChangeEvent>>(8);
        let token = CancellationToken::new();
        let feed = ChangeFeed::new(Collection::Members, rx, Some(token.clone()));
        assert!(!token.is_cancelled());
        feed.unsubscribe();
        assert!(token.is_cancelled());
    }
}
