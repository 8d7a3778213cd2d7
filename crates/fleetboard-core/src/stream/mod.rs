// ── Reactive view streams ──
//
// Subscription handles for consuming a manager's ordered list.

mod filter;

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::manager::ViewStatus;
use crate::model::OrderedEntity;

pub use filter::EntityFilter;

/// Raw watch receiver over a manager's sorted rows.
pub type CollectionView<T> = watch::Receiver<Arc<Vec<Arc<T>>>>;

/// A subscription to one manager's rows and status.
///
/// Provides point-in-time access and change notification via
/// [`changed`](Self::changed) or by converting into a `Stream`.
pub struct ViewStream<T: OrderedEntity> {
    current: Arc<Vec<Arc<T>>>,
    receiver: CollectionView<T>,
    status: watch::Receiver<ViewStatus>,
}

impl<T: OrderedEntity> ViewStream<T> {
    pub(crate) fn new(receiver: CollectionView<T>, status: watch::Receiver<ViewStatus>) -> Self {
        let current = receiver.borrow().clone();
        Self {
            current,
            receiver,
            status,
        }
    }

    /// Rows captured at creation or at the last [`changed`](Self::changed).
    pub fn current(&self) -> &Arc<Vec<Arc<T>>> {
        &self.current
    }

    pub fn latest(&self) -> Arc<Vec<Arc<T>>> {
        self.receiver.borrow().clone()
    }

    pub fn status(&self) -> ViewStatus {
        self.status.borrow().clone()
    }

    /// Current rows that pass `filter`, in order.
    pub fn filtered(&self, filter: &EntityFilter<T>) -> Vec<Arc<T>> {
        filter.apply(&self.current)
    }

    /// Wait for the next list change, returning the new rows.
    /// Returns `None` once the manager is gone.
    pub async fn changed(&mut self) -> Option<Arc<Vec<Arc<T>>>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Wait for the next status change.
    pub async fn status_changed(&mut self) -> Option<ViewStatus> {
        self.status.changed().await.ok()?;
        Some(self.status.borrow_and_update().clone())
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> ViewWatchStream<T> {
        ViewWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter yielding a new sorted snapshot per list change.
pub struct ViewWatchStream<T: OrderedEntity> {
    inner: WatchStream<Arc<Vec<Arc<T>>>>,
}

impl<T: OrderedEntity> Stream for ViewWatchStream<T> {
    type Item = Arc<Vec<Arc<T>>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
