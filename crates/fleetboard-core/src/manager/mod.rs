// ── Collection view model ──
//
// One generic manager per entity kind. It owns the in-memory ordered
// list, runs moves through the planner and reconciler, and refetches
// wholesale whenever the store may have diverged: after every write,
// after every failure, and on every change-feed notification.

mod feed;
mod status;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::Utc;
use indexmap::IndexMap;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::config::ManagerOptions;
use crate::error::CoreError;
use crate::model::{Collection, Draft, EntityId, OrderedEntity, Visibility};
use crate::order::{MoveDirection, MovePlan, plan_move};
use crate::reconcile::Reconciler;
use crate::store::OrderedCollection;
use crate::stream::ViewStream;

pub use status::{ErrorOrigin, FeedState, Phase, ViewStatus};

/// What a move did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Two positions were exchanged.
    Moved,
    /// The row was already first (or last); nothing was written.
    Unchanged,
}

// ── CollectionManager ────────────────────────────────────────────────

/// Ordered view over one collection.
///
/// Cheaply cloneable via `Arc`. Dropping the last clone cancels the
/// feed task.
pub struct CollectionManager<T: OrderedEntity, B: Backend> {
    inner: Arc<Inner<T, B>>,
}

impl<T: OrderedEntity, B: Backend> Clone for CollectionManager<T, B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<T: OrderedEntity, B: Backend> {
    backend: Arc<B>,
    reconciler: Reconciler<B>,
    options: ManagerOptions,
    collection: OrderedCollection<T>,
    status: watch::Sender<ViewStatus>,
    mounted: AtomicBool,
    /// Bumped by every fetch and by unmount; a response is applied only
    /// if no newer fetch started meanwhile.
    generation: AtomicU64,
    cancel: CancellationToken,
    mount: Mutex<Option<Mount>>,
}

struct Mount {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl<T: OrderedEntity, B: Backend> Drop for Inner<T, B> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl<T: OrderedEntity, B: Backend> CollectionManager<T, B> {
    pub fn new(backend: Arc<B>, options: ManagerOptions) -> Self {
        let reconciler = Reconciler::new(Arc::clone(&backend), options.write_timeout);
        let (status, _) = watch::channel(ViewStatus::default());
        Self {
            inner: Arc::new(Inner {
                backend,
                reconciler,
                options,
                collection: OrderedCollection::new(),
                status,
                mounted: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                cancel: CancellationToken::new(),
                mount: Mutex::new(None),
            }),
        }
    }

    pub fn collection(&self) -> Collection {
        T::COLLECTION
    }

    pub fn options(&self) -> &ManagerOptions {
        &self.inner.options
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.load(Ordering::SeqCst)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Load the collection and start following its change feed.
    ///
    /// Calling `mount` on a mounted manager does nothing. A failed first
    /// fetch leaves the manager mounted in [`Phase::Error`]; `refresh`
    /// retries it.
    pub async fn mount(&self) -> Result<(), CoreError> {
        let mut mount = self.inner.mount.lock().await;
        if self.inner.mounted.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        info!(collection = %T::COLLECTION, "mounting");

        let cancel = self.inner.cancel.child_token();
        // Subscribe before the first fetch so no change slips between them.
        let feed = if self.inner.options.watch_changes {
            match self.inner.backend.subscribe(T::COLLECTION) {
                Ok(feed) => {
                    self.set_feed(FeedState::Connected);
                    Some(feed)
                }
                Err(e) => {
                    warn!(collection = %T::COLLECTION, error = %e, "change feed unavailable");
                    self.set_feed(FeedState::Reconnecting { attempt: 0 });
                    None
                }
            }
        } else {
            None
        };

        let result = self.load(Phase::Loading).await;

        let task = self.inner.options.watch_changes.then(|| {
            tokio::spawn(feed::run(
                Arc::downgrade(&self.inner),
                feed,
                cancel.clone(),
            ))
        });
        *mount = Some(Mount { cancel, task });
        result
    }

    /// Stop following changes. Responses still in flight are discarded.
    pub async fn unmount(&self) {
        let mut mount = self.inner.mount.lock().await;
        if !self.inner.mounted.swap(false, Ordering::SeqCst) {
            return;
        }
        self.inner.generation.fetch_add(1, Ordering::SeqCst);

        if let Some(Mount { cancel, task }) = mount.take() {
            cancel.cancel();
            if let Some(task) = task {
                let _ = task.await;
            }
        }
        self.inner.status.send_modify(|s| {
            s.phase = Phase::Idle;
            s.feed = FeedState::Disabled;
        });
        info!(collection = %T::COLLECTION, "unmounted");
    }

    /// Refetch the whole collection.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        self.ensure_mounted()?;
        self.load(Phase::Refreshing).await
    }

    // ── Admin operations ─────────────────────────────────────────────

    /// Move one row a single step within its group.
    pub async fn move_item(
        &self,
        id: &EntityId,
        direction: MoveDirection,
    ) -> Result<MoveOutcome, CoreError> {
        self.ensure_writable()?;

        let plan = match self.plan(id, direction) {
            Ok(plan) => plan,
            Err(e) => return self.settle(Err(e)).await,
        };
        let MovePlan::Swap(swap) = plan else {
            debug!(collection = %T::COLLECTION, %id, %direction, "already at the boundary");
            return Ok(MoveOutcome::Unchanged);
        };

        if self.inner.options.optimistic {
            self.inner.collection.apply_positions(&swap.assignments());
        }
        let result = self.inner.reconciler.apply_swap(&swap).await;
        self.settle(result.map(|()| MoveOutcome::Moved)).await
    }

    /// Append a new row to the end of its group.
    pub async fn insert(&self, draft: T::Draft) -> Result<T, CoreError> {
        self.ensure_writable()?;
        draft.validate()?;
        let existing = self.inner.collection.snapshot();
        let result = self.inner.reconciler.insert_appended(&existing, &draft).await;
        self.settle(result).await
    }

    /// Edit payload fields. Never touches `position`.
    pub async fn update_fields(&self, id: &EntityId, patch: T::Patch) -> Result<T, CoreError> {
        self.ensure_writable()?;
        self.loaded(id).await?;
        let result = self.inner.reconciler.update::<T>(id, &patch).await;
        if matches!(result, Err(CoreError::Validation { .. })) {
            return result;
        }
        self.settle(result).await
    }

    pub async fn set_active(&self, id: &EntityId, active: bool) -> Result<T, CoreError> {
        self.ensure_writable()?;
        self.loaded(id).await?;
        let result = self.inner.reconciler.set_active::<T>(id, active).await;
        if matches!(result, Err(CoreError::Unsupported { .. })) {
            return result;
        }
        self.settle(result).await
    }

    /// Flip the visibility flag of a loaded row.
    pub async fn toggle_active(&self, id: &EntityId) -> Result<T, CoreError> {
        self.ensure_writable()?;
        let row = self.loaded(id).await?;
        self.set_active(id, !row.is_active()).await
    }

    /// Delete a row. It disappears from the view immediately and its id
    /// is never written again.
    pub async fn delete(&self, id: &EntityId) -> Result<(), CoreError> {
        self.ensure_writable()?;
        self.loaded(id).await?;
        let result = self.inner.reconciler.delete::<T>(id).await;
        if result.is_ok() {
            self.inner.collection.remove(id);
        }
        self.settle(result).await
    }

    // ── Observation ──────────────────────────────────────────────────

    pub fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.inner.collection.snapshot()
    }

    pub fn get(&self, id: &EntityId) -> Option<Arc<T>> {
        self.inner.collection.get(id)
    }

    pub fn len(&self) -> usize {
        self.inner.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn status(&self) -> ViewStatus {
        self.inner.status.borrow().clone()
    }

    pub fn subscribe(&self) -> ViewStream<T> {
        ViewStream::new(self.inner.collection.subscribe(), self.inner.status.subscribe())
    }

    /// Rows bucketed by group key, groups in first-seen order.
    ///
    /// Ungrouped kinds return a single bucket under the empty key.
    pub fn grouped(&self) -> IndexMap<String, Vec<Arc<T>>> {
        let mut groups: IndexMap<String, Vec<Arc<T>>> = IndexMap::new();
        for row in self.snapshot().iter() {
            groups
                .entry(row.group().unwrap_or_default().to_owned())
                .or_default()
                .push(Arc::clone(row));
        }
        groups
    }

    // ── Internals ────────────────────────────────────────────────────

    fn ensure_mounted(&self) -> Result<(), CoreError> {
        if self.is_mounted() {
            Ok(())
        } else {
            Err(CoreError::NotMounted {
                collection: T::COLLECTION,
            })
        }
    }

    /// Public views are read-only.
    fn ensure_writable(&self) -> Result<(), CoreError> {
        self.ensure_mounted()?;
        if self.inner.options.visibility == Visibility::Public {
            return Err(CoreError::Unsupported {
                collection: T::COLLECTION,
                operation: "Writing through a public view",
            });
        }
        Ok(())
    }

    fn plan(&self, id: &EntityId, direction: MoveDirection) -> Result<MovePlan<T>, CoreError> {
        let target = self.inner.collection.get(id).ok_or_else(|| CoreError::NotFound {
            collection: T::COLLECTION,
            id: id.clone(),
        })?;
        let scope = self.inner.collection.group(target.group());
        plan_move(&scope, id, direction)
    }

    /// The loaded row behind `id`. A row missing from the view is stale:
    /// refetch and write nothing.
    async fn loaded(&self, id: &EntityId) -> Result<Arc<T>, CoreError> {
        match self.inner.collection.get(id) {
            Some(row) => Ok(row),
            None => {
                self.settle(Err(CoreError::NotFound {
                    collection: T::COLLECTION,
                    id: id.clone(),
                }))
                .await
            }
        }
    }

    /// Record the outcome of a write and refetch.
    async fn settle<R>(&self, result: Result<R, CoreError>) -> Result<R, CoreError> {
        match &result {
            Ok(_) => self.inner.status.send_if_modified(ViewStatus::clear_error),
            Err(e) => {
                warn!(collection = %T::COLLECTION, error = %e, "write failed, refetching");
                let message = e.to_string();
                self.inner
                    .status
                    .send_modify(|s| s.record_error(ErrorOrigin::Write, message));
                false
            }
        };
        if let Err(e) = self.load(Phase::Refreshing).await {
            debug!(collection = %T::COLLECTION, error = %e, "refetch after write failed");
        }
        result
    }

    async fn load(&self, phase: Phase) -> Result<(), CoreError> {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.status.send_modify(|s| s.phase = phase);

        let result = self
            .inner
            .backend
            .list_by_position::<T>(self.inner.options.visibility)
            .await;

        if self.inner.generation.load(Ordering::SeqCst) != generation || !self.is_mounted() {
            debug!(collection = %T::COLLECTION, "discarding stale response");
            return result.map(|_| ());
        }

        match result {
            Ok(rows) => {
                let count = rows.len();
                self.inner.collection.replace_all(rows);
                self.inner.status.send_modify(|s| {
                    // A write failure outlives the refetch that follows it.
                    if phase == Phase::Loading || s.error_origin == Some(ErrorOrigin::Fetch) {
                        s.clear_error();
                    }
                    s.phase = Phase::Ready;
                    s.last_refresh = Some(Utc::now());
                });
                debug!(collection = %T::COLLECTION, count, "collection loaded");
                Ok(())
            }
            Err(e) => {
                warn!(collection = %T::COLLECTION, error = %e, "fetch failed");
                let message = e.to_string();
                self.inner.status.send_modify(|s| {
                    s.phase = Phase::Error;
                    s.record_error(ErrorOrigin::Fetch, message);
                });
                Err(e)
            }
        }
    }

    fn set_feed(&self, feed: FeedState) {
        self.inner.status.send_if_modified(|s| {
            let changed = s.feed != feed;
            s.feed = feed;
            changed
        });
    }
}

impl<T: OrderedEntity, B: Backend> std::fmt::Debug for CollectionManager<T, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionManager")
            .field("collection", &T::COLLECTION)
            .field("mounted", &self.is_mounted())
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
