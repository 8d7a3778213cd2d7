// ── In-process backend ──
//
// Keeps rows as JSON objects per collection, applies writes the way the
// REST table API would, and publishes a change notification after every
// successful write. Fault switches let tests fail individual calls.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, RwLock, broadcast};
use tracing::debug;

use super::{Backend, ChangeEvent, ChangeFeed, ChangeKind};
use crate::error::CoreError;
use crate::model::{Collection, EntityId, OrderedEntity, Visibility};
use crate::order::sort_rows;

const FEED_CAPACITY: usize = 64;

#[derive(Debug, Default)]
struct Faults {
    fail_updates: HashSet<EntityId>,
    fail_lists: u32,
    fail_inserts: u32,
    fail_deletes: u32,
    lose_insert_acks: u32,
    write_delay: Option<Duration>,
    list_delay: Option<Duration>,
}

/// [`Backend`] that lives entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: RwLock<HashMap<Collection, Vec<Map<String, Value>>>>,
    feeds: DashMap<Collection, broadcast::Sender<Arc<ChangeEvent>>>,
    faults: Mutex<Faults>,
    writes: AtomicUsize,
    failing_subscribes: AtomicU32,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Fixtures ─────────────────────────────────────────────────────

    /// Store rows as-is, without notifying subscribers.
    pub async fn seed<T: OrderedEntity>(&self, rows: impl IntoIterator<Item = T>) {
        let mut tables = self.tables.write().await;
        let table = tables.entry(T::COLLECTION).or_default();
        for row in rows {
            if let Ok(Value::Object(map)) = serde_json::to_value(&row) {
                table.push(map);
            }
        }
    }

    /// Every stored row of `T`, in position order.
    pub async fn rows<T: OrderedEntity>(&self) -> Vec<T> {
        let tables = self.tables.read().await;
        let mut rows: Vec<T> = tables
            .get(&T::COLLECTION)
            .map(|table| {
                table
                    .iter()
                    .filter_map(|row| serde_json::from_value(Value::Object(row.clone())).ok())
                    .collect()
            })
            .unwrap_or_default();
        sort_rows(&mut rows);
        rows
    }

    /// Number of insert/update/delete calls received, failed ones included.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Publish a change as if another session had written.
    pub fn notify(&self, collection: Collection, kind: ChangeKind) {
        if let Some(tx) = self.feeds.get(&collection) {
            let _ = tx.send(Arc::new(ChangeEvent {
                table: collection.table().to_owned(),
                kind,
                commit_timestamp: Some(Utc::now().to_rfc3339()),
            }));
        }
    }

    /// Drop the feed source for `collection`; subscribers see it close.
    pub fn close_feeds(&self, collection: Collection) {
        self.feeds.remove(&collection);
    }

    // ── Fault injection ──────────────────────────────────────────────

    /// The next update addressed to `id` fails.
    pub async fn fail_next_update(&self, id: &EntityId) {
        self.faults.lock().await.fail_updates.insert(id.clone());
    }

    pub async fn fail_next_lists(&self, count: u32) {
        self.faults.lock().await.fail_lists = count;
    }

    pub async fn fail_next_inserts(&self, count: u32) {
        self.faults.lock().await.fail_inserts = count;
    }

    pub async fn fail_next_deletes(&self, count: u32) {
        self.faults.lock().await.fail_deletes = count;
    }

    /// The next inserts are stored but reported as timed out.
    pub async fn lose_next_insert_acks(&self, count: u32) {
        self.faults.lock().await.lose_insert_acks = count;
    }

    /// Delay every write by `delay` before applying it.
    pub async fn set_write_delay(&self, delay: Option<Duration>) {
        self.faults.lock().await.write_delay = delay;
    }

    /// Delay every listing by `delay` before reading the table.
    pub async fn set_list_delay(&self, delay: Option<Duration>) {
        self.faults.lock().await.list_delay = delay;
    }

    pub fn fail_next_subscribes(&self, count: u32) {
        self.failing_subscribes.store(count, Ordering::SeqCst);
    }

    // ── Helpers ──────────────────────────────────────────────────────

    async fn begin_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let delay = self.faults.lock().await.write_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn injected(collection: Collection, operation: &'static str) -> CoreError {
        CoreError::WriteFailed {
            collection,
            operation,
            reason: "injected failure".into(),
        }
    }

    fn decode<T: OrderedEntity>(row: &Map<String, Value>) -> Result<T, CoreError> {
        serde_json::from_value(Value::Object(row.clone())).map_err(|e| {
            CoreError::Internal(format!("stored {} row does not decode: {e}", T::COLLECTION))
        })
    }

    fn to_object(value: &impl Serialize) -> Result<Map<String, Value>, CoreError> {
        match serde_json::to_value(value) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(CoreError::Internal(format!("expected an object, got {other}"))),
            Err(e) => Err(CoreError::Internal(e.to_string())),
        }
    }

    fn matches_id(row: &Map<String, Value>, id: &EntityId) -> bool {
        row.get("id").and_then(Value::as_str) == Some(id.to_string().as_str())
    }

    fn take_one(counter: &mut u32) -> bool {
        if *counter > 0 {
            *counter -= 1;
            true
        } else {
            false
        }
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn list_by_position<T: OrderedEntity>(
        &self,
        visibility: Visibility,
    ) -> Result<Vec<T>, CoreError> {
        let delay = {
            let mut faults = self.faults.lock().await;
            if Self::take_one(&mut faults.fail_lists) {
                return Err(CoreError::ConnectionFailed {
                    url: "memory://".into(),
                    reason: "injected failure".into(),
                });
            }
            faults.list_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let tables = self.tables.read().await;
        let mut rows = Vec::new();
        for row in tables.get(&T::COLLECTION).into_iter().flatten() {
            let row: T = Self::decode(row)?;
            if visibility == Visibility::Public && T::HAS_ACTIVE_FLAG && !row.is_active() {
                continue;
            }
            rows.push(row);
        }
        sort_rows(&mut rows);
        Ok(rows)
    }

    async fn insert<T: OrderedEntity>(
        &self,
        id: &EntityId,
        draft: &T::Draft,
        position: i64,
    ) -> Result<T, CoreError> {
        self.begin_write().await;
        let lose_ack = {
            let mut faults = self.faults.lock().await;
            if Self::take_one(&mut faults.fail_inserts) {
                return Err(Self::injected(T::COLLECTION, "insert"));
            }
            Self::take_one(&mut faults.lose_insert_acks)
        };

        let mut row = Self::to_object(draft)?;
        row.insert("id".into(), serde_json::to_value(id).map_err(|e| CoreError::Internal(e.to_string()))?);
        row.insert("position".into(), Value::from(position));
        row.insert("created_at".into(), Value::String(Utc::now().to_rfc3339()));
        let stored: T = Self::decode(&row)?;

        {
            let mut tables = self.tables.write().await;
            let table = tables.entry(T::COLLECTION).or_default();
            if table.iter().any(|existing| Self::matches_id(existing, id)) {
                return Err(CoreError::Conflict {
                    collection: T::COLLECTION,
                    id: id.clone(),
                });
            }
            table.push(row);
        }

        debug!(collection = %T::COLLECTION, %id, position, "memory insert");
        self.notify(T::COLLECTION, ChangeKind::Insert);

        if lose_ack {
            return Err(CoreError::Timeout { timeout_secs: 0 });
        }
        Ok(stored)
    }

    async fn update_fields<T, P>(&self, id: &EntityId, patch: &P) -> Result<T, CoreError>
    where
        T: OrderedEntity,
        P: Serialize + Send + Sync,
    {
        self.begin_write().await;
        if self.faults.lock().await.fail_updates.remove(id) {
            return Err(Self::injected(T::COLLECTION, "update"));
        }

        let changes = Self::to_object(patch)?;
        let updated: T = {
            let mut tables = self.tables.write().await;
            let row = tables
                .get_mut(&T::COLLECTION)
                .and_then(|table| table.iter_mut().find(|row| Self::matches_id(row, id)))
                .ok_or_else(|| CoreError::NotFound {
                    collection: T::COLLECTION,
                    id: id.clone(),
                })?;

            let mut candidate = row.clone();
            for (column, value) in changes {
                candidate.insert(column, value);
            }
            if candidate.contains_key("updated_at") {
                candidate.insert("updated_at".into(), Value::String(Utc::now().to_rfc3339()));
            }
            let decoded = Self::decode(&candidate)?;
            *row = candidate;
            decoded
        };

        debug!(collection = %T::COLLECTION, %id, "memory update");
        self.notify(T::COLLECTION, ChangeKind::Update);
        Ok(updated)
    }

    async fn delete<T: OrderedEntity>(&self, id: &EntityId) -> Result<(), CoreError> {
        self.begin_write().await;
        if Self::take_one(&mut self.faults.lock().await.fail_deletes) {
            return Err(Self::injected(T::COLLECTION, "delete"));
        }

        let removed = {
            let mut tables = self.tables.write().await;
            tables.get_mut(&T::COLLECTION).is_some_and(|table| {
                let before = table.len();
                table.retain(|row| !Self::matches_id(row, id));
                table.len() < before
            })
        };

        if removed {
            debug!(collection = %T::COLLECTION, %id, "memory delete");
            self.notify(T::COLLECTION, ChangeKind::Delete);
        }
        Ok(())
    }

    fn subscribe(&self, collection: Collection) -> Result<ChangeFeed, CoreError> {
        let failing = self
            .failing_subscribes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(CoreError::Subscription {
                collection,
                reason: "injected failure".into(),
            });
        }

        let rx = self
            .feeds
            .entry(collection)
            .or_insert_with(|| broadcast::channel(FEED_CAPACITY).0)
            .subscribe();
        Ok(ChangeFeed::new(collection, rx, None))
    }
}
