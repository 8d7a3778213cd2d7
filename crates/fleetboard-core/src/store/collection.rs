// ── Ordered reactive collection ──
//
// Concurrent id lookups through a `DashMap`, and a position-sorted
// snapshot broadcast through a `watch` channel after every mutation.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

use crate::model::{EntityId, OrderedEntity};
use crate::order::sort_by_position;

pub(crate) type Snapshot<T> = Arc<Vec<Arc<T>>>;

/// The in-memory list behind one manager.
pub(crate) struct OrderedCollection<T: OrderedEntity> {
    by_id: DashMap<EntityId, Arc<T>>,

    /// Sorted snapshot, rebuilt on mutation.
    snapshot: watch::Sender<Snapshot<T>>,
}

impl<T: OrderedEntity> OrderedCollection<T> {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            by_id: DashMap::new(),
            snapshot,
        }
    }

    /// Replace the contents with an authoritative listing.
    ///
    /// Rows missing from `rows` are pruned; unchanged rows are still
    /// replaced, so optimistic positions never survive a refetch.
    pub(crate) fn replace_all(&self, rows: Vec<T>) {
        let keep: HashSet<EntityId> = rows.iter().map(|r| r.id().clone()).collect();
        for row in rows {
            self.by_id.insert(row.id().clone(), Arc::new(row));
        }
        self.by_id.retain(|id, _| keep.contains(id));
        self.rebuild_snapshot();
    }

    /// Overwrite the position of each listed row that is still present.
    /// Returns how many rows changed.
    pub(crate) fn apply_positions(&self, assignments: &[(EntityId, i64)]) -> usize {
        let mut changed = 0;
        for (id, position) in assignments {
            if let Some(mut entry) = self.by_id.get_mut(id) {
                let mut row = T::clone(entry.value());
                row.set_position(*position);
                *entry.value_mut() = Arc::new(row);
                changed += 1;
            }
        }
        if changed > 0 {
            self.rebuild_snapshot();
        }
        changed
    }

    pub(crate) fn remove(&self, id: &EntityId) -> Option<Arc<T>> {
        let removed = self.by_id.remove(id).map(|(_, v)| v);
        if removed.is_some() {
            self.rebuild_snapshot();
        }
        removed
    }

    pub(crate) fn get(&self, id: &EntityId) -> Option<Arc<T>> {
        self.by_id.get(id).map(|r| Arc::clone(r.value()))
    }

    /// Current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Snapshot<T> {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.snapshot.subscribe()
    }

    /// Sorted rows sharing `group`. Ungrouped kinds pass `None` and get
    /// the whole list.
    pub(crate) fn group(&self, group: Option<&str>) -> Vec<Arc<T>> {
        self.snapshot()
            .iter()
            .filter(|row| row.group() == group)
            .cloned()
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    fn rebuild_snapshot(&self) {
        let mut values: Vec<Arc<T>> = self.by_id.iter().map(|r| Arc::clone(r.value())).collect();
        sort_by_position(&mut values);
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::Faq;
    use crate::order::testing::{faq, ids, resource};

    #[test]
    fn replace_all_sorts_and_prunes() {
        let col: OrderedCollection<Faq> = OrderedCollection::new();
        col.replace_all(vec![faq("b", Some(2)), faq("a", Some(1)), faq("gone", Some(0))]);
        assert_eq!(ids(&col.snapshot()), vec!["gone", "a", "b"]);

        col.replace_all(vec![faq("b", Some(2)), faq("a", Some(1))]);
        assert_eq!(ids(&col.snapshot()), vec!["a", "b"]);
        assert!(col.get(&EntityId::from("gone")).is_none());
        assert_eq!(col.len(), 2);
    }

    #[test]
    fn apply_positions_resorts() {
        let col: OrderedCollection<Faq> = OrderedCollection::new();
        col.replace_all(vec![faq("a", Some(1)), faq("b", Some(2)), faq("c", Some(3))]);

        let changed = col.apply_positions(&[
            (EntityId::from("a"), 2),
            (EntityId::from("b"), 1),
            (EntityId::from("missing"), 9),
        ]);
        assert_eq!(changed, 2);
        assert_eq!(ids(&col.snapshot()), vec!["b", "a", "c"]);
    }

    #[test]
    fn refetch_discards_optimistic_positions() {
        let col: OrderedCollection<Faq> = OrderedCollection::new();
        col.replace_all(vec![faq("a", Some(1)), faq("b", Some(2))]);
        col.apply_positions(&[(EntityId::from("a"), 5)]);

        col.replace_all(vec![faq("a", Some(1)), faq("b", Some(2))]);
        assert_eq!(col.get(&EntityId::from("a")).unwrap().position, Some(1));
    }

    #[test]
    fn remove_rebuilds_snapshot() {
        let col: OrderedCollection<Faq> = OrderedCollection::new();
        col.replace_all(vec![faq("a", Some(1)), faq("b", Some(2))]);
        assert!(col.remove(&EntityId::from("a")).is_some());
        assert!(col.remove(&EntityId::from("a")).is_none());
        assert_eq!(ids(&col.snapshot()), vec!["b"]);
    }

    #[test]
    fn group_narrows_to_one_category() {
        let col = OrderedCollection::new();
        col.replace_all(vec![
            resource("tw", "social", 1),
            resource("docs", "links", 0),
            resource("yt", "social", 0),
        ]);
        assert_eq!(ids(&col.group(Some("social"))), vec!["yt", "tw"]);
        assert_eq!(ids(&col.group(Some("legal"))), Vec::<String>::new());
    }

    #[tokio::test]
    async fn subscribers_see_new_snapshots() {
        let col: OrderedCollection<Faq> = OrderedCollection::new();
        let mut rx = col.subscribe();
        col.replace_all(vec![faq("a", Some(1))]);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().len(), 1);
    }
}
