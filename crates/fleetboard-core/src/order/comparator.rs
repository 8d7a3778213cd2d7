use std::cmp::Ordering;
use std::sync::Arc;

use crate::model::OrderedEntity;

/// Position used for ordering; a missing position counts as `0`.
pub fn effective_position<T: OrderedEntity>(entity: &T) -> i64 {
    entity.position().unwrap_or(0)
}

/// Total order over rows of one collection.
///
/// Group key first (so grouped kinds list group by group), then position,
/// then creation time, then id. Duplicate positions therefore still sort
/// the same way on every reload.
pub fn compare<T: OrderedEntity>(a: &T, b: &T) -> Ordering {
    a.group()
        .cmp(&b.group())
        .then_with(|| effective_position(a).cmp(&effective_position(b)))
        .then_with(|| a.created_at().cmp(&b.created_at()))
        .then_with(|| a.id().cmp(b.id()))
}

/// Stable sort of a snapshot by [`compare`].
pub fn sort_by_position<T: OrderedEntity>(items: &mut [Arc<T>]) {
    items.sort_by(|a, b| compare(a.as_ref(), b.as_ref()));
}

/// Stable sort of owned rows by [`compare`].
pub fn sort_rows<T: OrderedEntity>(items: &mut [T]) {
    items.sort_by(compare);
}
