// ── Swap planning ──
//
// A move exchanges the position values of two neighbours in the sorted
// list. Only those two rows change, and only their `position`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::comparator::effective_position;
use crate::error::CoreError;
use crate::model::{EntityId, OrderedEntity};

/// Direction of a single-step move.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MoveDirection {
    Up,
    Down,
}

impl MoveDirection {
    pub fn reversed(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }
}

/// The two rows of a swap, each already carrying its new position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapPlan<T> {
    /// The row that was earlier in the list before the move.
    pub earlier: T,
    /// The row that was later in the list before the move.
    pub later: T,
}

impl<T: OrderedEntity> SwapPlan<T> {
    /// `(id, new position)` for both rows.
    pub fn assignments(&self) -> [(EntityId, i64); 2] {
        [
            (self.earlier.id().clone(), effective_position(&self.earlier)),
            (self.later.id().clone(), effective_position(&self.later)),
        ]
    }
}

/// Outcome of planning a move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovePlan<T> {
    /// Boundary move: nothing to write.
    NoOp,
    Swap(SwapPlan<T>),
}

impl<T> MovePlan<T> {
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::NoOp)
    }
}

/// Plan moving `target` one step in `direction`.
///
/// `list` must be sorted and already narrowed to the target's group. The
/// input is never modified; the returned rows are copies with their
/// positions exchanged. Equal positions are exchanged as-is (a no-change
/// write pair); the comparator's tie-break keeps the order stable.
pub fn plan_move<T: OrderedEntity>(
    list: &[Arc<T>],
    target: &EntityId,
    direction: MoveDirection,
) -> Result<MovePlan<T>, CoreError> {
    let index = list
        .iter()
        .position(|e| e.id() == target)
        .ok_or_else(|| CoreError::NotFound {
            collection: T::COLLECTION,
            id: target.clone(),
        })?;

    let neighbour = match direction {
        MoveDirection::Up => index.checked_sub(1),
        MoveDirection::Down => index.checked_add(1).filter(|&i| i < list.len()),
    };
    let Some(neighbour) = neighbour else {
        return Ok(MovePlan::NoOp);
    };

    let (first, second) = if neighbour < index {
        (neighbour, index)
    } else {
        (index, neighbour)
    };
    let (Some(a), Some(b)) = (list.get(first), list.get(second)) else {
        return Ok(MovePlan::NoOp);
    };

    let mut earlier = T::clone(a);
    let mut later = T::clone(b);
    earlier.set_position(effective_position(b.as_ref()));
    later.set_position(effective_position(a.as_ref()));

    Ok(MovePlan::Swap(SwapPlan { earlier, later }))
}

/// Position for a row appended to `group` (or the whole list when the
/// kind is ungrouped): one past the largest effective position, or the
/// kind's first position when the group is empty.
pub fn next_position<T: OrderedEntity>(list: &[Arc<T>], group: Option<&str>) -> i64 {
    list.iter()
        .filter(|e| e.group() == group)
        .map(|e| effective_position(e.as_ref()))
        .max()
        .map_or(T::FIRST_POSITION, |max| {
            max.saturating_add(1).max(T::FIRST_POSITION)
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{Faq, FooterResource, Game, Member};
    use crate::order::sort_by_position;
    use crate::order::testing::{faq, ids, list, resource};

    fn abc() -> Vec<Arc<Faq>> {
        list(vec![faq("A", Some(1)), faq("B", Some(2)), faq("C", Some(3))])
    }

    fn apply(items: &[Arc<Faq>], plan: MovePlan<Faq>) -> Vec<Arc<Faq>> {
        let MovePlan::Swap(swap) = plan else {
            return items.to_vec();
        };
        let mut out: Vec<Arc<Faq>> = items
            .iter()
            .map(|e| {
                if e.id == swap.earlier.id {
                    Arc::new(swap.earlier.clone())
                } else if e.id == swap.later.id {
                    Arc::new(swap.later.clone())
                } else {
                    Arc::clone(e)
                }
            })
            .collect();
        sort_by_position(&mut out);
        out
    }

    #[test]
    fn move_up_swaps_with_previous() {
        let items = abc();
        let plan = plan_move(&items, &EntityId::from("B"), MoveDirection::Up).unwrap();

        let MovePlan::Swap(swap) = &plan else {
            panic!("expected a swap, got {plan:?}");
        };
        assert_eq!(swap.earlier.id, EntityId::from("A"));
        assert_eq!(swap.earlier.position, Some(2));
        assert_eq!(swap.later.id, EntityId::from("B"));
        assert_eq!(swap.later.position, Some(1));

        assert_eq!(ids(&apply(&items, plan)), vec!["B", "A", "C"]);
    }

    #[test]
    fn input_is_left_untouched() {
        let items = abc();
        let _ = plan_move(&items, &EntityId::from("B"), MoveDirection::Down).unwrap();
        assert_eq!(items[1].position, Some(2));
        assert_eq!(items[2].position, Some(3));
    }

    #[test]
    fn boundaries_are_noops() {
        let items = abc();
        assert!(plan_move(&items, &EntityId::from("A"), MoveDirection::Up).unwrap().is_noop());
        assert!(plan_move(&items, &EntityId::from("C"), MoveDirection::Down).unwrap().is_noop());

        let single = list(vec![faq("only", Some(0))]);
        assert!(plan_move(&single, &EntityId::from("only"), MoveDirection::Up).unwrap().is_noop());
        assert!(plan_move(&single, &EntityId::from("only"), MoveDirection::Down).unwrap().is_noop());
    }

    #[test]
    fn missing_target_is_not_found() {
        let err = plan_move(&abc(), &EntityId::from("Z"), MoveDirection::Up).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[test]
    fn swap_permutes_the_position_multiset() {
        let items = list(vec![faq("A", Some(0)), faq("B", Some(7)), faq("C", Some(40))]);
        let MovePlan::Swap(swap) = plan_move(&items, &EntityId::from("C"), MoveDirection::Up).unwrap()
        else {
            panic!("expected swap");
        };
        let mut before = vec![7, 40];
        let mut after = vec![swap.earlier.position.unwrap(), swap.later.position.unwrap()];
        before.sort_unstable();
        after.sort_unstable();
        assert_eq!(before, after);
    }

    #[test]
    fn up_then_down_restores_order() {
        let items = list(vec![
            faq("A", Some(1)),
            faq("B", Some(2)),
            faq("C", Some(3)),
            faq("D", Some(4)),
        ]);
        let target = EntityId::from("C");

        let once = apply(&items, plan_move(&items, &target, MoveDirection::Up).unwrap());
        let back = apply(&once, plan_move(&once, &target, MoveDirection::Down).unwrap());

        assert_eq!(ids(&back), ids(&items));
        let positions: Vec<_> = back.iter().map(|f| f.position).collect();
        assert_eq!(positions, vec![Some(1), Some(2), Some(3), Some(4)]);
    }

    #[test]
    fn null_positions_are_written_as_zero() {
        let items = list(vec![faq("A", None), faq("B", Some(5))]);
        let MovePlan::Swap(swap) = plan_move(&items, &EntityId::from("B"), MoveDirection::Up).unwrap()
        else {
            panic!("expected swap");
        };
        assert_eq!(swap.earlier.position, Some(5));
        assert_eq!(swap.later.position, Some(0));
    }

    #[test]
    fn next_position_appends() {
        let items = abc();
        assert_eq!(next_position(&items, None), 4);
    }

    #[test]
    fn next_position_on_empty_uses_first_position() {
        assert_eq!(next_position::<Member>(&[], None), 1);
        assert_eq!(next_position::<Game>(&[], None), 1);
        assert_eq!(next_position::<Faq>(&[], None), 0);
        assert_eq!(next_position::<FooterResource>(&[], Some("links")), 0);
    }

    #[test]
    fn next_position_is_scoped_to_group() {
        let items = list(vec![
            resource("priv", "legal", 0),
            resource("tos", "legal", 1),
            resource("tw", "social", 9),
        ]);
        assert_eq!(next_position(&items, Some("legal")), 2);
        assert_eq!(next_position(&items, Some("social")), 10);
        assert_eq!(next_position(&items, Some("support")), 0);
    }

    #[test]
    fn direction_parses_and_reverses() {
        assert_eq!("UP".parse::<MoveDirection>().unwrap(), MoveDirection::Up);
        assert_eq!(MoveDirection::Up.reversed(), MoveDirection::Down);
    }
}
