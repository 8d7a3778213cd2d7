// ── Ordering core ──
//
// Pure functions over sorted snapshots. Nothing here performs I/O.

mod comparator;
mod planner;

pub use comparator::{compare, effective_position, sort_by_position, sort_rows};
pub use planner::{MoveDirection, MovePlan, SwapPlan, next_position, plan_move};
