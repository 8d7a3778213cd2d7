// ── Filter predicates for view streams ──
//
// Narrow a snapshot without another round trip to the backend.

use std::sync::Arc;

use crate::model::OrderedEntity;

/// Row predicate shared by every collection kind.
pub enum EntityFilter<T> {
    All,
    /// Rows shown on the public site.
    Active,
    /// Rows hidden from the public site.
    Inactive,
    /// Rows of one group (footer category).
    Group(String),
    Custom(Box<dyn Fn(&T) -> bool + Send + Sync>),
}

impl<T: OrderedEntity> EntityFilter<T> {
    pub fn matches(&self, row: &T) -> bool {
        match self {
            Self::All => true,
            Self::Active => row.is_active(),
            Self::Inactive => !row.is_active(),
            Self::Group(group) => row.group() == Some(group.as_str()),
            Self::Custom(f) => f(row),
        }
    }

    pub fn apply(&self, rows: &[Arc<T>]) -> Vec<Arc<T>> {
        rows.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

impl<T> std::fmt::Debug for EntityFilter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::Active => f.write_str("Active"),
            Self::Inactive => f.write_str("Inactive"),
            Self::Group(g) => f.debug_tuple("Group").field(g).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
