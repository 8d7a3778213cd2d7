// ── Domain model ──
//
// Row types for the four ordered collections, their insert drafts and
// field patches, and the `OrderedEntity` contract the ordering core is
// written against.

mod common;
mod entity_id;
mod faq;
mod game;
pub mod image;
mod member;
mod resource;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;

pub use common::{ActivePatch, Collection, Locale, PositionPatch, ResourceCategory, Visibility};
pub use entity_id::EntityId;
pub use faq::{Faq, FaqPatch, NewFaq};
pub use game::{Game, GamePatch, NewGame};
pub use member::{Member, MemberPatch, NewMember, parse_achievements};
pub use resource::{FooterResource, FooterResourcePatch, NewFooterResource};

/// A row kept in a user-controlled display order.
///
/// Only `id`, `position`, the group key and the active flag matter to the
/// ordering core; everything else is payload.
pub trait OrderedEntity:
    Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Backing collection.
    const COLLECTION: Collection;

    /// Position given to the first row of an empty collection (or group).
    const FIRST_POSITION: i64;

    /// Column that partitions positions, if any.
    const GROUP_COLUMN: Option<&'static str> = None;

    /// Whether rows carry an `is_active` visibility flag.
    const HAS_ACTIVE_FLAG: bool = false;

    type Draft: Draft;
    type Patch: FieldPatch;

    fn id(&self) -> &EntityId;

    /// Persisted rank; `None` is ordered as `0`.
    fn position(&self) -> Option<i64>;

    fn set_position(&mut self, position: i64);

    fn created_at(&self) -> Option<DateTime<Utc>>;

    /// Value of [`GROUP_COLUMN`](Self::GROUP_COLUMN) for this row.
    fn group(&self) -> Option<&str> {
        None
    }

    fn is_active(&self) -> bool {
        true
    }

    fn set_active(&mut self, _active: bool) {}

    /// Short human label (name, title, question).
    fn label(&self) -> &str;
}

/// Insert payload for an [`OrderedEntity`]. Never carries id or position.
pub trait Draft: Serialize + Clone + fmt::Debug + Send + Sync + 'static {
    fn validate(&self) -> Result<(), CoreError>;

    /// Group the new row will belong to.
    fn group(&self) -> Option<&str> {
        None
    }
}

/// Field edit for an [`OrderedEntity`]. Has no position field, so an edit
/// can never move a row.
pub trait FieldPatch: Serialize + Clone + fmt::Debug + Default + Send + Sync + 'static {
    /// Reject edits that would blank a required field.
    fn validate(&self) -> Result<(), CoreError> {
        Ok(())
    }

    /// True if no field is set.
    fn is_empty(&self) -> bool {
        serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_object().map(serde_json::Map::is_empty))
            .unwrap_or(true)
    }
}

// ── Validation helpers ───────────────────────────────────────────────

pub(crate) fn require(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        Err(CoreError::validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}

pub(crate) fn require_if_set(field: &str, value: Option<&String>) -> Result<(), CoreError> {
    value.map_or(Ok(()), |v| require(field, v))
}

/// Accept absolute URLs and site-relative paths.
pub(crate) fn require_link(field: &str, value: &str) -> Result<(), CoreError> {
    require(field, value)?;
    if value.starts_with('/') || url::Url::parse(value).is_ok() {
        Ok(())
    } else {
        Err(CoreError::validation(format!(
            "{field} must be an absolute URL or a path starting with '/': {value:?}"
        )))
    }
}

// ── Serde helpers ────────────────────────────────────────────────────

/// Treat an explicit `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Visibility flags default to on when missing or null.
pub(crate) fn active_by_default<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

pub(crate) fn default_active() -> bool {
    true
}
