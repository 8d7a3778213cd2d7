use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    Collection, Draft, EntityId, FieldPatch, OrderedEntity, active_by_default, default_active,
    image, null_as_default, require, require_if_set,
};
use crate::error::CoreError;

/// A clan member shown on the team page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: EntityId,
    pub name: String,
    pub image: String,
    pub role: String,
    #[serde(default)]
    pub join_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub smogon: Option<String>,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default = "default_active", deserialize_with = "active_by_default")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Member {
    /// Portrait URL ready for display.
    pub fn portrait_url(&self) -> String {
        image::normalize_image_url(&self.image)
    }
}

impl OrderedEntity for Member {
    const COLLECTION: Collection = Collection::Members;
    const FIRST_POSITION: i64 = 1;
    const HAS_ACTIVE_FLAG: bool = true;

    type Draft = NewMember;
    type Patch = MemberPatch;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn position(&self) -> Option<i64> {
        self.position
    }

    fn set_position(&mut self, position: i64) {
        self.position = Some(position);
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }

    fn label(&self) -> &str {
        &self.name
    }
}

/// Insert payload for [`Member`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMember {
    pub name: String,
    pub image: String,
    pub role: String,
    pub join_date: String,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub smogon: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl Draft for NewMember {
    fn validate(&self) -> Result<(), CoreError> {
        require("name", &self.name)?;
        require("image", &self.image)?;
        require("role", &self.role)?;
        require("join_date", &self.join_date)
    }
}

/// Field edit for [`Member`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub achievements: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smogon: Option<String>,
}

impl FieldPatch for MemberPatch {
    fn validate(&self) -> Result<(), CoreError> {
        require_if_set("name", self.name.as_ref())?;
        require_if_set("image", self.image.as_ref())?;
        require_if_set("role", self.role.as_ref())
    }
}

/// Split a multi-line achievements field into trimmed, non-empty entries.
pub fn parse_achievements(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
