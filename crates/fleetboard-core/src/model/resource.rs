use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    Collection, Draft, EntityId, FieldPatch, Locale, OrderedEntity, ResourceCategory,
    active_by_default, default_active, require, require_if_set, require_link,
};
use crate::error::CoreError;

/// A footer link, grouped by category and ordered within it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FooterResource {
    pub id: EntityId,
    pub title_it: String,
    pub title_en: String,
    pub url: String,
    #[serde(default)]
    pub icon: Option<String>,
    pub category: String,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default = "default_active", deserialize_with = "active_by_default")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl FooterResource {
    pub fn title(&self, locale: Locale) -> &str {
        locale.pick(&self.title_it, &self.title_en)
    }

    /// Known category, if the stored text is one.
    pub fn category_kind(&self) -> Option<ResourceCategory> {
        self.category.parse().ok()
    }
}

impl OrderedEntity for FooterResource {
    const COLLECTION: Collection = Collection::FooterResources;
    const FIRST_POSITION: i64 = 0;
    const GROUP_COLUMN: Option<&'static str> = Some("category");
    const HAS_ACTIVE_FLAG: bool = true;

    type Draft = NewFooterResource;
    type Patch = FooterResourcePatch;

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

    fn group(&self) -> Option<&str> {
        Some(&self.category)
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }

    fn label(&self) -> &str {
        &self.title_en
    }
}

/// Insert payload for [`FooterResource`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFooterResource {
    pub title_it: String,
    pub title_en: String,
    pub url: String,
    #[serde(default)]
    pub icon: Option<String>,
    pub category: ResourceCategory,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl Draft for NewFooterResource {
    fn validate(&self) -> Result<(), CoreError> {
        require("title_it", &self.title_it)?;
        require("title_en", &self.title_en)?;
        require_link("url", &self.url)
    }

    fn group(&self) -> Option<&str> {
        Some(self.category.as_ref())
    }
}

/// Field edit for [`FooterResource`].
///
/// Changing `category` keeps the stored position; the row lands in its
/// new group at whatever rank that number gives it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FooterResourcePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_it: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ResourceCategory>,
}

impl FieldPatch for FooterResourcePatch {
    fn validate(&self) -> Result<(), CoreError> {
        require_if_set("title_it", self.title_it.as_ref())?;
        require_if_set("title_en", self.title_en.as_ref())?;
        match &self.url {
            Some(url) => require_link("url", url),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn draft(url: &str) -> NewFooterResource {
        NewFooterResource {
            title_it: "Regolamento".into(),
            title_en: "Rules".into(),
            url: url.into(),
            icon: None,
            category: ResourceCategory::Legal,
            is_active: true,
        }
    }

    #[test]
    fn draft_group_is_category() {
        assert_eq!(draft("/rules").group(), Some("legal"));
    }

    #[test]
    fn url_must_be_absolute_or_rooted() {
        assert!(draft("https://discord.gg/fleet").validate().is_ok());
        assert!(draft("/privacy").validate().is_ok());
        assert!(draft("discord dot gg").validate().is_err());
        assert!(draft("").validate().is_err());
    }

    #[test]
    fn draft_serializes_category_as_text() {
        let body = serde_json::to_value(draft("/rules")).unwrap();
        assert_eq!(body["category"], json!("legal"));
        assert_eq!(body["is_active"], json!(true));
    }

    #[test]
    fn unknown_stored_category_still_loads() {
        let row: FooterResource = serde_json::from_value(json!({
            "id": "r1",
            "title_it": "Vecchio",
            "title_en": "Old",
            "url": "/old",
            "category": "archive",
            "position": 0,
            "is_active": null
        }))
        .unwrap();

        assert_eq!(row.group(), Some("archive"));
        assert_eq!(row.category_kind(), None);
        assert!(row.is_active);
    }
}
