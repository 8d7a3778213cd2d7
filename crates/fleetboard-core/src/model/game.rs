use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    Collection, Draft, EntityId, FieldPatch, Locale, OrderedEntity, image, require,
    require_if_set,
};
use crate::error::CoreError;

/// A showcased tournament game with a replay link.
///
/// Games have no visibility flag: every row is public.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: EntityId,
    pub tournament: String,
    pub phase: String,
    pub format: String,
    pub players: String,
    pub description_it: String,
    pub description_en: String,
    pub image_url: String,
    pub replay_url: String,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Game {
    pub fn description(&self, locale: Locale) -> &str {
        locale.pick(&self.description_it, &self.description_en)
    }

    pub fn thumbnail_url(&self) -> String {
        image::normalize_image_url(&self.image_url)
    }
}

impl OrderedEntity for Game {
    const COLLECTION: Collection = Collection::BestGames;
    const FIRST_POSITION: i64 = 1;

    type Draft = NewGame;
    type Patch = GamePatch;

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

    fn label(&self) -> &str {
        &self.players
    }
}

/// Insert payload for [`Game`]. Every field is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGame {
    pub tournament: String,
    pub phase: String,
    pub format: String,
    pub players: String,
    pub description_it: String,
    pub description_en: String,
    pub image_url: String,
    pub replay_url: String,
}

impl Draft for NewGame {
    fn validate(&self) -> Result<(), CoreError> {
        require("tournament", &self.tournament)?;
        require("phase", &self.phase)?;
        require("format", &self.format)?;
        require("players", &self.players)?;
        require("description_it", &self.description_it)?;
        require("description_en", &self.description_en)?;
        require("image_url", &self.image_url)?;
        require("replay_url", &self.replay_url)
    }
}

/// Field edit for [`Game`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tournament: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub players: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_it: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replay_url: Option<String>,
}

impl FieldPatch for GamePatch {
    fn validate(&self) -> Result<(), CoreError> {
        require_if_set("tournament", self.tournament.as_ref())?;
        require_if_set("phase", self.phase.as_ref())?;
        require_if_set("format", self.format.as_ref())?;
        require_if_set("players", self.players.as_ref())?;
        require_if_set("description_it", self.description_it.as_ref())?;
        require_if_set("description_en", self.description_en.as_ref())?;
        require_if_set("image_url", self.image_url.as_ref())?;
        require_if_set("replay_url", self.replay_url.as_ref())
    }
}
