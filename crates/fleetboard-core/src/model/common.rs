// ── Shared vocabulary for every collection ──

use serde::{Deserialize, Serialize};

/// The four admin-ordered collections, named by their backend table.
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
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Collection {
    Members,
    BestGames,
    Faqs,
    FooterResources,
}

impl Collection {
    /// Backend table name.
    pub fn table(self) -> &'static str {
        self.into()
    }

    /// Singular human-readable noun, for messages.
    pub fn noun(self) -> &'static str {
        match self {
            Self::Members => "member",
            Self::BestGames => "game",
            Self::Faqs => "FAQ",
            Self::FooterResources => "footer resource",
        }
    }

    /// Look a collection up by its backend table name.
    pub fn from_table(table: &str) -> Option<Self> {
        table.parse().ok()
    }
}

/// Which rows a reader may see.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Visibility {
    /// Every row, active or not.
    #[default]
    Admin,
    /// Only rows with `is_active = true` (kinds without the flag: all rows).
    Public,
}

/// Display language for the localized text pairs.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
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
pub enum Locale {
    #[default]
    It,
    En,
}

impl Locale {
    /// Pick the half of an `(it, en)` pair for this locale.
    pub fn pick<'a>(self, it: &'a str, en: &'a str) -> &'a str {
        match self {
            Self::It => it,
            Self::En => en,
        }
    }
}

/// Footer resource grouping.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ResourceCategory {
    Links,
    Social,
    Legal,
    Support,
}

/// Body of a reorder write: the position column and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PositionPatch {
    pub position: i64,
}

/// Body of a visibility toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActivePatch {
    pub is_active: bool,
}
