use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    Collection, Draft, EntityId, FieldPatch, Locale, OrderedEntity, active_by_default,
    default_active, require, require_if_set,
};
use crate::error::CoreError;

/// A bilingual question/answer pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faq {
    pub id: EntityId,
    pub question_it: String,
    pub question_en: String,
    pub answer_it: String,
    pub answer_en: String,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default = "default_active", deserialize_with = "active_by_default")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Faq {
    pub fn question(&self, locale: Locale) -> &str {
        locale.pick(&self.question_it, &self.question_en)
    }

    pub fn answer(&self, locale: Locale) -> &str {
        locale.pick(&self.answer_it, &self.answer_en)
    }
}

impl OrderedEntity for Faq {
    const COLLECTION: Collection = Collection::Faqs;
    const FIRST_POSITION: i64 = 0;
    const HAS_ACTIVE_FLAG: bool = true;

    type Draft = NewFaq;
    type Patch = FaqPatch;

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
        &self.question_en
    }
}

/// Insert payload for [`Faq`]. All four texts are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFaq {
    pub question_it: String,
    pub question_en: String,
    pub answer_it: String,
    pub answer_en: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl Draft for NewFaq {
    fn validate(&self) -> Result<(), CoreError> {
        require("question_it", &self.question_it)?;
        require("question_en", &self.question_en)?;
        require("answer_it", &self.answer_it)?;
        require("answer_en", &self.answer_en)
    }
}

/// Field edit for [`Faq`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_it: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_it: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_en: Option<String>,
}

impl FieldPatch for FaqPatch {
    fn validate(&self) -> Result<(), CoreError> {
        require_if_set("question_it", self.question_it.as_ref())?;
        require_if_set("question_en", self.question_en.as_ref())?;
        require_if_set("answer_it", self.answer_it.as_ref())?;
        require_if_set("answer_en", self.answer_en.as_ref())
    }
}
