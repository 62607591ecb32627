use crate::schema::RecordSchema;
use crate::template::scalar_text;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Stable identity of a record, derived from its natural key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId(s)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId(s.to_string())
    }
}

/// Which derived label a filter reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    Category,
    Location,
    Era,
}

/// Labels extracted from display fields at load time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordTags {
    pub category: Option<String>,
    pub location: Option<String>,
    pub era: Option<String>,
}

impl RecordTags {
    pub fn get(&self, kind: TagKind) -> Option<&str> {
        match kind {
            TagKind::Category => self.category.as_deref(),
            TagKind::Location => self.location.as_deref(),
            TagKind::Era => self.era.as_deref(),
        }
    }
}

/// A single immutable knowledge item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    id: RecordId,
    display: Map<String, Value>,
    search_text: String,
    tags: RecordTags,
}

impl Record {
    /// Build a record from its display payload. Identity, search text and
    /// tags are all derived through `schema`.
    #[must_use]
    pub fn from_display(schema: &RecordSchema, display: Map<String, Value>) -> Self {
        Self {
            id: RecordId(schema.natural_key(&display)),
            search_text: schema.search_text(&display),
            tags: schema.tags(&display),
            display,
        }
    }

    /// A bare sentence record, keyed by the sentence itself.
    #[must_use]
    pub fn from_sentence(sentence: &str) -> Self {
        let mut display = Map::new();
        display.insert("text".to_string(), Value::String(sentence.to_string()));
        Self::from_display(&RecordSchema::plain_text(), display)
    }

    pub(crate) fn with_id(mut self, id: RecordId) -> Self {
        self.id = id;
        self
    }

    #[inline]
    pub fn id(&self) -> &RecordId {
        &self.id
    }

    #[inline]
    pub fn display(&self) -> &Map<String, Value> {
        &self.display
    }

    #[inline]
    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    #[inline]
    pub fn tags(&self) -> &RecordTags {
        &self.tags
    }

    /// Scalar text of a display field
    pub fn field_text(&self, field: &str) -> Option<Cow<'_, str>> {
        scalar_text(self.display.get(field))
    }
}
