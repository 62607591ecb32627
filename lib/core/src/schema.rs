//! Record schema
//!
//! Declares how raw knowledge mappings become [`Record`](crate::Record)s: which
//! field is the natural key, how the search sentence is synthesized, and which
//! fields feed the category, location and era tags used by the filter chain.

use crate::template::{default_for, scalar_text, SearchTemplate};
use crate::record::RecordTags;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecordSchema {
    /// Field whose value identifies the record
    pub id_field: String,

    /// Sentence template rendered into `search_text`
    pub template: SearchTemplate,

    /// Per-field placeholders for missing values
    pub defaults: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_field: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_field: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub era_field: Option<String>,
}

impl Default for RecordSchema {
    fn default() -> Self {
        Self::plain_text()
    }
}

impl RecordSchema {
    /// One sentence per record under `text`, as produced by line-file loading.
    pub fn plain_text() -> Self {
        Self {
            id_field: "text".to_string(),
            template: SearchTemplate::field("text"),
            defaults: BTreeMap::new(),
            category_field: None,
            location_field: None,
            era_field: None,
        }
    }

    /// Records carrying a pre-synthesized `search` sentence and a `full`
    /// answer paragraph.
    pub fn search_full() -> Self {
        Self {
            id_field: "search".to_string(),
            template: SearchTemplate::field("search"),
            ..Self::plain_text()
        }
    }

    /// Cultural-heritage records keyed by name.
    pub fn heritage() -> Self {
        let template = SearchTemplate::builder()
            .field("이름")
            .literal("는 ")
            .field("시대")
            .literal(" 시대의 ")
            .field("종류")
            .literal("이며, ")
            .field("주소")
            .literal("에 있다.")
            .build();

        let defaults = [
            ("이름", "이름 없음"),
            ("시대", "시대 정보 없음"),
            ("종류", "종류 정보 없음"),
            ("주소", "주소 정보 없음"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            id_field: "이름".to_string(),
            template,
            defaults,
            category_field: Some("종류".to_string()),
            location_field: Some("주소".to_string()),
            era_field: Some("시대".to_string()),
        }
    }

    /// Question/answer pairs grouped by category.
    pub fn faq() -> Self {
        Self {
            id_field: "question".to_string(),
            template: SearchTemplate::field("question"),
            category_field: Some("category".to_string()),
            ..Self::plain_text()
        }
    }

    pub fn search_text(&self, display: &Map<String, Value>) -> String {
        self.template.render(display, &self.defaults)
    }

    /// Natural key of a record; missing keys fall back to the field default.
    pub fn natural_key(&self, display: &Map<String, Value>) -> String {
        match scalar_text(display.get(&self.id_field)) {
            Some(key) => key.into_owned(),
            None => default_for(&self.defaults, &self.id_field).into_owned(),
        }
    }

    pub fn tags(&self, display: &Map<String, Value>) -> RecordTags {
        let tag = |field: &Option<String>| {
            field
                .as_deref()
                .and_then(|f| scalar_text(display.get(f)))
                .map(|v| v.into_owned())
        };
        RecordTags {
            category: tag(&self.category_field),
            location: tag(&self.location_field),
            era: tag(&self.era_field),
        }
    }
}
