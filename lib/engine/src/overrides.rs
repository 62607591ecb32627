//! Keyword overrides
//!
//! Fixed replies keyed on words in the query. Some questions have one answer
//! that is better written by hand than retrieved, e.g. a full ranking table
//! asked about with many different phrasings.

use kbquery_core::query::mentions;
use serde::{Deserialize, Serialize};

/// When an override is consulted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideTrigger {
    /// Before filtering; a hit skips retrieval entirely
    #[default]
    BeforeRetrieval,
    /// After retrieval produced a confident answer; a hit replaces it
    OnConfidentMatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordOverride {
    pub keywords: Vec<String>,
    pub reply: String,
    #[serde(default)]
    pub when: OverrideTrigger,
    /// Longer names that contain a keyword without meaning it, e.g. "해운대구"
    /// for "대구"
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shadowed_by: Vec<String>,
}

impl KeywordOverride {
    pub fn new<S: Into<String>>(
        when: OverrideTrigger,
        keywords: impl IntoIterator<Item = S>,
        reply: impl Into<String>,
    ) -> Self {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            reply: reply.into(),
            when,
            shadowed_by: Vec::new(),
        }
    }

    #[must_use]
    pub fn shadowed_by<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.shadowed_by = names.into_iter().map(Into::into).collect();
        self
    }

    /// True when any keyword is mentioned in `query`. Occurrences are claimed
    /// longest-first together with `shadowed_by`, so a keyword inside a
    /// longer shadowing name does not count.
    pub fn triggered_by(&self, query: &str) -> bool {
        let vocabulary: Vec<String> = self
            .keywords
            .iter()
            .chain(&self.shadowed_by)
            .cloned()
            .collect();
        mentions(query, &vocabulary)
            .into_iter()
            .any(|m| self.keywords.iter().any(|k| k == m))
    }
}

/// The first override for `when` that `query` triggers, in configuration order
pub fn find_override<'a>(
    overrides: &'a [KeywordOverride],
    when: OverrideTrigger,
    query: &str,
) -> Option<&'a KeywordOverride> {
    overrides
        .iter()
        .filter(|o| o.when == when)
        .find(|o| o.triggered_by(query))
}
