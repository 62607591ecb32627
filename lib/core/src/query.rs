//! Keyword detection
//!
//! [`KeywordTables`] is the declarative vocabulary the filter chain works from.
//! [`QueryContext::detect`] scans one query against it; the context is rebuilt
//! for every query and never stored.

use crate::record::TagKind;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A category marker and the tag values it selects.
///
/// The first rule with a keyword present in the query wins. A record passes
/// when its category tag contains any of `accepts` (or any keyword when
/// `accepts` is empty).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub keywords: Vec<String>,
    #[serde(default)]
    pub accepts: Vec<String>,
}

impl CategoryRule {
    pub fn new<S: Into<String>>(keywords: impl IntoIterator<Item = S>) -> Self {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            accepts: Vec::new(),
        }
    }

    pub fn accepting<S: Into<String>>(mut self, accepts: impl IntoIterator<Item = S>) -> Self {
        self.accepts = accepts.into_iter().map(Into::into).collect();
        self
    }

    fn accepted_values(&self) -> &[String] {
        if self.accepts.is_empty() {
            &self.keywords
        } else {
            &self.accepts
        }
    }
}

/// Where a predicate reads its value from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRef {
    Tag(TagKind),
    Display(String),
    SearchText,
}

/// A fixed set of values for one record field. When the query contains one of
/// them, records must carry exactly that value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldVocabulary {
    pub name: String,
    pub target: FieldRef,
    pub values: Vec<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl FieldVocabulary {
    pub fn new<S: Into<String>>(name: &str, target: FieldRef, values: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.to_string(),
            target,
            values: values.into_iter().map(Into::into).collect(),
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordTables {
    pub categories: Vec<CategoryRule>,
    pub regions: Vec<String>,
    pub fields: Vec<FieldVocabulary>,
    /// Keywords that must also appear in a record's search text
    pub search_keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMatch {
    pub keyword: String,
    pub accepts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatch {
    /// Position of the vocabulary in [`KeywordTables::fields`]
    pub vocabulary: usize,
    pub target: FieldRef,
    pub values: SmallVec<[String; 2]>,
}

/// Tags detected in one query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryContext {
    text: String,
    category: Option<CategoryMatch>,
    regions: SmallVec<[String; 4]>,
    fields: Vec<FieldMatch>,
    search_keywords: SmallVec<[String; 2]>,
    numbers: SmallVec<[f64; 4]>,
}

impl QueryContext {
    pub fn detect(text: &str, tables: &KeywordTables) -> Self {
        let category = tables.categories.iter().find_map(|rule| {
            rule.keywords
                .iter()
                .find(|k| !k.is_empty() && text.contains(k.as_str()))
                .map(|keyword| CategoryMatch {
                    keyword: keyword.clone(),
                    accepts: rule.accepted_values().to_vec(),
                })
        });

        let regions = mentions(text, &tables.regions)
            .into_iter()
            .map(str::to_string)
            .collect();

        let fields = tables
            .fields
            .iter()
            .enumerate()
            .filter_map(|(i, vocab)| {
                let values: SmallVec<[String; 2]> = mentions(text, &vocab.values)
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                (!values.is_empty()).then(|| FieldMatch {
                    vocabulary: i,
                    target: vocab.target.clone(),
                    values,
                })
            })
            .collect();

        let search_keywords = tables
            .search_keywords
            .iter()
            .filter(|k| !k.is_empty() && text.contains(k.as_str()))
            .cloned()
            .collect();

        let ctx = Self {
            text: text.to_string(),
            category,
            regions,
            fields,
            search_keywords,
            numbers: numbers(text),
        };
        tracing::debug!(
            category = ?ctx.category.as_ref().map(|c| c.keyword.as_str()),
            regions = ?ctx.regions,
            fields = ctx.fields.len(),
            search_keywords = ?ctx.search_keywords,
            numbers = ?ctx.numbers,
            "query context detected"
        );
        ctx
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn category(&self) -> Option<&CategoryMatch> {
        self.category.as_ref()
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn field_match(&self, vocabulary: usize) -> Option<&FieldMatch> {
        self.fields.iter().find(|m| m.vocabulary == vocabulary)
    }

    pub fn field_matches(&self) -> &[FieldMatch] {
        &self.fields
    }

    pub fn search_keywords(&self) -> &[String] {
        &self.search_keywords
    }

    /// Numbers written in the query, e.g. `2024` in "2024년 기온"
    pub fn numbers(&self) -> &[f64] {
        &self.numbers
    }
}

/// Names from `vocabulary` mentioned in `text`.
///
/// Occurrences are claimed longest-first; a shorter name whose occurrence sits
/// inside an already claimed span is not a mention. "서구" is therefore not
/// mentioned by "부산 강서구", but is by "서구와 강서구". Results keep
/// vocabulary order.
pub fn mentions<'a>(text: &str, vocabulary: &'a [String]) -> Vec<&'a str> {
    let mut hits: Vec<(usize, usize, usize)> = Vec::new();
    for (i, name) in vocabulary.iter().enumerate() {
        if name.is_empty() {
            continue;
        }
        for (start, _) in text.match_indices(name.as_str()) {
            hits.push((start, start + name.len(), i));
        }
    }
    hits.sort_by(|a, b| (b.1 - b.0).cmp(&(a.1 - a.0)).then(a.0.cmp(&b.0)));

    let mut claimed: SmallVec<[(usize, usize); 8]> = SmallVec::new();
    let mut found: SmallVec<[usize; 8]> = SmallVec::new();
    for (start, end, i) in hits {
        if claimed.iter().any(|&(s, e)| start < e && s < end) {
            continue;
        }
        claimed.push((start, end));
        if !found.contains(&i) {
            found.push(i);
        }
    }
    found.sort_unstable();
    found.into_iter().map(|i| vocabulary[i].as_str()).collect()
}

fn numbers(text: &str) -> SmallVec<[f64; 4]> {
    fn flush(current: &mut String, out: &mut SmallVec<[f64; 4]>) {
        if let Ok(n) = current.trim_end_matches('.').parse::<f64>() {
            out.push(n);
        }
        current.clear();
    }

    let mut out = SmallVec::new();
    let mut current = String::new();
    for c in text.chars() {
        if c.is_ascii_digit() || (c == '.' && !current.is_empty() && !current.contains('.')) {
            current.push(c);
        } else if c == ',' && !current.is_empty() {
            // thousands separator
        } else if !current.is_empty() {
            flush(&mut current, &mut out);
        }
    }
    if !current.is_empty() {
        flush(&mut current, &mut out);
    }
    out
}
