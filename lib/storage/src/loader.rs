//! Knowledge-base files to raw records
//!
//! Loading never fails hard: a missing or malformed file is logged and yields
//! an empty knowledge base, which later resolves every query to `NoMatch`.

use kbquery_core::{KnowledgeStore, RecordSchema};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Where a knowledge base comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeSource {
    /// One sentence per line
    Lines(PathBuf),
    /// An array of records, or a `category -> {question -> answer}` map
    Json(PathBuf),
    /// Records already in memory
    Inline(Vec<Value>),
}

impl KnowledgeSource {
    /// `Json` for a `.json` file or one whose content opens with `[` or `{`,
    /// otherwise `Lines`.
    pub fn detect<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let is_json_ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let looks_like_json = is_json_ext
            || fs::read_to_string(path)
                .map(|content| {
                    let head = content.trim_start_matches('\u{feff}').trim_start();
                    head.starts_with('[') || head.starts_with('{')
                })
                .unwrap_or(false);

        if looks_like_json {
            KnowledgeSource::Json(path.to_path_buf())
        } else {
            KnowledgeSource::Lines(path.to_path_buf())
        }
    }
}

pub fn load_knowledge(source: &KnowledgeSource) -> Vec<Value> {
    let raw = match source {
        KnowledgeSource::Inline(values) => return values.clone(),
        KnowledgeSource::Lines(path) => read(path).map(|content| parse_lines(&content)),
        KnowledgeSource::Json(path) => read(path).map(|content| parse_json(path, &content)),
    };
    raw.unwrap_or_default()
}

/// Load and convert in one step.
pub fn load_store(source: &KnowledgeSource, schema: &RecordSchema) -> KnowledgeStore {
    KnowledgeStore::from_raw(schema, load_knowledge(source))
}

fn read(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "knowledge file unreadable, starting empty");
            None
        }
    }
}

fn parse_lines(content: &str) -> Vec<Value> {
    content
        .lines()
        .map(|line| line.trim_start_matches('\u{feff}').trim())
        .filter(|line| !line.is_empty())
        .map(|line| json!({ "text": line }))
        .collect()
}

fn parse_json(path: &Path, content: &str) -> Vec<Value> {
    let value: Value = match serde_json::from_str(content.trim_start_matches('\u{feff}')) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "malformed knowledge JSON, starting empty");
            return Vec::new();
        }
    };

    match value {
        Value::Array(records) => records,
        Value::Object(categories) => flatten_faq(path, categories),
        other => {
            tracing::warn!(
                path = %path.display(),
                kind = json_kind(&other),
                "unsupported knowledge JSON shape, starting empty"
            );
            Vec::new()
        }
    }
}

/// `{category: {question: answer}}` into flat FAQ records, in file order.
fn flatten_faq(path: &Path, categories: Map<String, Value>) -> Vec<Value> {
    let mut records = Vec::new();
    for (category, entries) in categories {
        let Value::Object(entries) = entries else {
            tracing::warn!(path = %path.display(), category = %category, "FAQ category is not an object, skipped");
            continue;
        };
        for (question, answer) in entries {
            records.push(json!({
                "category": category,
                "question": question,
                "answer": answer,
            }));
        }
    }
    records
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
