use crate::record::{Record, RecordId};
use crate::schema::RecordSchema;
use ahash::AHashMap;
use serde_json::Value;

/// The immutable set of records a session searches over.
///
/// Iteration follows load order. Ids are unique: a repeated natural key gets a
/// `#2`, `#3`... suffix in load order.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeStore {
    records: Vec<Record>,
    positions: AHashMap<RecordId, usize>,
}

impl KnowledgeStore {
    pub fn new(records: Vec<Record>) -> Self {
        let mut store = Self {
            records: Vec::with_capacity(records.len()),
            positions: AHashMap::with_capacity(records.len()),
        };
        for record in records {
            store.push(record);
        }
        store
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Build records from raw knowledge mappings. Non-object entries are
    /// skipped; missing fields are filled with schema defaults.
    pub fn from_raw(schema: &RecordSchema, raw: Vec<Value>) -> Self {
        let mut skipped = 0usize;
        let records: Vec<Record> = raw
            .into_iter()
            .filter_map(|value| match value {
                Value::Object(map) => Some(Record::from_display(schema, map)),
                other => {
                    skipped += 1;
                    tracing::warn!(kind = json_kind(&other), "skipping non-object knowledge entry");
                    None
                }
            })
            .collect();

        let store = Self::new(records);
        tracing::info!(records = store.len(), skipped, "knowledge store built");
        store
    }

    /// One record per sentence.
    pub fn from_sentences<I, S>(sentences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(
            sentences
                .into_iter()
                .map(|s| Record::from_sentence(s.as_ref()))
                .collect(),
        )
    }

    fn push(&mut self, record: Record) {
        let record = if self.positions.contains_key(record.id()) {
            let base = record.id().as_str().to_string();
            let mut n = 2usize;
            let id = loop {
                let candidate = RecordId::new(format!("{}#{}", base, n));
                if !self.positions.contains_key(&candidate) {
                    break candidate;
                }
                n += 1;
            };
            tracing::warn!(natural_key = %base, id = %id, "duplicate natural key");
            record.with_id(id)
        } else {
            record
        };
        self.positions.insert(record.id().clone(), self.records.len());
        self.records.push(record);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.positions.get(id).map(|&i| &self.records[i])
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.positions.contains_key(id)
    }
}

impl<'a> IntoIterator for &'a KnowledgeStore {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
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
