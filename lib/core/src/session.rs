use crate::record::RecordId;
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::VecDeque;

/// What a successful query produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Answer {
    /// A knowledge record chosen by similarity
    Record {
        id: RecordId,
        display: Map<String, Value>,
        score: f32,
    },
    /// A fixed reply triggered by a keyword override
    Canned { text: String },
}

impl Answer {
    pub fn record_id(&self) -> Option<&RecordId> {
        match self {
            Answer::Record { id, .. } => Some(id),
            Answer::Canned { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub query: String,
    pub answer: Answer,
}

/// Per-session state: ids already returned and the question/answer history.
///
/// Each session owns its own instance. Nothing here is shared or locked.
#[derive(Debug, Clone, Default)]
pub struct SessionMemory {
    shown: AHashSet<RecordId>,
    history: VecDeque<HistoryEntry>,
}

impl SessionMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the id was already recorded.
    pub fn record_shown(&mut self, id: RecordId) -> bool {
        self.shown.insert(id)
    }

    /// Newest entries go to the front.
    pub fn append_history(&mut self, query: impl Into<String>, answer: Answer) {
        self.history.push_front(HistoryEntry {
            query: query.into(),
            answer,
        });
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn shown(&self) -> &AHashSet<RecordId> {
        &self.shown
    }

    pub fn has_shown(&self, id: &RecordId) -> bool {
        self.shown.contains(id)
    }

    /// History, most recent first.
    pub fn history(&self) -> &VecDeque<HistoryEntry> {
        &self.history
    }

    pub fn is_empty(&self) -> bool {
        self.shown.is_empty() && self.history.is_empty()
    }
}
