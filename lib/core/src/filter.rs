//! Rule-based candidate filtering
//!
//! A [`FilterChain`] is an ordered list of named [`FilterStage`]s. Each stage
//! turns the query context into a [`FilterCondition`] (or passes the working
//! set through) and the chain narrows the candidate set stage by stage. A
//! stage that empties the set still applies; the caller treats an empty
//! result as "no candidates".

use crate::query::{mentions, FieldRef, KeywordTables, QueryContext};
use crate::record::{Record, RecordId, TagKind};
use crate::session::SessionMemory;
use crate::store::KnowledgeStore;
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

pub trait Filter {
    fn matches(&self, record: &Record) -> bool;
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
    Equals { field: FieldRef, value: String },
    Contains { field: FieldRef, value: String },
    /// The field mentions one of `names`, resolved against `vocabulary` with
    /// longest-match precedence (see [`mentions`]).
    Mentions {
        field: FieldRef,
        names: Vec<String>,
        vocabulary: Vec<String>,
    },
    IdIn(AHashSet<RecordId>),
    And(Vec<FilterCondition>),
    Or(Vec<FilterCondition>),
    Not(Box<FilterCondition>),
}

impl FilterCondition {
    fn field_value<'a>(record: &'a Record, field: &FieldRef) -> Option<Cow<'a, str>> {
        match field {
            FieldRef::Tag(kind) => record.tags().get(*kind).map(Cow::Borrowed),
            FieldRef::Display(name) => record.field_text(name),
            FieldRef::SearchText => Some(Cow::Borrowed(record.search_text())),
        }
    }
}

impl Filter for FilterCondition {
    fn matches(&self, record: &Record) -> bool {
        match self {
            FilterCondition::Equals { field, value } => Self::field_value(record, field)
                .map(|v| v.trim() == value.trim())
                .unwrap_or(false),
            FilterCondition::Contains { field, value } => Self::field_value(record, field)
                .map(|v| v.contains(value.as_str()))
                .unwrap_or(false),
            FilterCondition::Mentions {
                field,
                names,
                vocabulary,
            } => Self::field_value(record, field)
                .map(|v| {
                    mentions(&v, vocabulary)
                        .into_iter()
                        .any(|m| names.iter().any(|n| n == m))
                })
                .unwrap_or(false),
            FilterCondition::IdIn(ids) => ids.contains(record.id()),
            FilterCondition::And(conditions) => conditions.iter().all(|c| c.matches(record)),
            FilterCondition::Or(conditions) => conditions.iter().any(|c| c.matches(record)),
            FilterCondition::Not(condition) => !condition.matches(record),
        }
    }
}

/// One named step of the chain
pub trait FilterStage: Send + Sync {
    fn name(&self) -> &str;

    /// The predicate for this query, or `None` to pass the set through.
    fn condition(&self, ctx: &QueryContext, session: &SessionMemory) -> Option<FilterCondition>;
}

/// Drops records already returned in this session
#[derive(Debug, Clone, Default)]
pub struct ExclusionStage;

impl FilterStage for ExclusionStage {
    fn name(&self) -> &str {
        "exclusion"
    }

    fn condition(&self, _ctx: &QueryContext, session: &SessionMemory) -> Option<FilterCondition> {
        if session.shown().is_empty() {
            return None;
        }
        Some(FilterCondition::Not(Box::new(FilterCondition::IdIn(
            session.shown().clone(),
        ))))
    }
}

/// Keeps records whose category tag contains a value accepted by the
/// detected category rule
#[derive(Debug, Clone, Default)]
pub struct CategoryStage;

impl FilterStage for CategoryStage {
    fn name(&self) -> &str {
        "category"
    }

    fn condition(&self, ctx: &QueryContext, _session: &SessionMemory) -> Option<FilterCondition> {
        let category = ctx.category()?;
        Some(FilterCondition::Or(
            category
                .accepts
                .iter()
                .map(|value| FilterCondition::Contains {
                    field: FieldRef::Tag(TagKind::Category),
                    value: value.clone(),
                })
                .collect(),
        ))
    }
}

/// Keeps records located in one of the regions named by the query
#[derive(Debug, Clone)]
pub struct RegionStage {
    vocabulary: Vec<String>,
}

impl RegionStage {
    pub fn new(vocabulary: Vec<String>) -> Self {
        Self { vocabulary }
    }
}

impl FilterStage for RegionStage {
    fn name(&self) -> &str {
        "region"
    }

    fn condition(&self, ctx: &QueryContext, _session: &SessionMemory) -> Option<FilterCondition> {
        if ctx.regions().is_empty() {
            return None;
        }
        Some(FilterCondition::Mentions {
            field: FieldRef::Tag(TagKind::Location),
            names: ctx.regions().to_vec(),
            vocabulary: self.vocabulary.clone(),
        })
    }
}

/// Exact match against one enumerated field, e.g. the era
#[derive(Debug, Clone)]
pub struct FieldStage {
    name: String,
    vocabulary: usize,
}

impl FieldStage {
    pub fn new(name: impl Into<String>, vocabulary: usize) -> Self {
        Self {
            name: name.into(),
            vocabulary,
        }
    }
}

impl FilterStage for FieldStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn condition(&self, ctx: &QueryContext, _session: &SessionMemory) -> Option<FilterCondition> {
        let found = ctx.field_match(self.vocabulary)?;
        Some(FilterCondition::Or(
            found
                .values
                .iter()
                .map(|value| FilterCondition::Equals {
                    field: found.target.clone(),
                    value: value.clone(),
                })
                .collect(),
        ))
    }
}

/// Keeps records whose search text contains every keyword the query names
#[derive(Debug, Clone, Default)]
pub struct SearchKeywordStage;

impl FilterStage for SearchKeywordStage {
    fn name(&self) -> &str {
        "search_keyword"
    }

    fn condition(&self, ctx: &QueryContext, _session: &SessionMemory) -> Option<FilterCondition> {
        if ctx.search_keywords().is_empty() {
            return None;
        }
        Some(FilterCondition::And(
            ctx.search_keywords()
                .iter()
                .map(|k| FilterCondition::Contains {
                    field: FieldRef::SearchText,
                    value: k.clone(),
                })
                .collect(),
        ))
    }
}

/// Which standard stages a chain is built with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub exclude_shown: bool,
    pub category: bool,
    pub region: bool,
    pub fields: bool,
    pub search_keywords: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            exclude_shown: false,
            category: true,
            region: true,
            fields: true,
            search_keywords: true,
        }
    }
}

/// Surviving candidate count after each stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCount {
    pub stage: String,
    pub active: bool,
    pub remaining: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterTrace {
    pub initial: usize,
    pub stages: Vec<StageCount>,
}

#[derive(Default)]
pub struct FilterChain {
    stages: Vec<Box<dyn FilterStage>>,
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterChain")
            .field("stages", &self.stage_names())
            .finish()
    }
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard order: exclusion, category, region, enumerated fields,
    /// search-text keywords.
    pub fn from_config(config: &FilterConfig, tables: &KeywordTables) -> Self {
        let mut chain = Self::new();
        if config.exclude_shown {
            chain.push(ExclusionStage);
        }
        if config.category {
            chain.push(CategoryStage);
        }
        if config.region {
            chain.push(RegionStage::new(tables.regions.clone()));
        }
        if config.fields {
            for (i, vocab) in tables.fields.iter().enumerate() {
                if vocab.enabled {
                    chain.push(FieldStage::new(vocab.name.clone(), i));
                }
            }
        }
        if config.search_keywords {
            chain.push(SearchKeywordStage);
        }
        chain
    }

    pub fn push(&mut self, stage: impl FilterStage + 'static) {
        self.stages.push(Box::new(stage));
    }

    #[must_use]
    pub fn with_stage(mut self, stage: impl FilterStage + 'static) -> Self {
        self.push(stage);
        self
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn apply<'a>(
        &self,
        store: &'a KnowledgeStore,
        ctx: &QueryContext,
        session: &SessionMemory,
    ) -> Vec<&'a Record> {
        self.apply_traced(store, ctx, session).0
    }

    /// Like [`apply`](Self::apply), also reporting the count after each stage.
    pub fn apply_traced<'a>(
        &self,
        store: &'a KnowledgeStore,
        ctx: &QueryContext,
        session: &SessionMemory,
    ) -> (Vec<&'a Record>, FilterTrace) {
        let mut working: Vec<&Record> = store.iter().collect();
        let mut trace = FilterTrace {
            initial: working.len(),
            stages: Vec::with_capacity(self.stages.len()),
        };

        for stage in &self.stages {
            let condition = stage.condition(ctx, session);
            let active = condition.is_some();
            if let Some(condition) = condition {
                working.retain(|record| condition.matches(record));
            }
            tracing::debug!(stage = stage.name(), active, remaining = working.len(), "filter stage");
            trace.stages.push(StageCount {
                stage: stage.name().to_string(),
                active,
                remaining: working.len(),
            });
        }

        (working, trace)
    }
}
