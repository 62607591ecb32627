//! # kbquery Core
//!
//! Core library for kbquery, a question-answering engine over small fixed
//! knowledge bases.
//!
//! This crate provides the data model and the deterministic half of query
//! resolution:
//!
//! - [`Record`] - An immutable knowledge item with a synthesized search sentence
//! - [`RecordSchema`] - How raw mappings become records (natural key, template, tags)
//! - [`KnowledgeStore`] - The ordered set of records a session searches
//! - [`QueryContext`] - Keyword, region and era tags detected in one query
//! - [`FilterChain`] - Named rule-based stages that narrow the candidate set
//! - [`SessionMemory`] - Ids already shown and the question/answer history
//!
//! ## Example
//!
//! ```rust
//! use kbquery_core::{FilterChain, FilterConfig, KeywordTables, KnowledgeStore, QueryContext, SessionMemory};
//!
//! let store = KnowledgeStore::from_sentences([
//!     "부산 계절별 강수량은 봄 382mm, 여름 750mm입니다.",
//!     "부산 인구는 약 325만 명입니다.",
//! ]);
//! let tables = KeywordTables {
//!     search_keywords: vec!["계절".to_string()],
//!     ..Default::default()
//! };
//! let chain = FilterChain::from_config(&FilterConfig::default(), &tables);
//!
//! let ctx = QueryContext::detect("계절별 강수량 알려줘", &tables);
//! let candidates = chain.apply(&store, &ctx, &SessionMemory::new());
//! assert_eq!(candidates.len(), 1);
//! ```

pub mod error;
pub mod filter;
pub mod query;
pub mod record;
pub mod schema;
pub mod session;
pub mod store;
pub mod template;
pub mod vector;

pub use error::{Error, Result};
pub use filter::{
    CategoryStage, ExclusionStage, FieldStage, Filter, FilterChain, FilterCondition, FilterConfig,
    FilterStage, FilterTrace, RegionStage, SearchKeywordStage, StageCount,
};
pub use query::{CategoryRule, FieldRef, FieldVocabulary, KeywordTables, QueryContext};
pub use record::{Record, RecordId, RecordTags, TagKind};
pub use schema::RecordSchema;
pub use session::{Answer, HistoryEntry, SessionMemory};
pub use store::KnowledgeStore;
pub use template::SearchTemplate;
pub use vector::Vector;
