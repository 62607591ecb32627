//! # kbquery
//!
//! Question answering over small, fixed knowledge bases for classroom
//! chatbots. A question is narrowed by keyword filters, embedded, compared to
//! the surviving records, and resolved to an answer, a "no match" or a
//! "not confident enough" outcome. Ties among equally good records can be
//! broken at random with a seedable RNG.
//!
//! ## Quick Start
//!
//! ### From the terminal
//!
//! ```bash
//! kbquery --knowledge population_busan.txt --preset population
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use kbquery::prelude::*;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let store = KnowledgeStore::from_sentences(["부산 면적은 770km²"]);
//! let engine = Engine::new(store, presets::plain_text(), HashEmbedder::default()).unwrap();
//!
//! let mut session = SessionMemory::new();
//! let mut rng = StdRng::seed_from_u64(42);
//! let reply = engine.ask("부산 면적", &mut session, &mut rng).unwrap();
//! println!("{}", engine.render(&reply));
//! ```
//!
//! ## Crate Structure
//!
//! - `kbquery-core` - Records, schema, knowledge store, query context, filter chain, session memory
//! - `kbquery-similarity` - Embedders, metrics, flat and matrix indexes, tie-aware selection
//! - `kbquery-storage` - Loading line files, record arrays and FAQ maps
//! - `kbquery-engine` - Configuration, presets, keyword overrides, the query flow

// Re-export core types
pub use kbquery_core::{
    Answer, Error, FilterChain, FilterConfig, FilterStage, HistoryEntry, KeywordTables,
    KnowledgeStore, QueryContext, Record, RecordId, RecordSchema, Result, SessionMemory, Vector,
};

// Re-export similarity
pub use kbquery_similarity::{Comparator, Embedder, HashEmbedder, IndexKind, Metric, Outcome, Selector};

// Re-export storage
pub use kbquery_storage::{load_knowledge, load_store, KnowledgeSource};

// Re-export engine
pub use kbquery_engine::{presets, Engine, EngineConfig, KeywordOverride, OverrideTrigger, Reply};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        presets, Answer, Embedder, Engine, EngineConfig, Error, HashEmbedder, KnowledgeSource,
        KnowledgeStore, Metric, RecordSchema, Reply, Result, SessionMemory,
    };
}
