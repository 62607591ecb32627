//! # kbquery Engine
//!
//! Ties the pieces together: an [`EngineConfig`] (or one of the [`presets`])
//! plus a knowledge base and an [`Embedder`](kbquery_similarity::Embedder)
//! make an [`Engine`], and [`Engine::ask`] answers one question at a time
//! against a caller-owned [`SessionMemory`](kbquery_core::SessionMemory).
//!
//! ## Example
//!
//! ```rust
//! use kbquery_core::{KnowledgeStore, SessionMemory};
//! use kbquery_engine::{presets, Engine, Reply};
//! use kbquery_similarity::HashEmbedder;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let store = KnowledgeStore::from_sentences(["부산 면적은 770km²", "부산 인구는 약 325만 명"]);
//! let engine = Engine::new(store, presets::plain_text(), HashEmbedder::default()).unwrap();
//!
//! let mut session = SessionMemory::new();
//! let reply = engine.ask("부산 면적", &mut session, &mut StdRng::seed_from_u64(1)).unwrap();
//! assert!(matches!(reply, Reply::Answer { .. }));
//! assert_eq!(session.history().len(), 1);
//! ```

pub mod config;
pub mod engine;
pub mod overrides;
pub mod presets;

pub use config::{EngineConfig, Messages};
pub use engine::{Engine, Reply};
pub use overrides::{find_override, KeywordOverride, OverrideTrigger};
