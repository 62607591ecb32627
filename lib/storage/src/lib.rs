//! # kbquery Storage
//!
//! Reads knowledge bases from disk: plain sentence files, JSON record arrays
//! and category-keyed FAQ maps. Everything is read once at startup.

pub mod loader;

pub use loader::{load_knowledge, load_store, KnowledgeSource};
