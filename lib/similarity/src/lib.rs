//! # kbquery Similarity
//!
//! Embedding, similarity search and answer selection for kbquery.
//!
//! - [`Embedder`] - Text to vector, the seam to an external sentence model
//! - [`Metric`] / [`Comparator`] - Score functions and which direction is better
//! - [`VectorIndex`] - Per-query top-k search over the filtered candidates
//! - [`Selector`] - Tie-aware seeded pick with a confidence threshold
//!
//! ## Example
//!
//! ```rust
//! use kbquery_similarity::{Metric, Outcome, Scored, Selector};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let selector = Selector::new(1, 500.0, 1e-3).unwrap();
//! let scored = vec![Scored::new("far", 900.0), Scored::new("near", 40.0)];
//! let outcome = selector.select(scored, &Metric::SquaredEuclidean, &mut StdRng::seed_from_u64(7));
//! assert_eq!(outcome, Outcome::Answer { item: "near", score: 40.0 });
//! ```

pub mod embedder;
pub mod index;
pub mod metric;
pub mod rank;

pub use embedder::{Embedder, HashEmbedder, DEFAULT_HASH_DIM};
pub use index::{FlatIndex, IndexKind, MatrixIndex, VectorIndex};
pub use metric::{Comparator, Direction, Metric};
pub use rank::{tie_groups, Outcome, Scored, Selector};
