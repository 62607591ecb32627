//! Text embedders
//!
//! The sentence-embedding model is an external collaborator: the engine only
//! sees [`Embedder`]. [`HashEmbedder`] is a deterministic, model-free stand-in
//! built from character trigrams and word tokens, good enough for the terminal
//! demo, tests and benches.

use kbquery_core::{Result, Vector};
use rayon::prelude::*;
use std::hash::BuildHasher;

/// Default dimension for hashed embeddings
pub const DEFAULT_HASH_DIM: usize = 256;

/// Maps text to a fixed-length vector
pub trait Embedder {
    /// Get the dimension of embeddings produced by this embedder
    fn dimension(&self) -> usize;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;

    fn embed(&self, text: &str) -> Result<Vector>;

    /// Embed several texts; output order follows input order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vector>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

impl<E: Embedder + ?Sized> Embedder for &E {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn embed(&self, text: &str) -> Result<Vector> {
        (**self).embed(text)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vector>> {
        (**self).embed_batch(texts)
    }
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn embed(&self, text: &str) -> Result<Vector> {
        (**self).embed(text)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vector>> {
        (**self).embed_batch(texts)
    }
}

/// Feature-hashing embedder over character trigrams and whitespace tokens
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
    hasher: ahash::RandomState,
}

impl HashEmbedder {
    /// # Panics
    ///
    /// Panics if `dim` is zero.
    pub fn new(dim: usize) -> Self {
        assert!(dim > 0, "embedding dimension must be positive");
        Self {
            dim,
            // fixed seeds: identical text must embed identically across runs
            hasher: ahash::RandomState::with_seeds(
                0x6b62_7175_6572_7901,
                0x9e37_79b9_7f4a_7c15,
                0x2545_f491_4f6c_dd1d,
                0x1405_7b7e_f767_814f,
            ),
        }
    }

    fn bucket(&self, token: &str) -> usize {
        (self.hasher.hash_one(token) % self.dim as u64) as usize
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_DIM)
    }
}

impl Embedder for HashEmbedder {
    fn dimension(&self) -> usize {
        self.dim
    }

    fn model_name(&self) -> &str {
        "hash-trigram"
    }

    fn embed(&self, text: &str) -> Result<Vector> {
        let mut vector = vec![0.0f32; self.dim];
        let normalized = text.to_lowercase();

        for trigram in trigrams(&normalized) {
            vector[self.bucket(&trigram)] += 1.0;
        }

        // Words contribute more than trigrams
        for word in normalized.split_whitespace() {
            vector[self.bucket(word)] += 2.0;
        }

        let mut vector = Vector::new(vector);
        vector.normalize();
        Ok(vector)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vector>> {
        texts.par_iter().map(|text| self.embed(text)).collect()
    }
}

/// Character trigrams of `s`, padded with two spaces on each side
fn trigrams(s: &str) -> Vec<String> {
    let padded = format!("  {}  ", s);
    let chars: Vec<char> = padded.chars().collect();
    chars.windows(3).map(|w| w.iter().collect()).collect()
}
