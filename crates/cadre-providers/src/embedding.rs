//! Deterministic fallback embeddings.
//!
//! When no embedding service is reachable, routing still has to be
//! reproducible: the same text must map to the same vector across runs and
//! processes. This module derives a fixed-dimension vector from a hash of
//! the text.

use async_trait::async_trait;
use cadre_abstraction::{EmbeddingProvider, ProviderError};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::debug;

/// Default dimensionality for hash-derived vectors.
pub const DEFAULT_DIMENSION: usize = 64;

/// An `EmbeddingProvider` that derives vectors from a hash of the text.
///
/// The vectors carry no semantic signal; they exist so that similarity
/// scoring stays deterministic when the real embedding service is
/// unavailable.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    /// Creates a new `HashEmbedder` producing vectors of the given dimension.
    #[must_use]
    pub const fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    /// Derives the vector for a text synchronously.
    ///
    /// Exposed separately from the trait so call sites that absorb a failed
    /// embedding call can fall back without another await point.
    #[must_use]
    pub fn derive(&self, text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut state = hasher.finish();
        if state == 0 {
            state = 0x9E37_79B9_7F4A_7C15;
        }

        (0..self.dimension)
            .map(|_| {
                // xorshift64* keeps the sequence cheap and fully determined
                // by the text hash.
                state ^= state >> 12;
                state ^= state << 25;
                state ^= state >> 27;
                let value = state.wrapping_mul(0x2545_F491_4F6C_DD1D);
                (value % 10_000) as f32 / 10_000.0
            })
            .collect()
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        debug!(text_len = text.len(), dimension = self.dimension, "HashEmbedder deriving vector");
        Ok(self.derive(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_text_same_vector() {
        let embedder = HashEmbedder::default();
        let first = embedder.embed("schedule the milestone review").await.unwrap();
        let second = embedder.embed("schedule the milestone review").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_different_texts_differ() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed("plan the budget").await.unwrap();
        let b = embedder.embed("write the code").await.unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_dimension_is_respected() {
        let embedder = HashEmbedder::new(16);
        assert_eq!(embedder.derive("anything").len(), 16);
        assert_eq!(embedder.dimension(), 16);
    }

    #[test]
    fn test_values_are_bounded() {
        let embedder = HashEmbedder::default();
        for value in embedder.derive("bounded output") {
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn test_empty_text_is_stable() {
        let embedder = HashEmbedder::default();
        assert_eq!(embedder.derive(""), embedder.derive(""));
    }
}
