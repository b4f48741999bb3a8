//! Semantic capability matching.
//!
//! Scores a profile by cosine similarity between an embedding of the request
//! and the profile's embedding. When no embedding provider is configured, or
//! a provider call fails, a hash-derived deterministic vector stands in so
//! routing stays reproducible offline.

use crate::registry::CapabilityProfile;
use cadre_abstraction::EmbeddingProvider;
use cadre_providers::HashEmbedder;
use std::sync::Arc;
use tracing::{debug, warn};

/// Cosine-similarity matcher with deterministic fallback.
pub struct SemanticMatcher {
    provider: Option<Arc<dyn EmbeddingProvider>>,
    fallback: HashEmbedder,
}

impl SemanticMatcher {
    /// Creates a matcher that only uses hash-derived vectors.
    #[must_use]
    pub fn new() -> Self {
        Self { provider: None, fallback: HashEmbedder::default() }
    }

    /// Creates a matcher backed by an embedding provider.
    ///
    /// The fallback embedder mirrors the provider's dimensionality so that
    /// vectors from the two sources remain comparable within one routing
    /// call.
    #[must_use]
    pub fn with_provider(provider: Arc<dyn EmbeddingProvider>) -> Self {
        let fallback = HashEmbedder::new(provider.dimension());
        Self { provider: Some(provider), fallback }
    }

    /// Embeds text, absorbing provider failure into the deterministic fallback.
    pub async fn embed(&self, text: &str) -> Vec<f32> {
        match &self.provider {
            Some(provider) => match provider.embed(text).await {
                Ok(vector) => vector,
                Err(e) => {
                    warn!(error = %e, "Embedding call failed, using hash-derived fallback vector");
                    self.fallback.derive(text)
                }
            },
            None => self.fallback.derive(text),
        }
    }

    /// Scores a profile against a precomputed request embedding.
    ///
    /// Uses the profile's precomputed embedding when present, otherwise
    /// embeds the profile's description and keywords.
    pub async fn score(&self, request_embedding: &[f32], profile: &CapabilityProfile) -> f64 {
        let profile_embedding = match &profile.embedding {
            Some(vector) => vector.clone(),
            None => self.embed(&profile.embedding_text()).await,
        };

        let similarity = Self::cosine_similarity(request_embedding, &profile_embedding);
        debug!(agent_id = %profile.id, similarity, "Semantic similarity computed");

        // Confidence stays in [0, 1]; negative similarity means no match.
        similarity.max(0.0)
    }

    /// Cosine similarity between two vectors.
    ///
    /// Returns 0.0 for mismatched dimensions or zero-norm vectors.
    #[must_use]
    pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let mut dot = 0.0f64;
        let mut norm_a = 0.0f64;
        let mut norm_b = 0.0f64;
        for (x, y) in a.iter().zip(b.iter()) {
            dot += f64::from(*x) * f64::from(*y);
            norm_a += f64::from(*x) * f64::from(*x);
            norm_b += f64::from(*y) * f64::from(*y);
        }

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot / (norm_a.sqrt() * norm_b.sqrt())
    }
}

impl Default for SemanticMatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadre_abstraction::ProviderError;

    struct FailingEmbedder;

    #[async_trait::async_trait]
    impl EmbeddingProvider for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, ProviderError> {
            Err(ProviderError::RequestError("unreachable".to_string()))
        }

        fn dimension(&self) -> usize {
            8
        }
    }

    #[test]
    fn test_cosine_identical_vectors() {
        let v = vec![1.0, 2.0, 3.0];
        let similarity = SemanticMatcher::cosine_similarity(&v, &v);
        assert!((similarity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_orthogonal_vectors() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!((SemanticMatcher::cosine_similarity(&a, &b)).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_zero_norm_is_zero() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 1.0];
        assert!((SemanticMatcher::cosine_similarity(&a, &b)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_cosine_mismatched_dimensions_is_zero() {
        let a = vec![1.0, 1.0];
        let b = vec![1.0, 1.0, 1.0];
        assert!((SemanticMatcher::cosine_similarity(&a, &b)).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_embed_without_provider_is_deterministic() {
        let matcher = SemanticMatcher::new();
        let first = matcher.embed("route this request").await;
        let second = matcher.embed("route this request").await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back_deterministically() {
        let matcher = SemanticMatcher::with_provider(Arc::new(FailingEmbedder));
        let first = matcher.embed("route this request").await;
        let second = matcher.embed("route this request").await;
        assert_eq!(first, second);
        assert_eq!(first.len(), 8);
    }

    #[tokio::test]
    async fn test_precomputed_profile_embedding_is_used() {
        let matcher = SemanticMatcher::new();
        let request = vec![1.0f32, 0.0, 0.0];
        let profile = CapabilityProfile::new("agent", "test")
            .with_embedding(vec![1.0, 0.0, 0.0]);
        let score = matcher.score(&request, &profile).await;
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_negative_similarity_clamps_to_zero() {
        let matcher = SemanticMatcher::new();
        let request = vec![1.0f32, 0.0];
        let profile = CapabilityProfile::new("agent", "test").with_embedding(vec![-1.0, 0.0]);
        let score = matcher.score(&request, &profile).await;
        assert!((score - 0.0).abs() < f64::EPSILON);
    }
}
