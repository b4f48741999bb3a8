//! Capability routing for task requests.
//!
//! The routing engine scores every registered capability profile against a
//! request with the configured matching strategy and produces a
//! `RoutingDecision`: a primary agent, its confidence, and the ranked
//! alternatives. It never fails; requests nothing matches are routed to a
//! designated fallback agent with confidence 0.

pub mod lexical;
pub mod semantic;

pub use lexical::{LexicalMatcher, LexicalScore};
pub use semantic::SemanticMatcher;

use crate::analysis::TaskAnalysis;
use crate::registry::CapabilityRegistry;
use cadre_abstraction::EmbeddingProvider;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Agent routed to when no capability scores above zero.
pub const DEFAULT_FALLBACK_AGENT: &str = "general";

/// Matching strategy for capability scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    /// Keyword-overlap scoring against profile keyword lists.
    Lexical,
    /// Cosine similarity against profile embeddings.
    Semantic,
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStrategy::Lexical => write!(f, "lexical"),
            MatchStrategy::Semantic => write!(f, "semantic"),
        }
    }
}

impl MatchStrategy {
    /// Converts a string to MatchStrategy.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "lexical" => Some(MatchStrategy::Lexical),
            "semantic" => Some(MatchStrategy::Semantic),
            _ => None,
        }
    }
}

/// A ranked routing candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    /// Agent identifier.
    pub agent_id: String,
    /// Raw matching score, in [0, 1].
    pub confidence: f64,
}

/// The outcome of one routing call. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// The selected agent.
    pub primary_agent: String,
    /// The primary agent's raw score, in [0, 1]. Not renormalized; callers
    /// apply their own threshold.
    pub confidence: f64,
    /// Every other agent that scored above zero, sorted descending.
    pub alternatives: Vec<RankedCandidate>,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

impl RoutingDecision {
    /// Builds the decision used when nothing matched.
    #[must_use]
    pub fn fallback(agent_id: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self {
            primary_agent: agent_id.into(),
            confidence: 0.0,
            alternatives: Vec::new(),
            reasoning: reasoning.into(),
        }
    }
}

/// One scored profile, kept in registry declaration order.
struct ScoredProfile {
    agent_id: String,
    confidence: f64,
    detail: String,
}

/// Scores capability profiles and selects a primary agent per request.
pub struct RoutingEngine {
    registry: Arc<CapabilityRegistry>,
    strategy: MatchStrategy,
    fallback_agent: String,
    semantic: SemanticMatcher,
}

impl RoutingEngine {
    /// Creates a lexical-strategy engine over the given registry.
    #[must_use]
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        Self {
            registry,
            strategy: MatchStrategy::Lexical,
            fallback_agent: DEFAULT_FALLBACK_AGENT.to_string(),
            semantic: SemanticMatcher::new(),
        }
    }

    /// Sets the matching strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: MatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the agent routed to when nothing matches.
    #[must_use]
    pub fn with_fallback_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.fallback_agent = agent_id.into();
        self
    }

    /// Backs semantic matching with an embedding provider.
    ///
    /// Without one, semantic matching uses hash-derived vectors only.
    #[must_use]
    pub fn with_embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.semantic = SemanticMatcher::with_provider(provider);
        self
    }

    /// The registry this engine routes over.
    #[must_use]
    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// The configured matching strategy.
    #[must_use]
    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    /// The configured fallback agent id.
    #[must_use]
    pub fn fallback_agent(&self) -> &str {
        &self.fallback_agent
    }

    /// Routes a request to the best-matching agent.
    ///
    /// Deterministic: identical (text, registry, embedding-provider state)
    /// always yields an identical decision. Ties are broken by registry
    /// declaration order.
    pub async fn route(&self, text: &str, analysis: &TaskAnalysis) -> RoutingDecision {
        let scored = match self.strategy {
            MatchStrategy::Lexical => self.score_lexical(text),
            MatchStrategy::Semantic => self.score_semantic(text).await,
        };

        // First strictly-greater score wins, so ties keep declaration order.
        let mut best: Option<usize> = None;
        for (idx, candidate) in scored.iter().enumerate() {
            let beats_current =
                best.is_none_or(|b| candidate.confidence > scored[b].confidence);
            if beats_current {
                best = Some(idx);
            }
        }

        let decision = match best {
            Some(idx) if scored[idx].confidence > 0.0 => {
                let primary = &scored[idx];
                let mut alternatives: Vec<RankedCandidate> = scored
                    .iter()
                    .enumerate()
                    .filter(|(i, candidate)| *i != idx && candidate.confidence > 0.0)
                    .map(|(_, candidate)| RankedCandidate {
                        agent_id: candidate.agent_id.clone(),
                        confidence: candidate.confidence,
                    })
                    .collect();
                // Stable sort keeps declaration order among equal scores.
                alternatives.sort_by(|a, b| {
                    b.confidence.partial_cmp(&a.confidence).unwrap_or(Ordering::Equal)
                });

                let reasoning = format!(
                    "Selected '{}' via {} matching with confidence {:.2} ({}); task classified as '{}' at {} complexity",
                    primary.agent_id,
                    self.strategy,
                    primary.confidence,
                    primary.detail,
                    analysis.classification,
                    analysis.complexity,
                );

                RoutingDecision {
                    primary_agent: primary.agent_id.clone(),
                    confidence: primary.confidence,
                    alternatives,
                    reasoning,
                }
            }
            _ => {
                let reasoning = format!(
                    "No capability scored above zero via {} matching for classification '{}'; routing to fallback agent '{}'",
                    self.strategy, analysis.classification, self.fallback_agent,
                );
                RoutingDecision::fallback(self.fallback_agent.clone(), reasoning)
            }
        };

        info!(
            primary_agent = %decision.primary_agent,
            confidence = decision.confidence,
            alternatives = decision.alternatives.len(),
            strategy = %self.strategy,
            "Routing decision made"
        );

        decision
    }

    fn score_lexical(&self, text: &str) -> Vec<ScoredProfile> {
        let lower = text.to_lowercase();
        self.registry
            .iter()
            .map(|profile| {
                let score = LexicalMatcher::score(&lower, profile);
                let detail = format!(
                    "matched {}/{} keywords: {}",
                    score.matched_keywords.len(),
                    profile.keywords.len(),
                    score.matched_keywords.join(", "),
                );
                ScoredProfile {
                    agent_id: profile.id.clone(),
                    confidence: score.confidence,
                    detail,
                }
            })
            .collect()
    }

    async fn score_semantic(&self, text: &str) -> Vec<ScoredProfile> {
        let request_embedding = self.semantic.embed(text).await;
        let mut scored = Vec::with_capacity(self.registry.len());
        for profile in self.registry.iter() {
            let confidence = self.semantic.score(&request_embedding, profile).await;
            scored.push(ScoredProfile {
                agent_id: profile.id.clone(),
                confidence,
                detail: format!("cosine similarity {confidence:.3}"),
            });
        }
        scored
    }
}
