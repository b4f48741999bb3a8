//! Capability registry for routable agents.
//!
//! The registry is an explicitly constructed, read-only table: profiles are
//! registered once during setup, in a declaration order that routing
//! tie-breaking depends on, and the registry is then shared immutably
//! (typically behind an `Arc`).

use crate::analysis::Complexity;
use crate::error::{OrchestrationError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default confidence threshold applied to new profiles.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Static metadata describing what an agent is good for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityProfile {
    /// Agent identifier, unique within a registry.
    pub id: String,
    /// Free-text description of the agent's strengths.
    pub description: String,
    /// Keywords used by lexical matching.
    pub keywords: Vec<String>,
    /// Precomputed embedding for semantic matching, if available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// Confidence callers should require before trusting a route to this agent.
    pub confidence_threshold: f64,
    /// Complexity levels this agent handles. Empty means unrestricted.
    pub complexity_levels: Vec<Complexity>,
}

impl CapabilityProfile {
    /// Creates a profile with the default threshold and no restrictions.
    #[must_use]
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            keywords: Vec::new(),
            embedding: None,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            complexity_levels: Vec::new(),
        }
    }

    /// Sets the keywords used by lexical matching.
    #[must_use]
    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }

    /// Sets a precomputed embedding for semantic matching.
    #[must_use]
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Sets the confidence threshold.
    #[must_use]
    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Restricts the profile to the given complexity levels.
    #[must_use]
    pub fn with_complexity_levels(mut self, levels: Vec<Complexity>) -> Self {
        self.complexity_levels = levels;
        self
    }

    /// Whether this agent handles the given complexity level.
    #[must_use]
    pub fn supports(&self, complexity: Complexity) -> bool {
        self.complexity_levels.is_empty() || self.complexity_levels.contains(&complexity)
    }

    /// The text embedded for this profile when no precomputed vector exists.
    #[must_use]
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.description, self.keywords.join(" "))
    }
}

/// Ordered, read-only table of capability profiles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapabilityRegistry {
    profiles: Vec<CapabilityProfile>,
}

impl CapabilityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { profiles: Vec::new() }
    }

    /// Builds a registry from profiles, preserving their order.
    ///
    /// # Errors
    /// Returns an error if two profiles share an id.
    pub fn from_profiles(profiles: Vec<CapabilityProfile>) -> Result<Self> {
        let mut registry = Self::new();
        for profile in profiles {
            registry.register(profile)?;
        }
        Ok(registry)
    }

    /// Appends a profile, keeping declaration order.
    ///
    /// # Errors
    /// Returns an error if a profile with the same id is already registered.
    pub fn register(&mut self, profile: CapabilityProfile) -> Result<()> {
        if profile.id.trim().is_empty() {
            return Err(OrchestrationError::InvalidConfiguration(
                "capability profile id must not be empty".to_string(),
            ));
        }
        if self.position(&profile.id).is_some() {
            return Err(OrchestrationError::DuplicateRegistration(profile.id));
        }

        debug!(agent_id = %profile.id, keywords = profile.keywords.len(), "Registered capability profile");
        self.profiles.push(profile);
        Ok(())
    }

    /// Looks up a profile by agent id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CapabilityProfile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    /// Declaration position of an agent id, used for tie-breaking.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.profiles.iter().position(|p| p.id == id)
    }

    /// Iterates profiles in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &CapabilityProfile> {
        self.profiles.iter()
    }

    /// Number of registered profiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether the registry has no profiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// All agent ids in declaration order.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.id.as_str()).collect()
    }
}
