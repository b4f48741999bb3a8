//! Lexical capability matching.
//!
//! Scores a profile by keyword overlap: the number of profile keywords found
//! in the request over the total keywords the profile defines.

use crate::registry::CapabilityProfile;

/// Result of scoring one profile lexically.
#[derive(Debug, Clone, PartialEq)]
pub struct LexicalScore {
    /// Matched-over-total keyword ratio, in [0, 1].
    pub confidence: f64,
    /// The profile keywords found in the request, in profile order.
    pub matched_keywords: Vec<String>,
}

/// Keyword-overlap matcher.
pub struct LexicalMatcher;

impl LexicalMatcher {
    /// Scores a profile against already-lowercased request text.
    ///
    /// A profile without keywords scores 0.0; it can still be routed to as
    /// the configured fallback agent.
    #[must_use]
    pub fn score(text_lower: &str, profile: &CapabilityProfile) -> LexicalScore {
        if profile.keywords.is_empty() {
            return LexicalScore { confidence: 0.0, matched_keywords: Vec::new() };
        }

        let matched_keywords: Vec<String> = profile
            .keywords
            .iter()
            .filter(|keyword| text_lower.contains(keyword.to_lowercase().as_str()))
            .cloned()
            .collect();

        let confidence = matched_keywords.len() as f64 / profile.keywords.len() as f64;
        LexicalScore { confidence, matched_keywords }
    }
}
