//! Task analysis for request classification.
//!
//! The analyzer derives a structured `TaskAnalysis` from raw request text
//! using a fixed table of domain patterns and keyword heuristics. It never
//! fails: text that matches nothing is classified as "general".

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Classification used when no domain pattern matches.
pub const GENERAL_CLASSIFICATION: &str = "general";

/// Task complexity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    /// Simple, short, single-concern requests.
    Low,
    /// Typical requests without strong signals either way.
    Medium,
    /// Large, multi-step, or enterprise-scale requests.
    High,
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Complexity::Low => write!(f, "low"),
            Complexity::Medium => write!(f, "medium"),
            Complexity::High => write!(f, "high"),
        }
    }
}

impl Complexity {
    /// Converts a string to Complexity.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Complexity::Low),
            "medium" => Some(Complexity::Medium),
            "high" => Some(Complexity::High),
            _ => None,
        }
    }
}

/// Task urgency level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    /// No explicit time pressure.
    Low,
    /// Timely handling requested.
    Medium,
    /// Explicit urgency markers present.
    High,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Urgency::Low => write!(f, "low"),
            Urgency::Medium => write!(f, "medium"),
            Urgency::High => write!(f, "high"),
        }
    }
}

/// Task scope level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// A single focused task.
    Task,
    /// Team- or project-level work.
    Project,
    /// Organization-wide or program-level work.
    Program,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Task => write!(f, "task"),
            Scope::Project => write!(f, "project"),
            Scope::Program => write!(f, "program"),
        }
    }
}

/// Patterns matched for one domain of the analyzer's table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainHits {
    /// Domain tag (e.g., "project_management").
    pub domain: String,
    /// The patterns that matched, in table order.
    pub patterns: Vec<String>,
}

/// Structured analysis derived from one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskAnalysis {
    /// Best-matching domain tag, or "general" when nothing matched.
    pub classification: String,
    /// Estimated complexity level.
    pub complexity: Complexity,
    /// Estimated urgency level.
    pub urgency: Urgency,
    /// Estimated scope level.
    pub scope: Scope,
    /// Matched patterns grouped per domain, in table order.
    pub pattern_hits: Vec<DomainHits>,
    /// Whether the request likely needs more than one agent.
    pub multi_agent_required: bool,
}

impl TaskAnalysis {
    /// Returns the default analysis for empty or malformed input.
    #[must_use]
    pub fn general() -> Self {
        Self {
            classification: GENERAL_CLASSIFICATION.to_string(),
            complexity: Complexity::Low,
            urgency: Urgency::Low,
            scope: Scope::Task,
            pattern_hits: Vec::new(),
            multi_agent_required: false,
        }
    }

    /// Number of domains with at least one pattern match.
    #[must_use]
    pub fn matched_domains(&self) -> usize {
        self.pattern_hits.len()
    }
}

/// One entry of the fixed domain pattern table.
struct DomainPatterns {
    domain: &'static str,
    patterns: Vec<(String, Regex)>,
}

/// Analyzer that classifies request text against a fixed pattern table.
pub struct TaskAnalyzer {
    table: Vec<DomainPatterns>,
}

const HIGH_COMPLEXITY_INDICATORS: &[&str] = &[
    "complex",
    "comprehensive",
    "detailed",
    "multi-step",
    "integration",
    "enterprise",
    "advanced",
    "sophisticated",
    "intricate",
    "high volume",
];

const MEDIUM_COMPLEXITY_INDICATORS: &[&str] =
    &["moderate", "standard", "typical", "regular", "normal", "intermediate", "balanced"];

const LOW_COMPLEXITY_INDICATORS: &[&str] =
    &["simple", "basic", "quick", "straightforward", "minimal", "elementary", "fundamental"];

const URGENT_INDICATORS: &[&str] = &["urgent", "asap", "immediately", "critical", "emergency"];

const TIMELY_INDICATORS: &[&str] = &["soon", "timely", "reasonable", "standard"];

const PROGRAM_SCOPE_INDICATORS: &[&str] =
    &["enterprise", "organization-wide", "comprehensive", "complete"];

const PROJECT_SCOPE_INDICATORS: &[&str] = &["department", "team", "project-specific"];

const MULTI_AGENT_INDICATORS: &[&str] = &[
    "comprehensive",
    "end-to-end",
    "complete",
    "full",
    "integrated",
    "multiple phases",
    "various aspects",
    "different perspectives",
    "holistic approach",
    "multi-faceted",
];

impl TaskAnalyzer {
    /// Creates an analyzer with the built-in domain pattern table.
    #[must_use]
    pub fn new() -> Self {
        let table = vec![
            Self::domain(
                "project_management",
                &[
                    r"project.*plan",
                    r"manage.*project",
                    r"timeline.*project",
                    r"resource.*allocation",
                    r"risk.*assessment",
                    r"stakeholder.*management",
                ],
            ),
            Self::domain(
                "evaluation",
                &[
                    r"evaluate.*",
                    r"assess.*quality",
                    r"review.*deliverable",
                    r"score.*",
                    r"feedback.*",
                    r"quality.*check",
                ],
            ),
            Self::domain(
                "planning",
                &[
                    r"create.*plan",
                    r"action.*plan",
                    r"step.*by.*step",
                    r"implementation.*strategy",
                    r"breakdown.*task",
                ],
            ),
            Self::domain(
                "enhancement",
                &[r"improve.*prompt", r"enhance.*", r"optimize.*", r"refine.*", r"better.*structure"],
            ),
            Self::domain(
                "research",
                &[
                    r"find.*information",
                    r"research.*",
                    r"lookup.*",
                    r"retrieve.*knowledge",
                    r"search.*for",
                ],
            ),
        ];

        Self { table }
    }

    fn domain(domain: &'static str, patterns: &[&str]) -> DomainPatterns {
        let patterns = patterns
            .iter()
            .map(|p| ((*p).to_string(), Regex::new(p).unwrap()))
            .collect();
        DomainPatterns { domain, patterns }
    }

    /// Analyzes request text and optional context into a `TaskAnalysis`.
    ///
    /// Never fails: empty input yields the default "general" analysis, and
    /// text without any pattern match is classified as "general" too.
    #[must_use]
    pub fn analyze(&self, text: &str, context: Option<&str>) -> TaskAnalysis {
        let combined = match context {
            Some(ctx) if !ctx.trim().is_empty() => format!("{text} {ctx}"),
            _ => text.to_string(),
        };
        let lower = combined.to_lowercase();

        if lower.trim().is_empty() {
            debug!("Empty request text, using default analysis");
            return TaskAnalysis::general();
        }

        let pattern_hits = self.collect_hits(&lower);
        let classification = Self::classify(&pattern_hits);
        let complexity = Self::assess_complexity(&lower);
        let urgency = Self::assess_urgency(&lower);
        let scope = Self::assess_scope(&lower);
        let multi_agent_required = Self::assess_multi_agent(&lower, &pattern_hits, complexity);

        debug!(
            classification = %classification,
            complexity = %complexity,
            urgency = %urgency,
            scope = %scope,
            matched_domains = pattern_hits.len(),
            multi_agent_required,
            "Task analysis complete"
        );

        TaskAnalysis {
            classification,
            complexity,
            urgency,
            scope,
            pattern_hits,
            multi_agent_required,
        }
    }

    /// Records every matching pattern, not just the first, in table order.
    fn collect_hits(&self, lower: &str) -> Vec<DomainHits> {
        let mut hits = Vec::new();
        for entry in &self.table {
            let matched: Vec<String> = entry
                .patterns
                .iter()
                .filter(|(_, regex)| regex.is_match(lower))
                .map(|(pattern, _)| pattern.clone())
                .collect();
            if !matched.is_empty() {
                hits.push(DomainHits { domain: entry.domain.to_string(), patterns: matched });
            }
        }
        hits
    }

    /// The domain with the most matches wins; ties go to table order.
    fn classify(hits: &[DomainHits]) -> String {
        let mut best: Option<&DomainHits> = None;
        for hit in hits {
            let beats_current = best.is_none_or(|b| hit.patterns.len() > b.patterns.len());
            if beats_current {
                best = Some(hit);
            }
        }
        best.map_or_else(|| GENERAL_CLASSIFICATION.to_string(), |h| h.domain.clone())
    }

    fn assess_complexity(lower: &str) -> Complexity {
        let mut high = Self::count_indicators(lower, HIGH_COMPLEXITY_INDICATORS);
        let mut medium = Self::count_indicators(lower, MEDIUM_COMPLEXITY_INDICATORS);
        let low = Self::count_indicators(lower, LOW_COMPLEXITY_INDICATORS);

        // Explicit scale markers such as "10,000+" push complexity up.
        if Self::has_scale_marker(lower) {
            high += 1;
        }

        // Long text and many requirement bullets are structural signals.
        let length_factor = lower.len() as f64 / 1000.0;
        if length_factor > 2.0 {
            high += 2;
        } else if length_factor > 1.0 {
            medium += 1;
        }

        let bullets = Self::count_bullets(lower);
        if bullets >= 5 {
            high += 1;
        } else if bullets >= 2 {
            medium += 1;
        }

        if high == 0 && medium == 0 && low == 0 {
            return Complexity::Medium;
        }
        if high >= medium && high >= low {
            Complexity::High
        } else if medium >= low {
            Complexity::Medium
        } else {
            Complexity::Low
        }
    }

    fn assess_urgency(lower: &str) -> Urgency {
        if URGENT_INDICATORS.iter().any(|i| lower.contains(i)) {
            Urgency::High
        } else if TIMELY_INDICATORS.iter().any(|i| lower.contains(i)) {
            Urgency::Medium
        } else {
            Urgency::Low
        }
    }

    fn assess_scope(lower: &str) -> Scope {
        if PROGRAM_SCOPE_INDICATORS.iter().any(|i| lower.contains(i)) {
            Scope::Program
        } else if PROJECT_SCOPE_INDICATORS.iter().any(|i| lower.contains(i)) {
            Scope::Project
        } else {
            Scope::Task
        }
    }

    fn assess_multi_agent(lower: &str, hits: &[DomainHits], complexity: Complexity) -> bool {
        MULTI_AGENT_INDICATORS.iter().any(|i| lower.contains(i))
            || hits.len() > 1
            || complexity == Complexity::High
    }

    fn count_indicators(lower: &str, indicators: &[&str]) -> usize {
        indicators.iter().filter(|i| lower.contains(*i)).count()
    }

    /// Detects markers like "10,000+" or "250k users".
    fn has_scale_marker(lower: &str) -> bool {
        let mut chars = lower.chars().peekable();
        while let Some(c) = chars.next() {
            if c.is_ascii_digit() {
                let mut digits = 1;
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_digit() || next == ',' {
                        digits += 1;
                        chars.next();
                    } else {
                        break;
                    }
                }
                if digits >= 4 {
                    return true;
                }
                if digits >= 2 && matches!(chars.peek().copied(), Some('+' | 'k')) {
                    return true;
                }
            }
        }
        false
    }

    fn count_bullets(lower: &str) -> usize {
        lower
            .lines()
            .filter(|line| {
                let trimmed = line.trim_start();
                trimmed.starts_with('-')
                    || trimmed.starts_with('*')
                    || trimmed.starts_with('•')
                    || trimmed.chars().next().is_some_and(|c| c.is_ascii_digit())
            })
            .count()
    }
}

impl Default for TaskAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_yields_general_low() {
        let analyzer = TaskAnalyzer::new();
        let analysis = analyzer.analyze("", None);
        assert_eq!(analysis.classification, GENERAL_CLASSIFICATION);
        assert_eq!(analysis.complexity, Complexity::Low);
        assert_eq!(analysis.urgency, Urgency::Low);
        assert!(!analysis.multi_agent_required);
        assert!(analysis.pattern_hits.is_empty());
    }

    #[test]
    fn test_whitespace_text_yields_general_low() {
        let analyzer = TaskAnalyzer::new();
        let analysis = analyzer.analyze("   \n\t  ", None);
        assert_eq!(analysis.classification, GENERAL_CLASSIFICATION);
        assert_eq!(analysis.complexity, Complexity::Low);
    }

    #[test]
    fn test_project_management_classification() {
        let analyzer = TaskAnalyzer::new();
        let analysis = analyzer.analyze(
            "We need a project plan covering risk assessment and stakeholder management",
            None,
        );
        assert_eq!(analysis.classification, "project_management");
        assert!(!analysis.pattern_hits.is_empty());
        assert_eq!(analysis.pattern_hits[0].domain, "project_management");
    }

    #[test]
    fn test_all_matches_recorded_not_just_first() {
        let analyzer = TaskAnalyzer::new();
        let analysis = analyzer
            .analyze("Create a project plan, then evaluate the quality of each deliverable", None);
        assert!(analysis.matched_domains() > 1);
    }

    #[test]
    fn test_unmatched_text_is_general_not_error() {
        let analyzer = TaskAnalyzer::new();
        let analysis = analyzer.analyze("hello there", None);
        assert_eq!(analysis.classification, GENERAL_CLASSIFICATION);
        assert!(analysis.pattern_hits.is_empty());
    }

    #[test]
    fn test_urgency_detection() {
        let analyzer = TaskAnalyzer::new();
        let urgent = analyzer.analyze("This is urgent, respond immediately", None);
        assert_eq!(urgent.urgency, Urgency::High);

        let timely = analyzer.analyze("Please handle this soon", None);
        assert_eq!(timely.urgency, Urgency::Medium);

        let relaxed = analyzer.analyze("Whenever you get a chance", None);
        assert_eq!(relaxed.urgency, Urgency::Low);
    }

    #[test]
    fn test_scope_detection() {
        let analyzer = TaskAnalyzer::new();
        let program = analyzer.analyze("An enterprise rollout across the org", None);
        assert_eq!(program.scope, Scope::Program);

        let project = analyzer.analyze("A project-specific change for the team", None);
        assert_eq!(project.scope, Scope::Project);

        let task = analyzer.analyze("Fix one thing", None);
        assert_eq!(task.scope, Scope::Task);
    }

    #[test]
    fn test_scale_marker_raises_complexity() {
        let analyzer = TaskAnalyzer::new();
        let analysis = analyzer.analyze("Support 10,000+ concurrent users on the platform", None);
        assert_eq!(analysis.complexity, Complexity::High);
    }

    #[test]
    fn test_complexity_indicator_words() {
        let analyzer = TaskAnalyzer::new();
        let high = analyzer.analyze("A comprehensive enterprise integration effort", None);
        assert_eq!(high.complexity, Complexity::High);

        let low = analyzer.analyze("A simple and quick change", None);
        assert_eq!(low.complexity, Complexity::Low);
    }

    #[test]
    fn test_multi_agent_from_breadth_markers() {
        let analyzer = TaskAnalyzer::new();
        let analysis = analyzer.analyze("An end-to-end overhaul of onboarding", None);
        assert!(analysis.multi_agent_required);
    }

    #[test]
    fn test_multi_agent_from_spanning_domains() {
        let analyzer = TaskAnalyzer::new();
        let analysis = analyzer
            .analyze("Create a project plan, then evaluate the quality of the results", None);
        assert!(analysis.multi_agent_required);
    }

    #[test]
    fn test_context_is_considered() {
        let analyzer = TaskAnalyzer::new();
        let analysis = analyzer.analyze("Handle this", Some("risk assessment for the project plan"));
        assert_eq!(analysis.classification, "project_management");
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let analyzer = TaskAnalyzer::new();
        let text = "Create a comprehensive project plan with risk assessment";
        assert_eq!(analyzer.analyze(text, None), analyzer.analyze(text, None));
    }
}
