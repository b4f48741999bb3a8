//! Weighted artifact evaluation with a bounded correction loop.
//!
//! `EvaluationLoop` scores an artifact against a weighted criteria table via
//! a completion provider, derives correction directives from the weakest
//! criteria, annotates the artifact with them, and re-scores until the
//! overall score clears the threshold or the iteration budget is spent.
//! Scoring failures are absorbed as neutral scores; the loop itself never
//! returns an error.

use crate::error::{OrchestrationError, Result};
use cadre_abstraction::{CompletionParams, CompletionProvider, ProviderError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Score substituted for every criterion when a scoring call fails.
pub const NEUTRAL_SCORE: f64 = 5.0;

/// Upper bound of the per-criterion scoring scale.
pub const MAX_CRITERION_SCORE: f64 = 10.0;

/// Default overall score required to stop correcting.
pub const DEFAULT_CORRECTION_THRESHOLD: f64 = 7.0;

/// Default cap on correction iterations.
pub const DEFAULT_MAX_ITERATIONS: u32 = 3;

/// Directive recorded when a scoring response cannot be parsed.
const PARSE_FAILURE_DIRECTIVE: &str = "Review evaluation format";

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// A single named, weighted scoring criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    /// Criterion name, used as the score key.
    pub name: String,
    /// Contribution to the overall score, in [0, 1].
    pub weight: f64,
}

impl Criterion {
    /// Creates a criterion.
    #[must_use]
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self { name: name.into(), weight }
    }
}

/// A named, validated table of weighted criteria.
///
/// Weights must sum to 1.0 within a small tolerance so the overall score
/// stays on the same 0 to 10 scale as the per-criterion scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationCriteria {
    name: String,
    criteria: Vec<Criterion>,
}

impl EvaluationCriteria {
    /// Creates a criteria table after validating the weights.
    ///
    /// # Errors
    /// Returns `OrchestrationError::InvalidConfiguration` when the table is
    /// empty, a name is blank or duplicated, a weight falls outside [0, 1],
    /// or the weights do not sum to 1.0.
    pub fn new(name: impl Into<String>, criteria: Vec<Criterion>) -> Result<Self> {
        let name = name.into();
        if criteria.is_empty() {
            return Err(OrchestrationError::InvalidConfiguration(format!(
                "criteria table '{name}' must declare at least one criterion"
            )));
        }
        let mut seen: Vec<&str> = Vec::with_capacity(criteria.len());
        let mut total = 0.0;
        for criterion in &criteria {
            if criterion.name.trim().is_empty() {
                return Err(OrchestrationError::InvalidConfiguration(format!(
                    "criteria table '{name}' contains a criterion with an empty name"
                )));
            }
            if seen.contains(&criterion.name.as_str()) {
                return Err(OrchestrationError::InvalidConfiguration(format!(
                    "criteria table '{name}' declares '{}' more than once",
                    criterion.name
                )));
            }
            if !(0.0..=1.0).contains(&criterion.weight) {
                return Err(OrchestrationError::InvalidConfiguration(format!(
                    "criterion '{}' weight {} must be within [0, 1]",
                    criterion.name, criterion.weight
                )));
            }
            seen.push(criterion.name.as_str());
            total += criterion.weight;
        }
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(OrchestrationError::InvalidConfiguration(format!(
                "criteria table '{name}' weights sum to {total}, expected 1.0"
            )));
        }
        Ok(Self { name, criteria })
    }

    /// Weighted criteria for judging project management artifacts.
    #[must_use]
    pub fn project_management() -> Self {
        Self::preset(
            "project_management",
            &[
                ("planning_quality", 0.25),
                ("resource_allocation", 0.20),
                ("risk_management", 0.20),
                ("stakeholder_engagement", 0.15),
                ("timeline_feasibility", 0.20),
            ],
        )
    }

    /// Weighted criteria for judging action plans.
    #[must_use]
    pub fn action_plan() -> Self {
        Self::preset(
            "action_plan",
            &[
                ("completeness", 0.25),
                ("clarity", 0.20),
                ("sequencing", 0.20),
                ("resource_requirements", 0.15),
                ("success_metrics", 0.20),
            ],
        )
    }

    /// Weighted criteria for judging technical solutions.
    #[must_use]
    pub fn technical_solution() -> Self {
        Self::preset(
            "technical_solution",
            &[
                ("technical_accuracy", 0.30),
                ("feasibility", 0.25),
                ("completeness", 0.25),
                ("innovation", 0.20),
            ],
        )
    }

    // Bundled tables carry known-good weights, so skip validation.
    fn preset(name: &str, table: &[(&str, f64)]) -> Self {
        Self {
            name: name.to_string(),
            criteria: table
                .iter()
                .map(|(criterion, weight)| Criterion::new(*criterion, *weight))
                .collect(),
        }
    }

    /// The table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The criteria in declaration order.
    #[must_use]
    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }
}

/// One correction iteration: the scores around it and the directives applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionRecord {
    /// 1-based iteration index.
    pub iteration: u32,
    /// Overall score before this iteration's corrections.
    pub previous_score: f64,
    /// Overall score after re-scoring the annotated artifact.
    pub new_score: f64,
    /// Directives appended to the artifact this iteration.
    pub directives: Vec<String>,
}

/// Final outcome of an evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Name of the criteria table used.
    pub criteria_name: String,
    /// Per-criterion scores from the final scoring pass, 0 to 10.
    pub scores: BTreeMap<String, f64>,
    /// Per-criterion weights, summing to 1.0.
    pub weights: BTreeMap<String, f64>,
    /// Weighted overall score from the final pass, 0 to 10.
    pub overall_score: f64,
    /// Threshold the overall score was held against.
    pub threshold: f64,
    /// Whether the final overall score cleared the threshold.
    pub passed: bool,
    /// Number of correction iterations performed.
    pub iterations_performed: u32,
    /// One record per correction iteration, in order. Never longer than the
    /// configured iteration cap.
    pub correction_history: Vec<CorrectionRecord>,
}

/// Outcome of one scoring pass over the (possibly annotated) artifact.
struct ScoringPass {
    scores: BTreeMap<String, f64>,
    overall: f64,
    parsed: bool,
}

/// Scores artifacts and applies correction directives until the threshold or
/// iteration cap is reached.
pub struct EvaluationLoop {
    provider: Arc<dyn CompletionProvider>,
    criteria: EvaluationCriteria,
    threshold: f64,
    max_iterations: u32,
    call_timeout: Option<Duration>,
}

impl EvaluationLoop {
    /// Creates a loop with the default threshold and iteration cap.
    #[must_use]
    pub fn new(provider: Arc<dyn CompletionProvider>, criteria: EvaluationCriteria) -> Self {
        Self {
            provider,
            criteria,
            threshold: DEFAULT_CORRECTION_THRESHOLD,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            call_timeout: None,
        }
    }

    /// Sets the overall score required to stop correcting.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets the cap on correction iterations. Zero disables correction.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Bounds each scoring call; expiry counts as a failed call, not a crash.
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// The criteria table this loop scores against.
    #[must_use]
    pub fn criteria(&self) -> &EvaluationCriteria {
        &self.criteria
    }

    /// Evaluates an artifact, correcting until the threshold or cap.
    ///
    /// Scoring failures (transport, timeout, unparsable response) substitute
    /// the neutral score for every criterion and record a format-review
    /// directive; they never abort the run.
    pub async fn run(&self, artifact: &str) -> EvaluationResult {
        let mut current = artifact.to_string();
        let mut pass = self.score_artifact(&current).await;
        let mut iterations: u32 = 0;
        let mut history: Vec<CorrectionRecord> = Vec::new();

        while pass.overall < self.threshold && iterations < self.max_iterations {
            let directives = self.derive_directives(&pass);
            current = Self::apply_directives(&current, &directives);
            let next = self.score_artifact(&current).await;
            iterations += 1;
            debug!(
                iteration = iterations,
                previous_score = pass.overall,
                new_score = next.overall,
                directives = directives.len(),
                "Correction iteration scored"
            );
            history.push(CorrectionRecord {
                iteration: iterations,
                previous_score: pass.overall,
                new_score: next.overall,
                directives,
            });
            pass = next;
        }

        let passed = pass.overall >= self.threshold;
        info!(
            criteria = %self.criteria.name,
            overall_score = pass.overall,
            iterations_performed = iterations,
            passed,
            "Evaluation finished"
        );
        EvaluationResult {
            criteria_name: self.criteria.name.clone(),
            scores: pass.scores,
            weights: self
                .criteria
                .criteria
                .iter()
                .map(|criterion| (criterion.name.clone(), criterion.weight))
                .collect(),
            overall_score: pass.overall,
            threshold: self.threshold,
            passed,
            iterations_performed: iterations,
            correction_history: history,
        }
    }

    async fn score_artifact(&self, artifact: &str) -> ScoringPass {
        match self.request_scores(artifact).await {
            Ok(content) => parse_score_map(&content).map_or_else(
                || {
                    warn!("Scoring response was not parseable; substituting neutral scores");
                    self.neutral_pass()
                },
                |raw| {
                    let scores = self.normalize_scores(&raw);
                    let overall = self.weighted_overall(&scores);
                    ScoringPass { scores, overall, parsed: true }
                },
            ),
            Err(error) => {
                warn!(%error, "Scoring call failed; substituting neutral scores");
                self.neutral_pass()
            }
        }
    }

    async fn request_scores(&self, artifact: &str) -> std::result::Result<String, ProviderError> {
        let prompt = self.scoring_prompt(artifact);
        let params = CompletionParams { temperature: Some(0.1), ..CompletionParams::default() };
        let call = self.provider.complete(&prompt, Some(params));
        let response = match self.call_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result?,
                Err(_) => return Err(ProviderError::Timeout(limit.as_millis() as u64)),
            },
            None => call.await?,
        };
        Ok(response.content)
    }

    fn scoring_prompt(&self, artifact: &str) -> String {
        let names: Vec<&str> =
            self.criteria.criteria.iter().map(|criterion| criterion.name.as_str()).collect();
        format!(
            "Score the following artifact against each criterion on a scale of 0 to 10.\n\
             Respond with only a JSON object mapping criterion name to numeric score.\n\n\
             Criteria: {}\n\nArtifact:\n{artifact}",
            names.join(", "),
        )
    }

    // Missing criteria score neutral; out-of-range scores are clamped.
    fn normalize_scores(&self, raw: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
        self.criteria
            .criteria
            .iter()
            .map(|criterion| {
                let score = raw
                    .get(&criterion.name)
                    .copied()
                    .unwrap_or(NEUTRAL_SCORE)
                    .clamp(0.0, MAX_CRITERION_SCORE);
                (criterion.name.clone(), score)
            })
            .collect()
    }

    fn weighted_overall(&self, scores: &BTreeMap<String, f64>) -> f64 {
        self.criteria
            .criteria
            .iter()
            .map(|criterion| {
                criterion.weight * scores.get(&criterion.name).copied().unwrap_or(NEUTRAL_SCORE)
            })
            .sum()
    }

    fn neutral_pass(&self) -> ScoringPass {
        let scores: BTreeMap<String, f64> = self
            .criteria
            .criteria
            .iter()
            .map(|criterion| (criterion.name.clone(), NEUTRAL_SCORE))
            .collect();
        let overall = self.weighted_overall(&scores);
        ScoringPass { scores, overall, parsed: false }
    }

    /// Weakest criteria first; ties keep declaration order. An unparsed pass
    /// yields the single format-review directive instead.
    fn derive_directives(&self, pass: &ScoringPass) -> Vec<String> {
        if !pass.parsed {
            return vec![PARSE_FAILURE_DIRECTIVE.to_string()];
        }
        let mut weak: Vec<(&str, f64)> = self
            .criteria
            .criteria
            .iter()
            .filter_map(|criterion| {
                let score = pass.scores.get(&criterion.name).copied().unwrap_or(NEUTRAL_SCORE);
                (score < self.threshold).then_some((criterion.name.as_str(), score))
            })
            .collect();
        weak.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        weak.iter()
            .map(|(criterion, score)| format!("Improve {criterion}: scored {score:.1}/10"))
            .collect()
    }

    fn apply_directives(artifact: &str, directives: &[String]) -> String {
        let mut annotated = String::with_capacity(artifact.len() + 64);
        annotated.push_str(artifact);
        annotated.push_str("\n\nCORRECTIONS APPLIED:\n");
        for directive in directives {
            annotated.push_str("- ");
            annotated.push_str(directive);
            annotated.push('\n');
        }
        annotated
    }
}

/// Extracts a criterion-to-score map from a completion response.
///
/// Tries the whole (trimmed) body first, then the outermost brace-delimited
/// substring for responses that wrap the JSON in prose.
fn parse_score_map(content: &str) -> Option<BTreeMap<String, f64>> {
    let trimmed = content.trim();
    if let Ok(map) = serde_json::from_str::<BTreeMap<String, f64>>(trimmed) {
        return Some(map);
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&trimmed[start..=end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cadre_abstraction::{ChatMessage, CompletionResponse};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    // Provider returning the same body for every call.
    struct ConstantProvider {
        body: String,
    }

    impl ConstantProvider {
        fn new(body: &str) -> Self {
            Self { body: body.to_string() }
        }
    }

    #[async_trait]
    impl CompletionProvider for ConstantProvider {
        async fn complete(
            &self,
            _prompt: &str,
            _params: Option<CompletionParams>,
        ) -> std::result::Result<CompletionResponse, ProviderError> {
            Ok(CompletionResponse { content: self.body.clone(), model_id: None, usage: None })
        }

        async fn complete_chat(
            &self,
            _messages: &[ChatMessage],
            _params: Option<CompletionParams>,
        ) -> std::result::Result<CompletionResponse, ProviderError> {
            self.complete("", None).await
        }

        fn provider_id(&self) -> &str {
            "constant"
        }
    }

    // Provider replaying a scripted sequence of bodies.
    struct SequenceProvider {
        bodies: Mutex<VecDeque<String>>,
    }

    impl SequenceProvider {
        fn new(bodies: &[&str]) -> Self {
            Self { bodies: Mutex::new(bodies.iter().map(|b| (*b).to_string()).collect()) }
        }
    }

    #[async_trait]
    impl CompletionProvider for SequenceProvider {
        async fn complete(
            &self,
            _prompt: &str,
            _params: Option<CompletionParams>,
        ) -> std::result::Result<CompletionResponse, ProviderError> {
            let body = self
                .bodies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ProviderError::Other("script exhausted".to_string()))?;
            Ok(CompletionResponse { content: body, model_id: None, usage: None })
        }

        async fn complete_chat(
            &self,
            _messages: &[ChatMessage],
            _params: Option<CompletionParams>,
        ) -> std::result::Result<CompletionResponse, ProviderError> {
            self.complete("", None).await
        }

        fn provider_id(&self) -> &str {
            "sequence"
        }
    }

    // Provider that always fails at the transport layer.
    struct FailingProvider;

    #[async_trait]
    impl CompletionProvider for FailingProvider {
        async fn complete(
            &self,
            _prompt: &str,
            _params: Option<CompletionParams>,
        ) -> std::result::Result<CompletionResponse, ProviderError> {
            Err(ProviderError::RequestError("connection refused".to_string()))
        }

        async fn complete_chat(
            &self,
            _messages: &[ChatMessage],
            _params: Option<CompletionParams>,
        ) -> std::result::Result<CompletionResponse, ProviderError> {
            self.complete("", None).await
        }

        fn provider_id(&self) -> &str {
            "failing"
        }
    }

    // Provider that never responds in time.
    struct SleepyProvider;

    #[async_trait]
    impl CompletionProvider for SleepyProvider {
        async fn complete(
            &self,
            _prompt: &str,
            _params: Option<CompletionParams>,
        ) -> std::result::Result<CompletionResponse, ProviderError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(CompletionResponse { content: "{}".to_string(), model_id: None, usage: None })
        }

        async fn complete_chat(
            &self,
            _messages: &[ChatMessage],
            _params: Option<CompletionParams>,
        ) -> std::result::Result<CompletionResponse, ProviderError> {
            self.complete("", None).await
        }

        fn provider_id(&self) -> &str {
            "sleepy"
        }
    }

    fn three_way_criteria() -> EvaluationCriteria {
        EvaluationCriteria::new(
            "custom",
            vec![Criterion::new("a", 0.4), Criterion::new("b", 0.3), Criterion::new("c", 0.3)],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_passing_artifact_skips_correction() {
        let provider = Arc::new(ConstantProvider::new(r#"{"a": 9.0, "b": 8.0, "c": 9.0}"#));
        let evaluator = EvaluationLoop::new(provider, three_way_criteria());
        let result = evaluator.run("a strong plan").await;

        assert!(result.passed);
        assert_eq!(result.iterations_performed, 0);
        assert!(result.correction_history.is_empty());
        assert!((result.overall_score - 8.7).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_neutral_scores_iterate_to_cap() {
        let provider = Arc::new(ConstantProvider::new(r#"{"a": 5.0, "b": 5.0, "c": 5.0}"#));
        let evaluator = EvaluationLoop::new(provider, three_way_criteria());
        let result = evaluator.run("a mediocre plan").await;

        assert!(!result.passed);
        assert_eq!(result.iterations_performed, DEFAULT_MAX_ITERATIONS);
        assert_eq!(result.correction_history.len(), DEFAULT_MAX_ITERATIONS as usize);
        assert!((result.overall_score - 5.0).abs() < 1e-9);
        for (index, record) in result.correction_history.iter().enumerate() {
            assert_eq!(record.iteration, index as u32 + 1);
            assert!((record.previous_score - 5.0).abs() < 1e-9);
            assert!((record.new_score - 5.0).abs() < 1e-9);
            assert!(!record.directives.is_empty());
        }
    }

    #[tokio::test]
    async fn test_zero_max_iterations_returns_first_pass() {
        let provider = Arc::new(ConstantProvider::new(r#"{"a": 5.0, "b": 5.0, "c": 5.0}"#));
        let evaluator =
            EvaluationLoop::new(provider, three_way_criteria()).with_max_iterations(0);
        let result = evaluator.run("a mediocre plan").await;

        assert_eq!(result.iterations_performed, 0);
        assert!(result.correction_history.is_empty());
        assert_eq!(result.scores.len(), 3);
        assert!(!result.passed);
    }

    #[tokio::test]
    async fn test_provider_failure_substitutes_neutral_scores() {
        let evaluator = EvaluationLoop::new(Arc::new(FailingProvider), three_way_criteria())
            .with_max_iterations(1);
        let result = evaluator.run("anything").await;

        assert!((result.overall_score - NEUTRAL_SCORE).abs() < 1e-9);
        for score in result.scores.values() {
            assert!((score - NEUTRAL_SCORE).abs() < f64::EPSILON);
        }
        assert_eq!(result.iterations_performed, 1);
        assert_eq!(result.correction_history[0].directives, vec![PARSE_FAILURE_DIRECTIVE]);
    }

    #[tokio::test]
    async fn test_unparsable_response_substitutes_neutral_scores() {
        let provider = Arc::new(ConstantProvider::new("I would rate this about a seven."));
        let evaluator =
            EvaluationLoop::new(provider, three_way_criteria()).with_max_iterations(1);
        let result = evaluator.run("anything").await;

        assert!((result.overall_score - NEUTRAL_SCORE).abs() < 1e-9);
        assert_eq!(result.correction_history[0].directives, vec![PARSE_FAILURE_DIRECTIVE]);
    }

    #[tokio::test]
    async fn test_call_timeout_is_absorbed() {
        let evaluator = EvaluationLoop::new(Arc::new(SleepyProvider), three_way_criteria())
            .with_max_iterations(0)
            .with_call_timeout(Duration::from_millis(5));
        let result = evaluator.run("anything").await;

        assert!((result.overall_score - NEUTRAL_SCORE).abs() < 1e-9);
        assert_eq!(result.iterations_performed, 0);
    }

    #[tokio::test]
    async fn test_directives_weakest_first_ties_by_declaration() {
        let provider = Arc::new(SequenceProvider::new(&[
            r#"{"a": 6.0, "b": 3.0, "c": 6.0}"#,
            r#"{"a": 9.0, "b": 9.0, "c": 9.0}"#,
        ]));
        let evaluator = EvaluationLoop::new(provider, three_way_criteria());
        let result = evaluator.run("a weak plan").await;

        assert!(result.passed);
        assert_eq!(result.iterations_performed, 1);
        assert_eq!(
            result.correction_history[0].directives,
            vec![
                "Improve b: scored 3.0/10".to_string(),
                "Improve a: scored 6.0/10".to_string(),
                "Improve c: scored 6.0/10".to_string(),
            ]
        );
        assert!((result.correction_history[0].previous_score - 5.1).abs() < 1e-9);
        assert!((result.correction_history[0].new_score - 9.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_json_extracted_from_surrounding_prose() {
        let provider = Arc::new(ConstantProvider::new(
            "Here are my scores:\n{\"a\": 8.0, \"b\": 8.0, \"c\": 8.0}\nGood luck!",
        ));
        let evaluator = EvaluationLoop::new(provider, three_way_criteria());
        let result = evaluator.run("a plan").await;

        assert!(result.passed);
        assert!((result.overall_score - 8.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_missing_criterion_scores_neutral_and_out_of_range_clamps() {
        let provider = Arc::new(ConstantProvider::new(r#"{"a": 15.0, "b": -2.0}"#));
        let evaluator =
            EvaluationLoop::new(provider, three_way_criteria()).with_max_iterations(0);
        let result = evaluator.run("a plan").await;

        assert!((result.scores["a"] - 10.0).abs() < f64::EPSILON);
        assert!((result.scores["b"] - 0.0).abs() < f64::EPSILON);
        assert!((result.scores["c"] - NEUTRAL_SCORE).abs() < f64::EPSILON);
        // 0.4 * 10 + 0.3 * 0 + 0.3 * 5
        assert!((result.overall_score - 5.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_correction_annotation_format() {
        let annotated = EvaluationLoop::apply_directives(
            "original text",
            &["Improve a: scored 3.0/10".to_string()],
        );
        assert!(annotated.starts_with("original text"));
        assert!(annotated.contains("\n\nCORRECTIONS APPLIED:\n"));
        assert!(annotated.contains("- Improve a: scored 3.0/10\n"));
    }

    #[test]
    fn test_criteria_validation_rejects_bad_tables() {
        assert!(EvaluationCriteria::new("empty", vec![]).is_err());
        assert!(EvaluationCriteria::new("short", vec![Criterion::new("a", 0.5)]).is_err());
        assert!(
            EvaluationCriteria::new(
                "negative",
                vec![Criterion::new("a", -0.5), Criterion::new("b", 1.5)]
            )
            .is_err()
        );
        assert!(
            EvaluationCriteria::new(
                "duplicate",
                vec![Criterion::new("a", 0.5), Criterion::new("a", 0.5)]
            )
            .is_err()
        );
        assert!(
            EvaluationCriteria::new(
                "blank",
                vec![Criterion::new("  ", 0.5), Criterion::new("b", 0.5)]
            )
            .is_err()
        );
    }

    #[test]
    fn test_preset_weights_sum_to_one() {
        for preset in [
            EvaluationCriteria::project_management(),
            EvaluationCriteria::action_plan(),
            EvaluationCriteria::technical_solution(),
        ] {
            let total: f64 = preset.criteria().iter().map(|criterion| criterion.weight).sum();
            assert!((total - 1.0).abs() < 1e-9, "{} weights sum to {total}", preset.name());
        }
    }

    #[test]
    fn test_parse_score_map_handles_malformed_input() {
        assert!(parse_score_map("no json here").is_none());
        assert!(parse_score_map("} {").is_none());
        assert!(parse_score_map(r#"{"a": "high"}"#).is_none());
        let parsed = parse_score_map(r#" {"a": 7} "#).unwrap();
        assert!((parsed["a"] - 7.0).abs() < f64::EPSILON);
    }
}
