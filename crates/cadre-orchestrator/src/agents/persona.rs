//! Role-framed support agents backed by a completion provider.
//!
//! A `PersonaAgent` wraps a completion call in a role prompt and reports a
//! fixed confidence. Completion failures produce a templated fallback output
//! instead of an error, so a persona step can degrade but never crash a
//! workflow. An attached evaluation loop scores each response and surfaces
//! the score through reply metadata.

use super::{Agent, AgentReply, TaskContext};
use crate::evaluation::{EvaluationLoop, MAX_CRITERION_SCORE};
use async_trait::async_trait;
use cadre_abstraction::{CompletionParams, CompletionProvider, ProviderError};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

/// Confidence reported for a successful, unevaluated completion.
pub const DEFAULT_CONFIDENCE: f64 = 0.75;

/// Confidence reported for a templated fallback output.
pub const FALLBACK_CONFIDENCE: f64 = 0.3;

/// An agent that answers queries in a fixed professional role.
pub struct PersonaAgent {
    id: String,
    description: String,
    persona: String,
    provider: Arc<dyn CompletionProvider>,
    evaluator: Option<Arc<EvaluationLoop>>,
}

impl PersonaAgent {
    /// Creates a persona agent.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        persona: impl Into<String>,
        provider: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            persona: persona.into(),
            provider,
            evaluator: None,
        }
    }

    /// Chains each response through an evaluation loop; the overall score
    /// lands in reply metadata under `evaluation_score` and drives the
    /// reported confidence. Pass a loop with a zero iteration cap for a
    /// plain scoring pass.
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: Arc<EvaluationLoop>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Product strategy role: user needs, stories, and requirements.
    #[must_use]
    pub fn product_strategy(provider: Arc<dyn CompletionProvider>) -> Self {
        Self::new(
            "product_strategy",
            "Defines product strategy, user stories, and requirements",
            "You are a product manager responsible for product strategy, user \
             stories, and product requirements. Focus on user needs and market \
             fit, and translate the request into actionable product \
             specifications.",
            provider,
        )
    }

    /// Program delivery role: coordination, timelines, and resourcing.
    #[must_use]
    pub fn program_delivery(provider: Arc<dyn CompletionProvider>) -> Self {
        Self::new(
            "program_delivery",
            "Coordinates teams, timelines, and program delivery",
            "You are a program manager responsible for coordinating \
             cross-functional teams and delivering programs. Focus on resource \
             allocation, risk management, and stakeholder coordination.",
            provider,
        )
    }

    /// Engineering role: technical design and implementation planning.
    #[must_use]
    pub fn engineering(provider: Arc<dyn CompletionProvider>) -> Self {
        Self::new(
            "engineering",
            "Handles technical design and implementation",
            "You are a development engineer responsible for technical \
             implementation and architecture. Focus on system design, coding \
             standards, and technical feasibility.",
            provider,
        )
    }

    fn compose_prompt(&self, query: &str, context: &TaskContext) -> String {
        let mut prompt = String::with_capacity(self.persona.len() + query.len() + 64);
        prompt.push_str(&self.persona);
        if !context.prior_outputs().is_empty() {
            prompt.push_str("\n\nOutput from earlier steps:\n");
            for output in context.prior_outputs() {
                prompt.push_str("- ");
                prompt.push_str(output);
                prompt.push('\n');
            }
        }
        prompt.push_str("\n\nRequest:\n");
        prompt.push_str(query);
        prompt
    }

    fn fallback_output(&self, query: &str) -> String {
        format!(
            "[{}] The completion service could not be reached. The request \
             below needs manual handling by someone covering this role:\n{query}",
            self.id,
        )
    }
}

#[async_trait]
impl Agent for PersonaAgent {
    fn id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn invoke(
        &self,
        query: &str,
        context: &TaskContext,
    ) -> std::result::Result<AgentReply, ProviderError> {
        let prompt = self.compose_prompt(query, context);
        match self.provider.complete(&prompt, Some(CompletionParams::default())).await {
            Ok(response) => {
                let mut reply = AgentReply::new(response.content, DEFAULT_CONFIDENCE);
                if let Some(evaluator) = &self.evaluator {
                    let evaluation = evaluator.run(&reply.output).await;
                    reply.confidence =
                        (evaluation.overall_score / MAX_CRITERION_SCORE).clamp(0.0, 1.0);
                    reply = reply
                        .with_metadata("evaluation_score", json!(evaluation.overall_score));
                }
                Ok(reply)
            }
            Err(error) => {
                warn!(agent_id = %self.id, %error, "Completion failed; returning fallback output");
                Ok(AgentReply::new(self.fallback_output(query), FALLBACK_CONFIDENCE)
                    .with_metadata("fallback", json!(true)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::EvaluationCriteria;
    use cadre_abstraction::{ChatMessage, CompletionResponse};
    use cadre_providers::OfflineProvider;

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

    struct ScoringProvider;

    #[async_trait]
    impl CompletionProvider for ScoringProvider {
        async fn complete(
            &self,
            prompt: &str,
            _params: Option<CompletionParams>,
        ) -> std::result::Result<CompletionResponse, ProviderError> {
            // Scoring prompts ask for JSON; everything else gets prose.
            let content = if prompt.contains("JSON object") {
                r#"{"technical_accuracy": 8.0, "feasibility": 8.0, "completeness": 8.0, "innovation": 8.0}"#
                    .to_string()
            } else {
                "A considered answer in role.".to_string()
            };
            Ok(CompletionResponse { content, model_id: None, usage: None })
        }

        async fn complete_chat(
            &self,
            _messages: &[ChatMessage],
            _params: Option<CompletionParams>,
        ) -> std::result::Result<CompletionResponse, ProviderError> {
            self.complete("", None).await
        }

        fn provider_id(&self) -> &str {
            "scoring"
        }
    }

    #[tokio::test]
    async fn test_successful_completion_reports_default_confidence() {
        let agent =
            PersonaAgent::product_strategy(Arc::new(OfflineProvider::new("offline".to_string())));
        let reply = agent.invoke("Define stories for the billing page", &TaskContext::new())
            .await
            .unwrap();

        assert!(!reply.output.is_empty());
        assert!((reply.confidence - DEFAULT_CONFIDENCE).abs() < f64::EPSILON);
        assert!(reply.metadata.is_empty());
    }

    #[tokio::test]
    async fn test_completion_failure_degrades_to_fallback() {
        let agent = PersonaAgent::engineering(Arc::new(FailingProvider));
        let reply =
            agent.invoke("Design the ingestion service", &TaskContext::new()).await.unwrap();

        assert!(reply.output.contains("Design the ingestion service"));
        assert!((reply.confidence - FALLBACK_CONFIDENCE).abs() < f64::EPSILON);
        assert_eq!(reply.metadata.get("fallback"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn test_chained_evaluation_lands_in_metadata() {
        let provider = Arc::new(ScoringProvider);
        let evaluator = Arc::new(
            EvaluationLoop::new(provider.clone(), EvaluationCriteria::technical_solution())
                .with_max_iterations(0),
        );
        let agent = PersonaAgent::engineering(provider).with_evaluator(evaluator);
        let reply =
            agent.invoke("Design the ingestion service", &TaskContext::new()).await.unwrap();

        let score = reply
            .metadata
            .get("evaluation_score")
            .and_then(serde_json::Value::as_f64)
            .unwrap();
        assert!((score - 8.0).abs() < 1e-9);
        assert!((reply.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_prior_outputs_folded_into_prompt() {
        let agent =
            PersonaAgent::program_delivery(Arc::new(OfflineProvider::new("offline".to_string())));
        let mut context = TaskContext::new();
        context.push_output("The scope was agreed last week.".to_string());

        let prompt = agent.compose_prompt("Plan the rollout", &context);
        assert!(prompt.contains("Output from earlier steps:"));
        assert!(prompt.contains("- The scope was agreed last week."));
        assert!(prompt.trim_end().ends_with("Plan the rollout"));
    }
}
