//! Sequential workflow orchestration.
//!
//! `WorkflowOrchestrator` turns a request into a `WorkflowResult`: it
//! analyzes the text, routes it to a primary agent, derives a step pipeline
//! (single-agent, comprehensive multi-agent, or extracted from a planning
//! artifact), executes the steps strictly in order, and aggregates step
//! confidences into an overall status. Step failures become data on the
//! result; the only hard error a caller can see is serialization.

pub mod steps;

pub use steps::{MAX_EXTRACTED_STEPS, StepDescriptor, extract_steps};

use crate::agents::{Agent, AgentRegistry, AgentReply, TaskContext};
use crate::analysis::{TaskAnalysis, TaskAnalyzer};
use crate::error::{OrchestrationError, Result};
use crate::evaluation::{EvaluationLoop, EvaluationResult};
use crate::routing::{RoutingDecision, RoutingEngine};
use cadre_abstraction::ProviderError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

/// An inbound unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// The request text.
    pub text: String,
    /// Caller-supplied context fields, folded into analysis and agent calls.
    pub context: BTreeMap<String, String>,
    /// When the request was created.
    pub created_at: DateTime<Utc>,
}

impl Request {
    /// Creates a request with no context fields.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), context: BTreeMap::new(), created_at: Utc::now() }
    }

    /// Adds a context field.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Terminal status of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    /// Every step succeeded.
    Completed,
    /// Some steps succeeded, some failed.
    Partial,
    /// No step succeeded (including the zero-step case).
    Failed,
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowStatus::Completed => write!(f, "completed"),
            WorkflowStatus::Partial => write!(f, "partial"),
            WorkflowStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One executed step, recorded exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    /// Step name from the descriptor.
    pub name: String,
    /// Agent that handled the step.
    pub agent: String,
    /// Input payload the agent received.
    pub input: String,
    /// Agent output; `None` when the step failed.
    pub output: Option<String>,
    /// Whether the agent call succeeded.
    pub success: bool,
    /// Step confidence in [0, 1]; 0 for failed steps.
    pub confidence: f64,
    /// Wall-clock duration of the step in milliseconds.
    pub duration_ms: u64,
    /// When the step started.
    pub timestamp: DateTime<Utc>,
}

/// Final record of a workflow run. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowResult {
    /// Unique id for this run.
    pub workflow_id: String,
    /// When the run finished.
    pub timestamp: DateTime<Utc>,
    /// Terminal status.
    pub status: WorkflowStatus,
    /// Mean of step confidences; failed steps count as 0.
    pub overall_confidence: f64,
    /// The routing decision the run was built on.
    pub routing_decision: RoutingDecision,
    /// Executed steps in execution order.
    pub steps: Vec<WorkflowStep>,
    /// Evaluation of the final output, when an evaluator is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<EvaluationResult>,
}

impl WorkflowResult {
    /// Serializes the result to pretty JSON.
    ///
    /// # Errors
    /// Returns `OrchestrationError::Json` when serialization fails; this is
    /// the only fatal error of a workflow run.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a result previously produced by [`Self::to_json`].
    ///
    /// # Errors
    /// Returns `OrchestrationError::Json` when the input is not a valid
    /// serialized result.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Output of the last successful step, if any.
    #[must_use]
    pub fn final_output(&self) -> Option<&str> {
        last_successful_output(&self.steps)
    }
}

/// Runs requests through analysis, routing, and sequential step execution.
pub struct WorkflowOrchestrator {
    analyzer: TaskAnalyzer,
    routing: RoutingEngine,
    agents: AgentRegistry,
    evaluator: Option<EvaluationLoop>,
    step_timeout: Option<Duration>,
    continue_on_failure: bool,
}

impl WorkflowOrchestrator {
    /// Creates an orchestrator over a routing engine and an agent registry.
    ///
    /// Step failures do not halt execution unless a step is marked required
    /// or [`Self::with_continue_on_failure`] turns the policy off.
    #[must_use]
    pub fn new(routing: RoutingEngine, agents: AgentRegistry) -> Self {
        Self {
            analyzer: TaskAnalyzer::new(),
            routing,
            agents,
            evaluator: None,
            step_timeout: None,
            continue_on_failure: true,
        }
    }

    /// Evaluates the final output of each run with the given loop.
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: EvaluationLoop) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Bounds each agent call; expiry counts as a failed step.
    #[must_use]
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = Some(timeout);
        self
    }

    /// Sets whether execution continues past an optional step's failure.
    #[must_use]
    pub fn with_continue_on_failure(mut self, continue_on_failure: bool) -> Self {
        self.continue_on_failure = continue_on_failure;
        self
    }

    /// The executable agents this orchestrator dispatches to.
    #[must_use]
    pub fn agents(&self) -> &AgentRegistry {
        &self.agents
    }

    /// Runs a request through the routed pipeline.
    ///
    /// The pipeline is a single step to the primary agent, widened to the
    /// comprehensive multi-agent pipeline (primary plus ranked alternatives)
    /// when the analysis demands multiple agents, the primary's confidence
    /// falls below its profile threshold, or the profile does not support
    /// the assessed complexity.
    pub async fn run(&self, request: &Request) -> WorkflowResult {
        let analysis = self.analyze(request);
        let decision = self.routing.route(&request.text, &analysis).await;
        let pipeline = self.select_pipeline(request, &analysis, &decision);
        self.finish(request, decision, &pipeline).await
    }

    /// Runs a request through a caller-declared pipeline.
    ///
    /// Analysis and routing still run so the result records a decision, but
    /// the declared steps execute as given.
    pub async fn run_pipeline(
        &self,
        request: &Request,
        pipeline: &[StepDescriptor],
    ) -> WorkflowResult {
        let analysis = self.analyze(request);
        let decision = self.routing.route(&request.text, &analysis).await;
        self.finish(request, decision, pipeline).await
    }

    /// Runs a request by asking a planner agent for steps first.
    ///
    /// The planner invocation is recorded as the first step and is required;
    /// its output is mined for steps, each routed at execution time. A plan
    /// with no extractable steps falls back to a single catch-all step
    /// wrapping the request.
    pub async fn run_planned(&self, request: &Request, planner_id: &str) -> WorkflowResult {
        let analysis = self.analyze(request);
        let decision = self.routing.route(&request.text, &analysis).await;

        let mut context = TaskContext::from_fields(request.context.clone());
        let mut executed = Vec::new();

        let plan =
            StepDescriptor::assigned("plan", planner_id, request.text.clone()).with_required(true);
        self.execute_into(std::slice::from_ref(&plan), &mut context, &mut executed).await;

        if executed.first().is_some_and(|step| step.success) {
            let planned = executed[0].output.as_deref().map(extract_steps).unwrap_or_default();
            let pipeline = if planned.is_empty() {
                vec![StepDescriptor::new("execute", request.text.clone())]
            } else {
                planned
            };
            self.execute_into(&pipeline, &mut context, &mut executed).await;
        }

        let evaluation = self.evaluate_final(&executed).await;
        self.assemble(decision, executed, evaluation)
    }

    async fn finish(
        &self,
        request: &Request,
        decision: RoutingDecision,
        pipeline: &[StepDescriptor],
    ) -> WorkflowResult {
        let mut context = TaskContext::from_fields(request.context.clone());
        let mut executed = Vec::with_capacity(pipeline.len());
        self.execute_into(pipeline, &mut context, &mut executed).await;
        let evaluation = self.evaluate_final(&executed).await;
        self.assemble(decision, executed, evaluation)
    }

    fn analyze(&self, request: &Request) -> TaskAnalysis {
        let context = if request.context.is_empty() {
            None
        } else {
            Some(request.context.values().cloned().collect::<Vec<_>>().join(" "))
        };
        self.analyzer.analyze(&request.text, context.as_deref())
    }

    fn select_pipeline(
        &self,
        request: &Request,
        analysis: &TaskAnalysis,
        decision: &RoutingDecision,
    ) -> Vec<StepDescriptor> {
        let profile = self.routing.registry().get(&decision.primary_agent);
        let below_threshold =
            profile.is_some_and(|p| decision.confidence < p.confidence_threshold);
        let unsupported = profile.is_some_and(|p| !p.supports(analysis.complexity));
        let comprehensive = (analysis.multi_agent_required || below_threshold || unsupported)
            && !decision.alternatives.is_empty();

        if comprehensive {
            let mut pipeline = Vec::with_capacity(1 + decision.alternatives.len());
            pipeline.push(StepDescriptor::assigned(
                decision.primary_agent.clone(),
                decision.primary_agent.clone(),
                request.text.clone(),
            ));
            for candidate in &decision.alternatives {
                pipeline.push(StepDescriptor::assigned(
                    candidate.agent_id.clone(),
                    candidate.agent_id.clone(),
                    request.text.clone(),
                ));
            }
            info!(steps = pipeline.len(), "Selected comprehensive multi-agent pipeline");
            pipeline
        } else {
            vec![StepDescriptor::assigned(
                decision.primary_agent.clone(),
                decision.primary_agent.clone(),
                request.text.clone(),
            )]
        }
    }

    // Steps run strictly in order; successful outputs are threaded to later
    // steps through the context.
    async fn execute_into(
        &self,
        pipeline: &[StepDescriptor],
        context: &mut TaskContext,
        executed: &mut Vec<WorkflowStep>,
    ) {
        for descriptor in pipeline {
            let step = self.execute_step(descriptor, context).await;
            if let Some(output) = step.output.as_ref().filter(|_| step.success) {
                context.push_output(output.clone());
            }
            let halt = !step.success && (descriptor.required || !self.continue_on_failure);
            if halt {
                warn!(step = %step.name, "Halting workflow after failed step");
            }
            executed.push(step);
            if halt {
                break;
            }
        }
    }

    async fn execute_step(
        &self,
        descriptor: &StepDescriptor,
        context: &TaskContext,
    ) -> WorkflowStep {
        let timestamp = Utc::now();
        let started = Instant::now();
        let agent_id = self.resolve_agent(descriptor).await;

        let outcome = match self.agents.get(&agent_id) {
            Some(agent) => self
                .invoke_with_timeout(agent, &descriptor.input, context)
                .await
                .map_err(OrchestrationError::from),
            None => Err(OrchestrationError::AgentNotFound(agent_id.clone())),
        };
        let duration_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(reply) => WorkflowStep {
                name: descriptor.name.clone(),
                agent: agent_id,
                input: descriptor.input.clone(),
                output: Some(reply.output),
                success: true,
                confidence: reply.confidence.clamp(0.0, 1.0),
                duration_ms,
                timestamp,
            },
            Err(error) => {
                warn!(step = %descriptor.name, agent = %agent_id, %error, "Workflow step failed");
                WorkflowStep {
                    name: descriptor.name.clone(),
                    agent: agent_id,
                    input: descriptor.input.clone(),
                    output: None,
                    success: false,
                    confidence: 0.0,
                    duration_ms,
                    timestamp,
                }
            }
        }
    }

    async fn resolve_agent(&self, descriptor: &StepDescriptor) -> String {
        match &descriptor.agent_id {
            Some(agent_id) => agent_id.clone(),
            None => {
                let analysis = self.analyzer.analyze(&descriptor.input, None);
                self.routing.route(&descriptor.input, &analysis).await.primary_agent
            }
        }
    }

    async fn invoke_with_timeout(
        &self,
        agent: &Arc<dyn Agent>,
        input: &str,
        context: &TaskContext,
    ) -> std::result::Result<AgentReply, ProviderError> {
        let call = agent.invoke(input, context);
        match self.step_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(limit.as_millis() as u64)),
            },
            None => call.await,
        }
    }

    async fn evaluate_final(&self, executed: &[WorkflowStep]) -> Option<EvaluationResult> {
        let evaluator = self.evaluator.as_ref()?;
        let output = last_successful_output(executed)?;
        Some(evaluator.run(output).await)
    }

    fn assemble(
        &self,
        decision: RoutingDecision,
        executed: Vec<WorkflowStep>,
        evaluation: Option<EvaluationResult>,
    ) -> WorkflowResult {
        let (status, overall_confidence) = aggregate(&executed);
        let result = WorkflowResult {
            workflow_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            status,
            overall_confidence,
            routing_decision: decision,
            steps: executed,
            evaluation,
        };
        info!(
            workflow_id = %result.workflow_id,
            status = %result.status,
            overall_confidence = result.overall_confidence,
            steps = result.steps.len(),
            "Workflow finished"
        );
        result
    }
}

/// Mean of step confidences with failed steps counting 0; zero successful
/// steps (including an empty list) is a failed run with confidence 0.
fn aggregate(executed: &[WorkflowStep]) -> (WorkflowStatus, f64) {
    if executed.is_empty() {
        return (WorkflowStatus::Failed, 0.0);
    }
    let succeeded = executed.iter().filter(|step| step.success).count();
    if succeeded == 0 {
        return (WorkflowStatus::Failed, 0.0);
    }
    let overall =
        executed.iter().map(|step| step.confidence).sum::<f64>() / executed.len() as f64;
    let status = if succeeded == executed.len() {
        WorkflowStatus::Completed
    } else {
        WorkflowStatus::Partial
    };
    (status, overall)
}

fn last_successful_output(executed: &[WorkflowStep]) -> Option<&str> {
    executed.iter().rev().find(|step| step.success).and_then(|step| step.output.as_deref())
}
