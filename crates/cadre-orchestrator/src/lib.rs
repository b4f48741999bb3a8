//! Task orchestration engine for Cadre.
//!
//! This crate turns free-form request text into an executed workflow. The
//! [`TaskAnalyzer`] classifies the request, the [`RoutingEngine`] matches it
//! against registered capability profiles, and the [`WorkflowOrchestrator`]
//! dispatches the resulting step pipeline to an [`AgentRegistry`]. An
//! optional [`EvaluationLoop`] scores the final output and feeds correction
//! directives back into the artifact until it clears a quality threshold or
//! runs out of iterations.
//!
//! Failures from agents and providers are absorbed where they occur: a
//! failed step is recorded rather than raised, routing that matches nothing
//! falls back to a configured agent, and an evaluator that cannot parse its
//! own scoring response substitutes neutral scores. The only fatal errors
//! surface when serializing results.

pub mod agents;
pub mod analysis;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod registry;
pub mod routing;
pub mod workflow;

pub use agents::{Agent, AgentRegistry, AgentReply, EchoAgent, PersonaAgent, TaskContext};
pub use analysis::{Complexity, Scope, TaskAnalysis, TaskAnalyzer, Urgency};
pub use config::{ConfigError, EngineConfig, EngineConfigLoader, EngineSettings, ProfileConfig};
pub use evaluation::{
    CorrectionRecord, Criterion, EvaluationCriteria, EvaluationLoop, EvaluationResult,
};
pub use registry::{CapabilityProfile, CapabilityRegistry};
pub use routing::{MatchStrategy, RankedCandidate, RoutingDecision, RoutingEngine};
pub use workflow::{
    Request, StepDescriptor, WorkflowOrchestrator, WorkflowResult, WorkflowStatus, WorkflowStep,
    extract_steps,
};

// Re-export the orchestration error separately so the crate-level Result
// alias is this one and not the config loader's.
pub use error::{OrchestrationError, Result};
