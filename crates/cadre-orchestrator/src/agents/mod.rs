//! Executable agents and the uniform invocation contract.
//!
//! Every task handler implements [`Agent`]: an id, a description, and an
//! async `invoke(query, context)` returning an [`AgentReply`]. The
//! orchestrator dispatches through this trait only and never depends on
//! concrete agent types.

pub mod persona;

pub use persona::PersonaAgent;

use crate::error::{OrchestrationError, Result};
use async_trait::async_trait;
use cadre_abstraction::ProviderError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Per-workflow state handed to every agent call.
///
/// Carries the request's context fields plus the outputs of earlier steps,
/// in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskContext {
    fields: BTreeMap<String, String>,
    prior_outputs: Vec<String>,
}

impl TaskContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context seeded with request fields.
    #[must_use]
    pub fn from_fields(fields: BTreeMap<String, String>) -> Self {
        Self { fields, prior_outputs: Vec::new() }
    }

    /// Looks up a context field.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// All context fields.
    #[must_use]
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Appends a completed step's output.
    pub fn push_output(&mut self, output: String) {
        self.prior_outputs.push(output);
    }

    /// Outputs of earlier steps, oldest first.
    #[must_use]
    pub fn prior_outputs(&self) -> &[String] {
        &self.prior_outputs
    }
}

/// What an agent invocation returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentReply {
    /// The produced output.
    pub output: String,
    /// Self-reported confidence in [0, 1].
    pub confidence: f64,
    /// Free-form extras, such as chained evaluation scores.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl AgentReply {
    /// Creates a reply with no metadata.
    #[must_use]
    pub fn new(output: impl Into<String>, confidence: f64) -> Self {
        Self { output: output.into(), confidence, metadata: BTreeMap::new() }
    }

    /// Attaches a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// A named, independently invokable task handler.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Stable identifier, matched against routing decisions.
    fn id(&self) -> &str;

    /// Short description of what this agent handles.
    fn description(&self) -> &str;

    /// Handles a query with the given workflow context.
    ///
    /// # Errors
    /// Returns a `ProviderError` when the underlying call fails; the
    /// orchestrator converts this into a failed step.
    async fn invoke(
        &self,
        query: &str,
        context: &TaskContext,
    ) -> std::result::Result<AgentReply, ProviderError>;
}

/// Ordered collection of executable agents, keyed by id.
///
/// Registration happens before any workflow runs; lookups after that are
/// read-only, so no locking is involved.
#[derive(Default)]
pub struct AgentRegistry {
    agents: Vec<Arc<dyn Agent>>,
}

impl AgentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an agent.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` for a blank id and
    /// `DuplicateRegistration` when the id is already taken.
    pub fn register(&mut self, agent: Arc<dyn Agent>) -> Result<()> {
        let id = agent.id().to_string();
        if id.trim().is_empty() {
            return Err(OrchestrationError::InvalidConfiguration(
                "agent id must not be empty".to_string(),
            ));
        }
        if self.get(&id).is_some() {
            return Err(OrchestrationError::DuplicateRegistration(id));
        }
        debug!(agent_id = %id, "Registered agent");
        self.agents.push(agent);
        Ok(())
    }

    /// Looks up an agent by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Agent>> {
        self.agents.iter().find(|agent| agent.id() == id)
    }

    /// Registered ids in registration order.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.agents.iter().map(|agent| agent.id()).collect()
    }

    /// Iterates agents in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Agent>> {
        self.agents.iter()
    }

    /// Number of registered agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

/// Trivial agent that echoes its query back. Useful in tests and wiring
/// checks.
pub struct EchoAgent {
    id: String,
}

impl EchoAgent {
    /// Creates an echo agent with the id `echo`.
    #[must_use]
    pub fn new() -> Self {
        Self { id: "echo".to_string() }
    }

    /// Creates an echo agent with a custom id.
    #[must_use]
    pub fn named(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Default for EchoAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for EchoAgent {
    fn id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        "Echoes the query back unchanged"
    }

    async fn invoke(
        &self,
        query: &str,
        _context: &TaskContext,
    ) -> std::result::Result<AgentReply, ProviderError> {
        Ok(AgentReply::new(format!("Echo: {query}"), 1.0))
    }
}
