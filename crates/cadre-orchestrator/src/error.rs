// Error types for orchestration

use thiserror::Error;

/// Result type for orchestration operations
pub type Result<T> = std::result::Result<T, OrchestrationError>;

/// Orchestration errors
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// Agent not present in the executable registry
    #[error("Agent '{0}' is not registered")]
    AgentNotFound(String),

    /// Duplicate capability or agent registration
    #[error("Duplicate registration for '{0}'")]
    DuplicateRegistration(String),

    /// Invalid engine or registry configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Provider error
    #[error("Provider error: {0}")]
    Provider(#[from] cadre_abstraction::ProviderError),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
