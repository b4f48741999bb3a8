//! Provider abstraction layer for Cadre.
//!
//! This module defines the core traits and types for calling text-completion
//! and embedding services.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Represents an error that can occur when calling a completion or embedding provider.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderError {
    /// An error occurred during the API request (e.g., network issues, invalid request).
    #[error("Request Error: {0}")]
    RequestError(String),

    /// The provider returned an error (e.g., invalid input, rate limiting).
    #[error("Provider Response Error: {0}")]
    ResponseError(String),

    /// The call did not complete within the configured deadline.
    #[error("Timeout after {0} ms")]
    Timeout(u64),

    /// The provider's output could not be parsed into the expected shape.
    #[error("Parse Error: {0}")]
    ParseError(String),

    /// The provider is not supported or is misconfigured.
    #[error("Unsupported Provider: {0}")]
    UnsupportedProvider(String),

    /// Other unexpected errors.
    #[error("Other Provider Error: {0}")]
    Other(String),
}

/// Represents a message in a conversation with a chat-completion provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message sender (e.g., "user", "assistant", "system").
    pub role: String,
    /// The content of the message.
    pub content: String,
}

impl ChatMessage {
    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

/// Parameters for controlling completion output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionParams {
    /// What sampling temperature to use, between 0 and 2.
    /// Higher values mean the provider will take more risks.
    pub temperature: Option<f32>,

    /// Nucleus sampling: the provider considers the tokens with `top_p`
    /// probability mass.
    pub top_p: Option<f32>,

    /// The maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sequences where the provider will stop generating further tokens.
    pub stop_sequences: Option<Vec<String>>,
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self {
            temperature: Some(0.7),
            top_p: Some(1.0),
            max_tokens: Some(512),
            stop_sequences: None,
        }
    }
}

/// The response from a completion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The generated content.
    pub content: String,

    /// Optional: The ID of the model that produced the response.
    pub model_id: Option<String>,

    /// Optional: Usage statistics for the request.
    pub usage: Option<TokenUsage>,
}

/// Usage statistics for a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt.
    pub prompt_tokens: u32,

    /// Number of tokens in the completion.
    pub completion_tokens: u32,

    /// Total number of tokens used.
    pub total_tokens: u32,
}

/// A trait for calling text-completion services.
///
/// All providers must be `Send + Sync` to allow concurrent use across threads.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generates a completion for the given prompt.
    ///
    /// # Arguments
    /// * `prompt` - The input prompt
    /// * `params` - Optional parameters to control generation
    ///
    /// # Errors
    /// Returns a `ProviderError` if the call fails.
    async fn complete(
        &self,
        prompt: &str,
        params: Option<CompletionParams>,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Generates a chat completion for the given conversation history.
    ///
    /// # Arguments
    /// * `messages` - The conversation history as a slice of chat messages
    /// * `params` - Optional parameters to control generation
    ///
    /// # Errors
    /// Returns a `ProviderError` if the call fails.
    async fn complete_chat(
        &self,
        messages: &[ChatMessage],
        params: Option<CompletionParams>,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Returns the ID of the provider.
    fn provider_id(&self) -> &str;
}

/// A trait for calling text-embedding services.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds the given text into a fixed-dimension vector.
    ///
    /// # Errors
    /// Returns a `ProviderError` if the call fails.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;

    /// Returns the dimensionality of vectors produced by this provider.
    fn dimension(&self) -> usize;
}
