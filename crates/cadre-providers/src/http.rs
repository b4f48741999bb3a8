//! HTTP provider implementation.
//!
//! This module implements the provider traits against OpenAI-compatible
//! endpoints (`/chat/completions` and `/embeddings`), which covers OpenAI
//! itself plus vLLM, LocalAI, LM Studio, and Ollama's compatibility layer.

use async_trait::async_trait;
use cadre_abstraction::{
    ChatMessage, CompletionParams, CompletionProvider, CompletionResponse, EmbeddingProvider,
    ProviderError, TokenUsage,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, error};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat-completion client for OpenAI-compatible endpoints.
#[derive(Debug, Clone)]
pub struct HttpProvider {
    /// The model ID (e.g., "gpt-4o-mini").
    model_id: String,
    /// The API key for authentication, if the endpoint requires one.
    api_key: Option<String>,
    /// The base URL for the API (e.g., "http://localhost:8000/v1").
    base_url: String,
    /// HTTP client for making requests.
    client: Client,
}

impl HttpProvider {
    /// Creates a new `HttpProvider` against the OpenAI API.
    ///
    /// # Arguments
    /// * `model_id` - The model ID to use (e.g., "gpt-4o-mini")
    ///
    /// # Errors
    /// Returns a `ProviderError` if the API key is not found in environment variables.
    #[allow(clippy::disallowed_methods)] // env::var is needed for API key loading
    pub fn new(model_id: String) -> Result<Self, ProviderError> {
        let api_key = env::var("OPENAI_API_KEY").map_err(|_| {
            ProviderError::UnsupportedProvider(
                "OPENAI_API_KEY environment variable not set".to_string(),
            )
        })?;

        Ok(Self {
            model_id,
            api_key: Some(api_key),
            base_url: OPENAI_BASE_URL.to_string(),
            client: Client::new(),
        })
    }

    /// Creates a new `HttpProvider` with an explicit API key.
    #[must_use]
    pub fn with_api_key(model_id: String, api_key: String) -> Self {
        Self {
            model_id,
            api_key: Some(api_key),
            base_url: OPENAI_BASE_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Creates a new `HttpProvider` against an unauthenticated compatible
    /// endpoint (e.g., a local vLLM server).
    #[must_use]
    pub fn without_auth(model_id: String, base_url: String) -> Self {
        Self { model_id, api_key: None, base_url, client: Client::new() }
    }

    /// Overrides the base URL (e.g., "http://localhost:11434/v1").
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[async_trait]
impl CompletionProvider for HttpProvider {
    async fn complete(
        &self,
        prompt: &str,
        params: Option<CompletionParams>,
    ) -> Result<CompletionResponse, ProviderError> {
        debug!(
            model_id = %self.model_id,
            prompt_len = prompt.len(),
            params = ?params,
            "HttpProvider generating completion"
        );

        // Chat-completion endpoints take a message list; a bare prompt is a
        // single user message.
        let messages = vec![ChatMessage::user(prompt)];
        self.complete_chat(&messages, params).await
    }

    async fn complete_chat(
        &self,
        messages: &[ChatMessage],
        params: Option<CompletionParams>,
    ) -> Result<CompletionResponse, ProviderError> {
        debug!(
            model_id = %self.model_id,
            message_count = messages.len(),
            params = ?params,
            "HttpProvider generating chat completion"
        );

        let url = format!("{}/chat/completions", self.base_url);

        let api_messages: Vec<ApiMessage> = messages
            .iter()
            .map(|msg| ApiMessage { role: msg.role.clone(), content: msg.content.clone() })
            .collect();

        let mut request_body = ChatCompletionRequest {
            model: self.model_id.clone(),
            messages: api_messages,
            temperature: None,
            top_p: None,
            max_tokens: None,
            stop: None,
        };

        if let Some(params) = params {
            request_body.temperature = params.temperature;
            request_body.top_p = params.top_p;
            request_body.max_tokens = params.max_tokens;
            request_body.stop = params.stop_sequences;
        }

        let mut request = self.client.post(&url).json(&request_body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, base_url = %self.base_url, "Failed to reach completion endpoint");
            if e.is_connect() {
                ProviderError::RequestError(format!(
                    "Completion endpoint not reachable at {}",
                    self.base_url
                ))
            } else {
                ProviderError::RequestError(format!("Network error: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(
                status = %status,
                error = %error_text,
                "Completion endpoint returned error status"
            );
            return Err(ProviderError::ResponseError(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse completion response");
            ProviderError::ParseError(format!("Failed to parse response: {}", e))
        })?;

        let content = completion
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| {
                error!("No content in completion response");
                ProviderError::ResponseError("No content in API response".to_string())
            })?;

        let usage = completion.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(CompletionResponse { content, model_id: Some(self.model_id.clone()), usage })
    }

    fn provider_id(&self) -> &str {
        &self.model_id
    }
}

/// Embedding client for OpenAI-compatible `/embeddings` endpoints.
#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    /// The embedding model ID (e.g., "text-embedding-3-small").
    model_id: String,
    /// The API key for authentication, if the endpoint requires one.
    api_key: Option<String>,
    /// The base URL for the API.
    base_url: String,
    /// Dimensionality of the vectors the model produces.
    dimension: usize,
    /// HTTP client for making requests.
    client: Client,
}

impl HttpEmbedder {
    /// Creates a new `HttpEmbedder` with an explicit API key.
    #[must_use]
    pub fn with_api_key(model_id: String, api_key: String, dimension: usize) -> Self {
        Self {
            model_id,
            api_key: Some(api_key),
            base_url: OPENAI_BASE_URL.to_string(),
            dimension,
            client: Client::new(),
        }
    }

    /// Creates a new `HttpEmbedder` against an unauthenticated compatible
    /// endpoint.
    #[must_use]
    pub fn without_auth(model_id: String, base_url: String, dimension: usize) -> Self {
        Self { model_id, api_key: None, base_url, dimension, client: Client::new() }
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        debug!(model_id = %self.model_id, text_len = text.len(), "HttpEmbedder embedding text");

        let url = format!("{}/embeddings", self.base_url);
        let request_body =
            EmbeddingRequest { model: self.model_id.clone(), input: text.to_string() };

        let mut request = self.client.post(&url).json(&request_body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, base_url = %self.base_url, "Failed to reach embedding endpoint");
            ProviderError::RequestError(format!("Network error: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(
                status = %status,
                error = %error_text,
                "Embedding endpoint returned error status"
            );
            return Err(ProviderError::ResponseError(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let embedding: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse embedding response");
            ProviderError::ParseError(format!("Failed to parse response: {}", e))
        })?;

        embedding
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| ProviderError::ResponseError("No embedding in API response".to_string()))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

// OpenAI-compatible request/response structures

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
#[allow(clippy::struct_field_names)] // Matches API naming
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    input: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_provider_with_api_key() {
        let provider = HttpProvider::with_api_key("gpt-4o-mini".to_string(), "key".to_string());
        assert_eq!(provider.provider_id(), "gpt-4o-mini");
    }

    #[test]
    fn test_http_provider_without_auth() {
        let provider = HttpProvider::without_auth(
            "qwen2.5".to_string(),
            "http://localhost:8000/v1".to_string(),
        );
        assert_eq!(provider.provider_id(), "qwen2.5");
        assert_eq!(provider.base_url, "http://localhost:8000/v1");
    }

    #[test]
    fn test_http_embedder_dimension() {
        let embedder = HttpEmbedder::without_auth(
            "text-embedding-3-small".to_string(),
            "http://localhost:8000/v1".to_string(),
            1536,
        );
        assert_eq!(embedder.dimension(), 1536);
    }
}
