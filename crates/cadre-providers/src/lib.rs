//! Provider implementations for Cadre.
//!
//! This crate provides concrete implementations of the `CompletionProvider`
//! and `EmbeddingProvider` traits.
//!
//! # Supported Providers
//!
//! - **Offline**: Deterministic stub for testing and air-gapped runs
//! - **OpenAI**: OpenAI's chat completion API (API key required)
//! - **Compatible**: Any OpenAI-compatible endpoint (vLLM, LocalAI, Ollama)

pub mod embedding;
pub mod factory;
pub mod http;

use async_trait::async_trait;
use cadre_abstraction::{
    ChatMessage, CompletionParams, CompletionProvider, CompletionResponse, ProviderError,
    TokenUsage,
};
use tracing::debug;

pub use embedding::HashEmbedder;
pub use factory::{ProviderConfig, ProviderFactory, ProviderKind};
pub use http::{HttpEmbedder, HttpProvider};

/// A deterministic offline implementation of the `CompletionProvider` trait.
///
/// Produces the same output for the same input on every call, which keeps
/// workflows reproducible when no completion service is reachable.
#[derive(Debug, Default)]
pub struct OfflineProvider {
    id: String,
}

impl OfflineProvider {
    /// Creates a new `OfflineProvider` with the given ID.
    #[must_use]
    pub const fn new(id: String) -> Self {
        Self { id }
    }
}

#[async_trait]
impl CompletionProvider for OfflineProvider {
    async fn complete(
        &self,
        prompt: &str,
        params: Option<CompletionParams>,
    ) -> Result<CompletionResponse, ProviderError> {
        debug!(
            provider_id = %self.id,
            prompt_len = prompt.len(),
            params = ?params,
            "OfflineProvider generating completion"
        );

        let content = format!("Offline response for: {prompt}");

        let prompt_tokens = count_tokens(prompt);
        let completion_tokens = count_tokens(&content);
        let total_tokens = prompt_tokens + completion_tokens;

        Ok(CompletionResponse {
            content,
            model_id: Some(self.id.clone()),
            usage: Some(TokenUsage { prompt_tokens, completion_tokens, total_tokens }),
        })
    }

    async fn complete_chat(
        &self,
        messages: &[ChatMessage],
        params: Option<CompletionParams>,
    ) -> Result<CompletionResponse, ProviderError> {
        debug!(
            provider_id = %self.id,
            message_count = messages.len(),
            params = ?params,
            "OfflineProvider generating chat completion"
        );

        // The last user message is the effective prompt.
        let prompt = messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map_or("", |m| m.content.as_str());

        let content = format!("Offline response for: {prompt}");

        let prompt_tokens = messages.iter().map(|m| count_tokens(&m.content)).sum::<u32>();
        let completion_tokens = count_tokens(&content);
        let total_tokens = prompt_tokens + completion_tokens;

        Ok(CompletionResponse {
            content,
            model_id: Some(self.id.clone()),
            usage: Some(TokenUsage { prompt_tokens, completion_tokens, total_tokens }),
        })
    }

    fn provider_id(&self) -> &str {
        &self.id
    }
}

/// Count tokens in a string (simplified: word count).
///
/// For a real implementation, this would use a proper tokenizer.
#[allow(clippy::cast_possible_truncation)]
fn count_tokens(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_provider_is_deterministic() {
        let provider = OfflineProvider::new("offline".to_string());
        let first = provider.complete("plan the rollout", None).await.unwrap();
        let second = provider.complete("plan the rollout", None).await.unwrap();
        assert_eq!(first.content, second.content);
        assert!(first.content.contains("plan the rollout"));
    }

    #[tokio::test]
    async fn test_offline_provider_chat_uses_last_user_message() {
        let provider = OfflineProvider::new("offline".to_string());
        let messages = vec![
            ChatMessage::system("You are a planner."),
            ChatMessage::user("first question"),
            ChatMessage::user("second question"),
        ];
        let response = provider.complete_chat(&messages, None).await.unwrap();
        assert!(response.content.contains("second question"));
    }

    #[tokio::test]
    async fn test_offline_provider_reports_usage() {
        let provider = OfflineProvider::new("offline".to_string());
        let response = provider.complete("one two three", None).await.unwrap();
        let usage = response.usage.unwrap();
        assert_eq!(usage.prompt_tokens, 3);
        assert_eq!(usage.total_tokens, usage.prompt_tokens + usage.completion_tokens);
    }
}
