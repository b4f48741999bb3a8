//! Provider factory for creating provider instances from configuration.
//!
//! This module builds completion and embedding providers from a declarative
//! configuration, so deployments select the offline stub or a real endpoint
//! without conditional branches in business logic.

use crate::{HashEmbedder, HttpEmbedder, HttpProvider, OfflineProvider};
use cadre_abstraction::{CompletionProvider, EmbeddingProvider, ProviderError};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Provider kind enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Deterministic offline stub for testing and air-gapped runs.
    Offline,
    /// OpenAI API.
    OpenAi,
    /// Any OpenAI-compatible endpoint (vLLM, LocalAI, LM Studio, Ollama).
    Compatible,
}

impl FromStr for ProviderKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "offline" | "mock" => Ok(Self::Offline),
            "openai" => Ok(Self::OpenAi),
            "compatible" | "openai-compatible" | "local" => Ok(Self::Compatible),
            _ => Err(()),
        }
    }
}

/// Provider configuration.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// The kind of provider to create.
    pub kind: ProviderKind,
    /// The model ID (e.g., "gpt-4o-mini", "text-embedding-3-small").
    pub model_id: String,
    /// Optional API key (if not provided, will be loaded from environment).
    pub api_key: Option<String>,
    /// Optional base URL (required for Compatible providers).
    pub base_url: Option<String>,
}

impl ProviderConfig {
    /// Creates a new `ProviderConfig` with the given kind and model ID.
    #[must_use]
    pub fn new(kind: ProviderKind, model_id: String) -> Self {
        Self { kind, model_id, api_key: None, base_url: None }
    }

    /// Sets the API key for this configuration.
    #[must_use]
    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    /// Sets the base URL for this configuration (required for Compatible providers).
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }
}

/// Factory for creating provider instances.
pub struct ProviderFactory;

impl ProviderFactory {
    /// Creates a completion provider from the given configuration.
    ///
    /// # Errors
    /// Returns a `ProviderError` if creation fails (e.g., missing API key or
    /// base URL).
    pub fn create_completion(
        config: ProviderConfig,
    ) -> Result<Arc<dyn CompletionProvider>, ProviderError> {
        debug!(
            kind = ?config.kind,
            model_id = %config.model_id,
            "Creating completion provider"
        );

        match config.kind {
            ProviderKind::Offline => Ok(Arc::new(OfflineProvider::new(config.model_id))),
            ProviderKind::OpenAi => {
                let provider = if let Some(api_key) = config.api_key {
                    HttpProvider::with_api_key(config.model_id, api_key)
                } else {
                    HttpProvider::new(config.model_id)?
                };
                Ok(Arc::new(provider))
            }
            ProviderKind::Compatible => {
                let base_url = config.base_url.ok_or_else(|| {
                    ProviderError::UnsupportedProvider(
                        "base_url is required for Compatible providers. Use ProviderConfig::with_base_url() to set it.".to_string(),
                    )
                })?;

                let provider = if let Some(api_key) = config.api_key {
                    HttpProvider::with_api_key(config.model_id, api_key)
                        .with_base_url(base_url)
                } else {
                    HttpProvider::without_auth(config.model_id, base_url)
                };
                Ok(Arc::new(provider))
            }
        }
    }

    /// Creates an embedding provider from the given configuration.
    ///
    /// # Arguments
    /// * `config` - The provider configuration
    /// * `dimension` - Dimensionality of the vectors the provider produces
    ///
    /// # Errors
    /// Returns a `ProviderError` if creation fails.
    pub fn create_embedding(
        config: ProviderConfig,
        dimension: usize,
    ) -> Result<Arc<dyn EmbeddingProvider>, ProviderError> {
        debug!(
            kind = ?config.kind,
            model_id = %config.model_id,
            dimension,
            "Creating embedding provider"
        );

        match config.kind {
            ProviderKind::Offline => Ok(Arc::new(HashEmbedder::new(dimension))),
            ProviderKind::OpenAi => {
                let api_key = config.api_key.ok_or_else(|| {
                    ProviderError::UnsupportedProvider(
                        "api_key is required for OpenAI embeddings".to_string(),
                    )
                })?;
                Ok(Arc::new(HttpEmbedder::with_api_key(config.model_id, api_key, dimension)))
            }
            ProviderKind::Compatible => {
                let base_url = config.base_url.ok_or_else(|| {
                    ProviderError::UnsupportedProvider(
                        "base_url is required for Compatible providers".to_string(),
                    )
                })?;
                Ok(Arc::new(HttpEmbedder::without_auth(config.model_id, base_url, dimension)))
            }
        }
    }
}
