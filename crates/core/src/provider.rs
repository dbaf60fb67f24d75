//! Collaborator traits — the abstractions over the hosted models.
//!
//! The pipeline never talks to a model API directly; it consumes two
//! narrow traits. `Embedder` turns text into a fixed-length vector and
//! `Generator` turns a (system prompt, user prompt) pair into text.
//!
//! Implementations: OpenAI-compatible HTTP endpoints, scripted stubs for
//! tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{EmbeddingError, GenerationError};

/// A completion request, already budget-fitted by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The system prompt (instructions, persona, rules).
    pub system_prompt: String,

    /// The user prompt (assembled context + question).
    pub user_prompt: String,

    /// Temperature (0.0 = deterministic, 1.0 = creative).
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.7
}

impl CompletionRequest {
    /// Build a request with the default temperature and no token cap.
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            temperature: default_temperature(),
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A complete response from the generation collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The generated text.
    pub text: String,

    /// Which model actually responded (may differ from requested).
    pub model: String,

    /// Token usage statistics, when the provider reports them.
    pub usage: Option<Usage>,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The embedding collaborator.
///
/// A failed call surfaces as `EmbeddingError`; the pipeline propagates it
/// as a retrieval failure rather than silently returning an empty context.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// A human-readable name for this embedder (e.g., "openai").
    fn name(&self) -> &str;

    /// Embed a single text into a fixed-length vector.
    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, EmbeddingError>;

    /// Embed a batch of texts, one vector per input, in input order.
    ///
    /// Default implementation calls `embed` per text; HTTP implementations
    /// should override with a single batched request.
    async fn embed_batch(
        &self,
        texts: &[String],
    ) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

/// The generation collaborator.
#[async_trait]
pub trait Generator: Send + Sync {
    /// A human-readable name for this generator (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a budget-fitted prompt pair and get the generated text back.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_request_defaults() {
        let req = CompletionRequest::new("You are helpful.", "Hello");
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
        assert!(req.max_tokens.is_none());
    }

    #[test]
    fn completion_request_builders() {
        let req = CompletionRequest::new("sys", "user")
            .with_temperature(0.2)
            .with_max_tokens(800);
        assert!((req.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(req.max_tokens, Some(800));
    }

    #[test]
    fn completion_request_serialization() {
        let req = CompletionRequest::new("sys", "user");
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("system_prompt"));
        // No max_tokens key when unset
        assert!(!json.contains("max_tokens"));
    }
}
