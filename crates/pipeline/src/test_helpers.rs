//! Deterministic stand-ins for the embedding and generation collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use contextmill_core::error::{EmbeddingError, GenerationError};
use contextmill_core::{
    CompletionRequest, CompletionResponse, Embedder, Generator, Usage,
};

/// Embedder producing a fixed-dimension vector derived from the text.
///
/// Identical text always embeds to the identical vector, and similar
/// character distributions land near each other, which is enough for
/// ranking assertions.
pub struct StubEmbedder {
    dimension: usize,
}

impl StubEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimension];
        for (i, c) in text.chars().enumerate() {
            let bucket = (c as usize + i) % self.dimension;
            v[bucket] += 1.0;
        }
        v
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    fn name(&self) -> &str {
        "stub-embedder"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.vector_for(text))
    }
}

/// Embedder whose every call fails with an API error.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    fn name(&self) -> &str {
        "failing-embedder"
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::ApiError {
            status_code: 503,
            message: "embedding backend unavailable".into(),
        })
    }
}

/// Generator that replays a scripted sequence of responses and counts
/// calls, so tests can assert both the answer and whether generation ran
/// at all.
pub struct ScriptedGenerator {
    responses: Mutex<Vec<String>>,
    calls: AtomicUsize,
    /// The last request seen, for prompt-shape assertions.
    last_request: Mutex<Option<CompletionRequest>>,
}

impl ScriptedGenerator {
    pub fn new(responses: Vec<&str>) -> Self {
        let mut responses: Vec<String> = responses.into_iter().map(String::from).collect();
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted-generator"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request);
        let text = self
            .responses
            .lock()
            .unwrap()
            .pop()
            .expect("scripted generator exhausted");
        Ok(CompletionResponse {
            text,
            model: "scripted-model".into(),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
        })
    }
}
