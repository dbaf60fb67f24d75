//! RAG orchestration over the assembler and the generation collaborator.
//!
//! The engine owns the prompt shapes. Retrieval answers get the matched
//! chunks laid out as numbered, source-attributed documents above the
//! question; bundle analysis sends the assembler's budgeted prompt
//! through as-is; transforms are single-text rewrites driven by a
//! [`PromptAction`].
//!
//! Whenever assembly reports `InsufficientContext`, the engine returns
//! the corresponding sentinel without calling the generator.

use std::sync::Arc;

use contextmill_config::AppConfig;
use contextmill_core::error::Result;
use contextmill_core::{CompletionRequest, CompletionResponse, Generator, PromptAction, SourceBundle};
use serde::Serialize;
use tracing::{debug, info};

use crate::assembler::{
    BundleOutcome, BundleSourceStats, Citation, ContextAssembler, RetrievalOutcome,
};

const RAG_SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions \
using only the provided context. If the context does not contain the answer, say so \
clearly instead of guessing. Cite the source document for every claim.";

const ANALYSIS_SYSTEM_PROMPT: &str = "Follow the instruction at the top of the user \
message. Base your analysis only on the sources supplied below it.";

/// A grounded answer with the chunks that informed it.
#[derive(Debug, Clone, Serialize)]
pub struct RagAnswer {
    pub answer: String,
    /// The retrieved chunks behind the answer, best match first.
    pub citations: Vec<Citation>,
    /// Model that produced the answer.
    pub model: String,
}

/// Outcome of a question. The sentinel means the knowledge base had
/// nothing to offer and no completion was requested.
#[derive(Debug, Clone, Serialize)]
pub enum RagOutcome {
    InsufficientContext,
    Answer(RagAnswer),
}

/// A completed bundle analysis.
#[derive(Debug, Clone, Serialize)]
pub struct BundleAnalysis {
    pub answer: String,
    pub model: String,
    /// Per-source budget accounting from assembly.
    pub sources: Vec<BundleSourceStats>,
}

/// Outcome of a bundle analysis.
#[derive(Debug, Clone, Serialize)]
pub enum AnalysisOutcome {
    InsufficientContext,
    Analysis(BundleAnalysis),
}

/// Ties retrieval, budgeting, and generation into the question-answering
/// flows.
pub struct RagEngine {
    assembler: ContextAssembler,
    generator: Arc<dyn Generator>,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl RagEngine {
    pub fn new(assembler: ContextAssembler, generator: Arc<dyn Generator>) -> Self {
        Self {
            assembler,
            generator,
            temperature: 0.7,
            max_tokens: None,
        }
    }

    /// Build an engine with the configured sampling temperature and
    /// completion token cap applied to every request.
    pub fn from_config(
        assembler: ContextAssembler,
        generator: Arc<dyn Generator>,
        config: &AppConfig,
    ) -> Self {
        Self::new(assembler, generator)
            .with_temperature(config.provider.temperature)
            .with_max_tokens(config.budget.completion_max_tokens)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Answer a question from the indexed knowledge base.
    pub async fn ask(&self, question: &str) -> Result<RagOutcome> {
        let retrieved = match self.assembler.retrieve(question).await? {
            RetrievalOutcome::InsufficientContext => {
                info!("no retrievable context, skipping generation");
                return Ok(RagOutcome::InsufficientContext);
            }
            RetrievalOutcome::Context(ctx) => ctx,
        };

        let context = retrieved
            .citations
            .iter()
            .enumerate()
            .map(|(i, c)| format!("Document {} (Source: {}):\n{}", i + 1, c.source, c.content))
            .collect::<Vec<_>>()
            .join("\n\n");
        let user_prompt = format!("Context:\n{context}\n\nQuestion: {question}");

        let response = self
            .complete(CompletionRequest::new(RAG_SYSTEM_PROMPT, user_prompt))
            .await?;

        info!(
            citations = retrieved.citations.len(),
            model = %response.model,
            "question answered"
        );
        Ok(RagOutcome::Answer(RagAnswer {
            answer: response.text,
            citations: retrieved.citations,
            model: response.model,
        }))
    }

    /// Analyze a multi-source bundle under the configured token ceiling.
    pub async fn analyze(
        &self,
        bundle: &SourceBundle,
        instruction: Option<&str>,
    ) -> Result<AnalysisOutcome> {
        let assembled = match self.assembler.assemble_bundle(bundle, instruction) {
            BundleOutcome::InsufficientContext => {
                info!("no usable bundle sources, skipping generation");
                return Ok(AnalysisOutcome::InsufficientContext);
            }
            BundleOutcome::Context(ctx) => ctx,
        };

        let response = self
            .complete(CompletionRequest::new(
                ANALYSIS_SYSTEM_PROMPT,
                assembled.prompt,
            ))
            .await?;

        info!(
            sources = assembled.sources.len(),
            model = %response.model,
            "bundle analyzed"
        );
        Ok(AnalysisOutcome::Analysis(BundleAnalysis {
            answer: response.text,
            model: response.model,
            sources: assembled.sources,
        }))
    }

    /// Rewrite `input` according to a fixed prompt action.
    ///
    /// Transforms bypass retrieval entirely; the action supplies the
    /// system prompt and its own temperature.
    pub async fn transform(&self, action: PromptAction, input: &str) -> Result<CompletionResponse> {
        debug!(action = %action, "running transform");
        let request = CompletionRequest::new(action.system_prompt(), input)
            .with_temperature(action.temperature());
        let request = match self.max_tokens {
            Some(cap) => request.with_max_tokens(cap),
            None => request,
        };
        let response = self.generator.complete(request).await?;
        Ok(response)
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let request = request.with_temperature(self.temperature);
        let request = match self.max_tokens {
            Some(cap) => request.with_max_tokens(cap),
            None => request,
        };
        Ok(self.generator.complete(request).await?)
    }
}
