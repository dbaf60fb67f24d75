//! Context assembly: retrieval mode and bundle mode.
//!
//! Retrieval mode answers "what do we know about X": embed the query,
//! rank the store, join the best chunks into one context block with
//! citations. Bundle mode answers "analyze these specific documents
//! together": budget a caller-supplied set of named sources and lay them
//! out under headings behind an instruction preamble.
//!
//! Both modes report an empty knowledge base or an all-blank bundle as an
//! explicit `InsufficientContext` outcome. That is a normal state the
//! caller must branch on, not an error, and generation must not be
//! invoked for it.

use std::sync::Arc;

use contextmill_config::AppConfig;
use contextmill_core::error::Result;
use contextmill_core::{Embedder, SourceBundle};
use contextmill_index::{rank, DocumentStore};
use serde::Serialize;
use tracing::{debug, info};

use crate::budget::{estimate, fit_many};

/// Default instruction preamble for bundle analysis. A caller-supplied
/// instruction is appended after this one, never in place of it.
const BUNDLE_INSTRUCTION: &str = "You are a compliance remediation assistant. \
Analyze the remediation plan against the compliance requirements and the \
audit findings provided below. Ground every statement in the supplied \
sources and reference the relevant section by name.";

/// Tuning knobs for the assembler, taken from [`AppConfig`] in production.
#[derive(Debug, Clone)]
pub struct AssemblerOptions {
    /// Maximum chunks per retrieval.
    pub top_k: usize,
    /// Minimum cosine score for a chunk to contribute.
    pub min_score: f32,
    /// Aggregate token ceiling for bundle mode.
    pub bundle_max_tokens: usize,
}

impl Default for AssemblerOptions {
    fn default() -> Self {
        Self {
            top_k: 3,
            min_score: -1.0,
            bundle_max_tokens: 6000,
        }
    }
}

impl AssemblerOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            top_k: config.retrieval.top_k,
            min_score: config.retrieval.min_score,
            bundle_max_tokens: config.budget.bundle_max_tokens,
        }
    }
}

/// One contributing chunk, in rank order.
#[derive(Debug, Clone, Serialize)]
pub struct Citation {
    /// Source label of the owning document.
    pub source: String,
    /// The chunk text as it appears in the context.
    pub content: String,
    /// Cosine similarity to the query.
    pub score: f32,
}

/// Assembled retrieval context.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedContext {
    /// Matched chunk texts joined with blank lines, best match first.
    pub context: String,
    /// Exactly the chunks that contributed to `context`, same order.
    pub citations: Vec<Citation>,
}

/// Outcome of a retrieval. `InsufficientContext` is a normal state.
#[derive(Debug, Clone, Serialize)]
pub enum RetrievalOutcome {
    /// The store is empty, or nothing scored above the floor.
    InsufficientContext,
    Context(RetrievedContext),
}

/// Per-source accounting from bundle assembly.
#[derive(Debug, Clone, Serialize)]
pub struct BundleSourceStats {
    pub name: String,
    pub tokens_before: usize,
    pub tokens_after: usize,
    pub truncated: bool,
}

/// Assembled bundle prompt.
#[derive(Debug, Clone, Serialize)]
pub struct BundleContext {
    /// Instruction preamble followed by one `## name` section per source,
    /// in lexicographic source-name order.
    pub prompt: String,
    /// Budget accounting, same order as the sections.
    pub sources: Vec<BundleSourceStats>,
}

/// Outcome of bundle assembly.
#[derive(Debug, Clone, Serialize)]
pub enum BundleOutcome {
    /// Every supplied source was empty or whitespace-only.
    InsufficientContext,
    Context(BundleContext),
}

/// Builds bounded prompt context from the store or from ad-hoc bundles.
pub struct ContextAssembler {
    embedder: Arc<dyn Embedder>,
    store: DocumentStore,
    options: AssemblerOptions,
}

impl ContextAssembler {
    pub fn new(embedder: Arc<dyn Embedder>, store: DocumentStore, options: AssemblerOptions) -> Self {
        Self {
            embedder,
            store,
            options,
        }
    }

    pub fn options(&self) -> &AssemblerOptions {
        &self.options
    }

    /// Retrieve the best-matching chunks for `query` and assemble them.
    ///
    /// The empty-store check runs before the embedding call, so an idle
    /// knowledge base never spends a provider request. An embedding
    /// failure propagates as an error; it is never converted into an
    /// empty context.
    pub async fn retrieve(&self, query: &str) -> Result<RetrievalOutcome> {
        let snapshot = self.store.snapshot().await;
        if snapshot.is_empty() {
            info!("retrieval against empty store");
            return Ok(RetrievalOutcome::InsufficientContext);
        }

        let query_embedding = self.embedder.embed(query).await?;
        let ranked = rank(&query_embedding, &snapshot.entries, self.options.top_k)?;

        let citations: Vec<Citation> = ranked
            .into_iter()
            .filter(|r| r.score >= self.options.min_score)
            .map(|r| Citation {
                source: r.chunk.source,
                content: r.chunk.text,
                score: r.score,
            })
            .collect();

        if citations.is_empty() {
            debug!(
                min_score = self.options.min_score,
                "no chunk scored above the floor"
            );
            return Ok(RetrievalOutcome::InsufficientContext);
        }

        let context = citations
            .iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        debug!(
            chunks = citations.len(),
            context_tokens = estimate(&context),
            "retrieval context assembled"
        );
        Ok(RetrievalOutcome::Context(RetrievedContext {
            context,
            citations,
        }))
    }

    /// Assemble a multi-source bundle under the aggregate token ceiling.
    ///
    /// Blank sources are dropped first; if none remain the outcome is the
    /// sentinel and no budgeting happens. Sections appear in lexicographic
    /// source-name order, after the built-in instruction and any
    /// caller-supplied addendum.
    pub fn assemble_bundle(
        &self,
        bundle: &SourceBundle,
        instruction: Option<&str>,
    ) -> BundleOutcome {
        let non_blank: SourceBundle = bundle
            .iter()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(name, text)| (name.clone(), text.clone()))
            .collect();

        if non_blank.is_empty() {
            info!("bundle assembly with no usable sources");
            return BundleOutcome::InsufficientContext;
        }

        let fitted = fit_many(&non_blank.0, self.options.bundle_max_tokens);

        let mut stats = Vec::with_capacity(fitted.len());
        let mut prompt = match instruction {
            Some(extra) => format!("{BUNDLE_INSTRUCTION}\n\n{extra}"),
            None => BUNDLE_INSTRUCTION.to_string(),
        };

        for (name, text) in &fitted {
            let before = estimate(&non_blank.0[name]);
            let after = estimate(text);
            stats.push(BundleSourceStats {
                name: name.clone(),
                tokens_before: before,
                tokens_after: after,
                truncated: text != &non_blank.0[name],
            });
            prompt.push_str("\n\n## ");
            prompt.push_str(name);
            prompt.push_str("\n\n");
            prompt.push_str(text);
        }

        debug!(
            sources = stats.len(),
            prompt_tokens = estimate(&prompt),
            ceiling = self.options.bundle_max_tokens,
            "bundle prompt assembled"
        );
        BundleOutcome::Context(BundleContext {
            prompt,
            sources: stats,
        })
    }
}
