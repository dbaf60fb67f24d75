//! The contextmill pipeline — from raw documents to bounded prompt context.
//!
//! Data flow:
//!
//! 1. **Ingestion**: raw documents → [`chunker`] → embeddings → document store
//! 2. **Retrieval**: query text → embed → rank against the store → matched chunks
//! 3. **Assembly**: matched chunks (or a multi-document bundle) → [`budget`] →
//!    bounded context block + citations → generation collaborator
//!
//! Chunking, budgeting, and ranking are pure computations; only the
//! embedding and completion calls suspend. An empty store or empty bundle
//! is a normal outcome represented by an explicit sentinel variant, not an
//! error — callers must branch on it before invoking generation.

pub mod assembler;
pub mod budget;
pub mod chunker;
pub mod engine;
pub mod ingest;

pub use assembler::{
    AssemblerOptions, BundleContext, BundleOutcome, BundleSourceStats, Citation, ContextAssembler,
    RetrievalOutcome, RetrievedContext,
};
pub use chunker::{chunk, chunk_document, ChunkSpan};
pub use engine::{AnalysisOutcome, BundleAnalysis, RagAnswer, RagEngine, RagOutcome};
pub use ingest::{DocumentIngestor, IngestReport};

#[cfg(test)]
pub(crate) mod test_helpers;
