//! # Contextmill Core
//!
//! Domain types, collaborator traits, and error definitions for the
//! contextmill retrieval pipeline. This crate has **zero framework
//! dependencies** — it defines the domain model that all other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! The embedding model, chat model, and storage backends are external
//! collaborators consumed through narrow traits defined here.
//! Implementations live in their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with scripted stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod document;
pub mod error;
pub mod prompt;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use document::{Chunk, Document, SourceBundle};
pub use error::{ChunkError, EmbeddingError, Error, GenerationError, IndexError, Result};
pub use prompt::PromptAction;
pub use provider::{CompletionRequest, CompletionResponse, Embedder, Generator, Usage};
