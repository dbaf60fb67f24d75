//! Error types for the contextmill domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.
//!
//! Two families matter to callers: configuration errors (bad chunk or
//! overlap sizes, dimensionality mismatches) are fatal and never retried;
//! upstream errors (embedding or completion calls) carry enough detail to
//! retry at the request level. An empty store or empty bundle is *not* an
//! error — the pipeline represents it as an explicit outcome variant that
//! callers branch on.

use thiserror::Error;

/// The top-level error type for all contextmill operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Chunking errors ---
    #[error("Chunking error: {0}")]
    Chunk(#[from] ChunkError),

    // --- Index errors ---
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    // --- Embedding collaborator errors ---
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    // --- Generation collaborator errors ---
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Invalid chunking parameters. Fatal: surfaced immediately, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkError {
    #[error("chunk_size must be greater than zero")]
    ZeroChunkSize,

    #[error("overlap ({overlap}) must be smaller than chunk_size ({chunk_size})")]
    OverlapTooLarge { chunk_size: usize, overlap: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// Query and candidate vectors disagree on dimensionality. This is a
    /// configuration/data error, reported rather than silently producing
    /// a degenerate score.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("store load rejected: {0}")]
    LoadRejected(String),
}

#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Embedding model not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed embedding response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Chat model not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed completion response: {0}")]
    MalformedResponse(String),
}
