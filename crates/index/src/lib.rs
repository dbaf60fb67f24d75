//! In-memory document index for contextmill.
//!
//! Two pieces: a [`DocumentStore`] that holds `(chunk, embedding)` pairs
//! behind versioned snapshots, and a cosine-similarity [`ranker`] that
//! scores a snapshot against a query vector. Both are deliberately
//! exact and unsharded — a production vector index is an external
//! collaborator that satisfies the same candidate-source contract.

pub mod ranker;
pub mod store;

pub use ranker::{cosine_similarity, rank, RankedChunk};
pub use store::{DocumentStore, IndexedChunk, Snapshot};
