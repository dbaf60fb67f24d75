//! In-memory document store with versioned snapshots.
//!
//! The store is the only cross-request mutable state in the pipeline.
//! Contents live in an `Arc<Snapshot>` behind an async `RwLock`; `load`
//! builds a complete replacement snapshot and swaps the `Arc`, so a query
//! running concurrently with a reload observes either the old snapshot or
//! the new one, never a mix. Readers clone the `Arc` and keep their view
//! for as long as they need it.

use std::sync::Arc;

use contextmill_core::error::IndexError;
use contextmill_core::Chunk;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// A chunk together with its embedding vector, as held by the store.
#[derive(Debug, Clone)]
pub struct IndexedChunk {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// An immutable view of the store's contents at one point in time.
#[derive(Debug)]
pub struct Snapshot {
    /// Monotonically increasing load generation (0 = never loaded).
    pub version: u64,
    /// All indexed chunks, in insertion order.
    pub entries: Vec<IndexedChunk>,
    /// Shared embedding dimensionality; `None` while empty.
    pub dimension: Option<usize>,
}

impl Snapshot {
    fn empty() -> Self {
        Self {
            version: 0,
            entries: Vec::new(),
            dimension: None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The in-memory chunk/embedding store.
///
/// Empty at process start, populated by ingestion, fully replaced on
/// re-ingestion. Cheap to share: clones hand out the same underlying
/// store.
#[derive(Clone)]
pub struct DocumentStore {
    current: Arc<RwLock<Arc<Snapshot>>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(Snapshot::empty()))),
        }
    }

    /// Replace the store contents with a new set of indexed chunks.
    ///
    /// Validates that every embedding shares one dimensionality before
    /// anything is published: a mismatched load leaves the previous
    /// snapshot fully intact.
    pub async fn load(&self, entries: Vec<IndexedChunk>) -> Result<(), IndexError> {
        let dimension = match entries.first() {
            Some(first) => {
                let expected = first.embedding.len();
                for entry in &entries {
                    if entry.embedding.len() != expected {
                        return Err(IndexError::DimensionMismatch {
                            expected,
                            actual: entry.embedding.len(),
                        });
                    }
                }
                Some(expected)
            }
            None => None,
        };

        let mut guard = self.current.write().await;
        let snapshot = Snapshot {
            version: guard.version + 1,
            entries,
            dimension,
        };
        info!(
            version = snapshot.version,
            chunks = snapshot.entries.len(),
            dimension = ?snapshot.dimension,
            "Document store replaced"
        );
        *guard = Arc::new(snapshot);
        Ok(())
    }

    /// Get a consistent, immutable view of the current contents.
    ///
    /// The returned snapshot does not change even if a concurrent `load`
    /// replaces the underlying contents afterwards.
    pub async fn snapshot(&self) -> Arc<Snapshot> {
        let snap = Arc::clone(&*self.current.read().await);
        debug!(version = snap.version, chunks = snap.len(), "Snapshot taken");
        snap
    }

    /// Number of indexed chunks.
    pub async fn count(&self) -> usize {
        self.current.read().await.len()
    }

    /// Drop all contents, bumping the version.
    pub async fn clear(&self) {
        let mut guard = self.current.write().await;
        *guard = Arc::new(Snapshot {
            version: guard.version + 1,
            entries: Vec::new(),
            dimension: None,
        });
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(doc: &str, index: usize, embedding: Vec<f32>) -> IndexedChunk {
        IndexedChunk {
            chunk: Chunk {
                document_id: doc.into(),
                source: format!("{doc}.md"),
                index,
                text: format!("text {index}"),
                start: 0,
                end: 6,
            },
            embedding,
        }
    }

    #[tokio::test]
    async fn starts_empty() {
        let store = DocumentStore::new();
        assert_eq!(store.count().await, 0);
        let snap = store.snapshot().await;
        assert!(snap.is_empty());
        assert_eq!(snap.version, 0);
        assert_eq!(snap.dimension, None);
    }

    #[tokio::test]
    async fn load_replaces_contents() {
        let store = DocumentStore::new();
        store
            .load(vec![entry("a", 0, vec![1.0, 0.0])])
            .await
            .unwrap();
        assert_eq!(store.count().await, 1);

        store
            .load(vec![
                entry("b", 0, vec![0.0, 1.0]),
                entry("b", 1, vec![1.0, 1.0]),
            ])
            .await
            .unwrap();
        assert_eq!(store.count().await, 2);

        let snap = store.snapshot().await;
        assert_eq!(snap.version, 2);
        assert!(snap.entries.iter().all(|e| e.chunk.document_id == "b"));
    }

    #[tokio::test]
    async fn snapshot_survives_concurrent_reload() {
        let store = DocumentStore::new();
        store
            .load(vec![entry("old", 0, vec![1.0, 0.0])])
            .await
            .unwrap();

        let held = store.snapshot().await;
        store
            .load(vec![entry("new", 0, vec![0.0, 1.0])])
            .await
            .unwrap();

        // The held view still sees the old contents.
        assert_eq!(held.entries[0].chunk.document_id, "old");
        assert_eq!(held.version, 1);

        let fresh = store.snapshot().await;
        assert_eq!(fresh.entries[0].chunk.document_id, "new");
        assert_eq!(fresh.version, 2);
    }

    #[tokio::test]
    async fn mixed_dimensions_rejected_and_previous_kept() {
        let store = DocumentStore::new();
        store
            .load(vec![entry("keep", 0, vec![1.0, 0.0])])
            .await
            .unwrap();

        let err = store
            .load(vec![
                entry("x", 0, vec![1.0, 0.0]),
                entry("x", 1, vec![1.0, 0.0, 0.0]),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::DimensionMismatch { .. }));

        // Failed load must not have touched the store.
        let snap = store.snapshot().await;
        assert_eq!(snap.version, 1);
        assert_eq!(snap.entries[0].chunk.document_id, "keep");
    }

    #[tokio::test]
    async fn empty_load_is_valid() {
        let store = DocumentStore::new();
        store
            .load(vec![entry("a", 0, vec![1.0])])
            .await
            .unwrap();
        store.load(Vec::new()).await.unwrap();
        assert_eq!(store.count().await, 0);
        assert_eq!(store.snapshot().await.dimension, None);
    }

    #[tokio::test]
    async fn clear_bumps_version() {
        let store = DocumentStore::new();
        store
            .load(vec![entry("a", 0, vec![1.0])])
            .await
            .unwrap();
        store.clear().await;
        let snap = store.snapshot().await;
        assert!(snap.is_empty());
        assert_eq!(snap.version, 2);
    }

    #[tokio::test]
    async fn clones_share_contents() {
        let store = DocumentStore::new();
        let other = store.clone();
        store
            .load(vec![entry("shared", 0, vec![1.0])])
            .await
            .unwrap();
        assert_eq!(other.count().await, 1);
    }
}
