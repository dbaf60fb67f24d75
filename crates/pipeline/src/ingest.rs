//! Document ingestion: chunk, embed, and load the store.
//!
//! Ingestion is full-replacement: every call rebuilds the store contents
//! from the documents given. Partial failure leaves the previous store
//! snapshot untouched — chunks are only loaded after every embedding call
//! has succeeded.

use std::sync::Arc;

use contextmill_config::ChunkingConfig;
use contextmill_core::error::{EmbeddingError, Result};
use contextmill_core::{Chunk, Document, Embedder};
use contextmill_index::{DocumentStore, IndexedChunk};
use tracing::{debug, info};

use crate::chunker::chunk_document;

/// Summary of one ingestion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Documents processed.
    pub documents: usize,
    /// Chunks embedded and loaded into the store.
    pub chunks: usize,
}

/// Turns raw documents into an indexed, searchable store.
pub struct DocumentIngestor {
    embedder: Arc<dyn Embedder>,
    store: DocumentStore,
    chunking: ChunkingConfig,
}

impl DocumentIngestor {
    pub fn new(embedder: Arc<dyn Embedder>, store: DocumentStore, chunking: ChunkingConfig) -> Self {
        Self {
            embedder,
            store,
            chunking,
        }
    }

    /// Chunk and embed `documents`, then replace the store contents.
    ///
    /// Blank chunks (whitespace-only spans) are skipped before embedding.
    /// An empty document set loads an empty store, which downstream
    /// retrieval reports as an insufficient-context outcome rather than an
    /// error.
    pub async fn ingest(&self, documents: &[Document]) -> Result<IngestReport> {
        let mut chunks: Vec<Chunk> = Vec::new();

        for document in documents {
            let spans = chunk_document(
                &document.text,
                self.chunking.chunk_size,
                self.chunking.overlap,
            )?;
            let mut kept = 0usize;
            for (index, span) in spans.into_iter().enumerate() {
                if span.text.trim().is_empty() {
                    debug!(
                        document_id = %document.id,
                        index,
                        "skipping blank chunk"
                    );
                    continue;
                }
                kept += 1;
                chunks.push(Chunk {
                    document_id: document.id.clone(),
                    source: document.source.clone(),
                    index,
                    text: span.text,
                    start: span.start,
                    end: span.end,
                });
            }
            debug!(document_id = %document.id, source = %document.source, chunks = kept, "document chunked");
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(EmbeddingError::MalformedResponse(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            ))
            .into());
        }

        let entries: Vec<IndexedChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexedChunk { chunk, embedding })
            .collect();

        let report = IngestReport {
            documents: documents.len(),
            chunks: entries.len(),
        };
        self.store.load(entries).await?;

        info!(
            documents = report.documents,
            chunks = report.chunks,
            embedder = self.embedder.name(),
            "ingestion complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FailingEmbedder, StubEmbedder};
    use contextmill_core::error::Error;

    fn chunking(chunk_size: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig {
            chunk_size,
            overlap,
        }
    }

    #[tokio::test]
    async fn ingest_populates_store() {
        let store = DocumentStore::new();
        let ingestor = DocumentIngestor::new(
            Arc::new(StubEmbedder::new(8)),
            store.clone(),
            chunking(100, 10),
        );

        let docs = vec![
            Document::new("a.md", "alpha document body"),
            Document::new("b.md", "beta document body"),
        ];
        let report = ingestor.ingest(&docs).await.unwrap();
        assert_eq!(report.documents, 2);
        assert_eq!(report.chunks, 2);
        assert_eq!(store.count().await, 2);
    }

    #[tokio::test]
    async fn ingest_splits_long_documents() {
        let store = DocumentStore::new();
        let ingestor = DocumentIngestor::new(
            Arc::new(StubEmbedder::new(8)),
            store.clone(),
            chunking(100, 10),
        );

        let docs = vec![Document::new("long.md", "n".repeat(250))];
        let report = ingestor.ingest(&docs).await.unwrap();
        assert_eq!(report.chunks, 3);

        let snap = store.snapshot().await;
        assert!(snap.entries.iter().all(|e| e.chunk.source == "long.md"));
        assert_eq!(snap.entries[0].chunk.index, 0);
        assert_eq!(snap.entries[2].chunk.index, 2);
    }

    #[tokio::test]
    async fn reingest_replaces_previous_contents() {
        let store = DocumentStore::new();
        let ingestor = DocumentIngestor::new(
            Arc::new(StubEmbedder::new(8)),
            store.clone(),
            chunking(100, 10),
        );

        ingestor
            .ingest(&[Document::new("old.md", "old text")])
            .await
            .unwrap();
        ingestor
            .ingest(&[Document::new("new.md", "new text")])
            .await
            .unwrap();

        let snap = store.snapshot().await;
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.entries[0].chunk.source, "new.md");
        assert_eq!(snap.version, 2);
    }

    #[tokio::test]
    async fn blank_chunks_are_skipped() {
        let store = DocumentStore::new();
        let ingestor = DocumentIngestor::new(
            Arc::new(StubEmbedder::new(8)),
            store.clone(),
            chunking(100, 10),
        );

        let report = ingestor
            .ingest(&[Document::new("blank.md", "   \n\n  ")])
            .await
            .unwrap();
        assert_eq!(report.documents, 1);
        assert_eq!(report.chunks, 0);
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn embedding_failure_leaves_store_untouched() {
        let store = DocumentStore::new();
        let good = DocumentIngestor::new(
            Arc::new(StubEmbedder::new(8)),
            store.clone(),
            chunking(100, 10),
        );
        good.ingest(&[Document::new("keep.md", "keep me")])
            .await
            .unwrap();

        let bad = DocumentIngestor::new(
            Arc::new(FailingEmbedder),
            store.clone(),
            chunking(100, 10),
        );
        let err = bad
            .ingest(&[Document::new("fail.md", "will not index")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));

        let snap = store.snapshot().await;
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.entries[0].chunk.source, "keep.md");
    }

    #[tokio::test]
    async fn invalid_chunking_config_is_reported() {
        let store = DocumentStore::new();
        let ingestor = DocumentIngestor::new(
            Arc::new(StubEmbedder::new(8)),
            store,
            chunking(10, 10),
        );
        let err = ingestor
            .ingest(&[Document::new("x.md", "text")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Chunk(_)));
    }
}
