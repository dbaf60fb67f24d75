//! Document and Chunk domain types.
//!
//! These are the value objects that flow through the pipeline:
//! raw documents are split into chunks, chunks are embedded and indexed,
//! and queries retrieve chunks back out as ranked context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A source document as ingested.
///
/// Immutable after creation: re-ingesting the same source produces a new
/// `Document` that supersedes this one rather than mutating it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID.
    pub id: String,

    /// Source path or filename (e.g., "runbooks/incident.md").
    pub source: String,

    /// The full raw text of the document.
    pub text: String,

    /// When this document was ingested.
    pub ingested_at: DateTime<Utc>,
}

impl Document {
    /// Create a new document from a source label and its raw text.
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source: source.into(),
            text: text.into(),
            ingested_at: Utc::now(),
        }
    }
}

/// A contiguous, bounded-length span of a source document — the unit of
/// embedding and retrieval.
///
/// `start` and `end` are character offsets into the owning document's
/// text. Consecutive chunks from the same document overlap by the
/// configured overlap length, so spans of neighbouring chunks intersect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// The owning document's ID.
    pub document_id: String,

    /// Human-readable source label, copied from the owning document.
    pub source: String,

    /// Ordinal index of this chunk within its document (0-based).
    pub index: usize,

    /// The text span of this chunk.
    pub text: String,

    /// Character offset of the first character within the document.
    pub start: usize,

    /// Character offset one past the last character within the document.
    pub end: usize,
}

impl Chunk {
    /// Stable identifier combining document identity and ordinal.
    pub fn chunk_id(&self) -> String {
        format!("{}_{}", self.document_id, self.index)
    }

    /// Character length of this chunk's text.
    pub fn char_len(&self) -> usize {
        self.end - self.start
    }
}

/// A request-scoped mapping from logical source name (e.g.
/// "remediation_plan") to its raw text content, used for multi-document
/// analysis.
///
/// Backed by a `BTreeMap` so iteration — and therefore the order in which
/// sources are concatenated into a prompt — is always lexicographic by
/// source name, never insertion order. Never persisted across requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceBundle(pub BTreeMap<String, String>);

impl SourceBundle {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Add or replace a named source.
    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) -> &mut Self {
        self.0.insert(name.into(), text.into());
        self
    }

    /// Iterate sources in lexicographic name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if every source text is empty or whitespace-only.
    pub fn all_blank(&self) -> bool {
        self.0.values().all(|t| t.trim().is_empty())
    }
}

impl FromIterator<(String, String)> for SourceBundle {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
