//! Core data models shared across the pipeline.
//!
//! These types represent the chunks, retrieval results, and answers that flow
//! from ingestion through the vector index to the query service.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Provenance of a chunk: the source PDF path and a 1-based page number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: String,
    pub page: usize,
}

/// A contiguous span of extracted page text.
///
/// Immutable once created. `page_content` is at most `chunking.chunk_size`
/// characters long; consecutive chunks from the same page share
/// `chunking.chunk_overlap` characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub page_content: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    pub fn new(page_content: impl Into<String>, source: impl Into<String>, page: usize) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: ChunkMetadata {
                source: source.into(),
                page,
            },
        }
    }

    /// Content-addressed identifier: SHA-256 over the chunk text and its
    /// provenance. Identical corpus input always produces identical ids, so
    /// re-embedding is idempotent.
    pub fn id(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.page_content.as_bytes());
        hasher.update(b"\0");
        hasher.update(self.metadata.source.as_bytes());
        hasher.update(b"\0");
        hasher.update(self.metadata.page.to_le_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Short human-readable label for warnings and reports.
    pub fn label(&self) -> String {
        format!("{} p.{}", self.metadata.source, self.metadata.page)
    }
}

/// A retrieved chunk paired with its cosine similarity score.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Truncated view of a supporting chunk, as returned alongside an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceExcerpt {
    pub content: String,
    pub metadata: ChunkMetadata,
}

/// Final answer text together with the excerpts that grounded it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<SourceExcerpt>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_ids_are_stable_and_distinct() {
        let a = Chunk::new("warming of the climate system", "data/ar6.pdf", 3);
        let b = Chunk::new("warming of the climate system", "data/ar6.pdf", 3);
        let c = Chunk::new("warming of the climate system", "data/ar6.pdf", 4);
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
        assert_eq!(a.id().len(), 64);
    }

    #[test]
    fn chunk_serializes_with_original_field_names() {
        let chunk = Chunk::new("sea level rise", "data/ar6.pdf", 12);
        let json = serde_json::to_value(&chunk).unwrap();
        assert_eq!(json["page_content"], "sea level rise");
        assert_eq!(json["metadata"]["source"], "data/ar6.pdf");
        assert_eq!(json["metadata"]["page"], 12);
    }
}
