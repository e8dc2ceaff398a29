//! Top-k retrieval over the vector index.

use anyhow::Result;
use std::sync::Arc;

use crate::embedding::{embed_query, Embedder};
use crate::index::VectorIndex;
use crate::models::ScoredChunk;

/// Embeds a query and searches the index. Uses the same cosine metric the
/// indexer stored vectors under, so scores are comparable across runs.
#[derive(Clone)]
pub struct Retriever {
    index: VectorIndex,
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    pub fn new(index: VectorIndex, embedder: Arc<dyn Embedder>) -> Self {
        Self { index, embedder }
    }

    /// Return the k most similar chunks, descending. With fewer than k
    /// records in the index, returns all of them.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let query_vec = embed_query(self.embedder.as_ref(), query).await?;
        self.index.search(&query_vec, k).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Chunk;
    use async_trait::async_trait;

    /// Stub that embeds every text to one fixed vector.
    struct FixedEmbedder {
        vector: Vec<f32>,
    }

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| self.vector.clone()).collect())
        }

        fn model_name(&self) -> &str {
            "stub"
        }

        fn dims(&self) -> usize {
            self.vector.len()
        }
    }

    async fn index_with_ten_known_vectors(dir: &tempfile::TempDir) -> VectorIndex {
        let index = VectorIndex::open(&dir.path().join("index.sqlite"))
            .await
            .unwrap();
        index.init_schema().await.unwrap();
        // Similarity to the query direction [1, 0] strictly decreases
        // as the second component grows.
        for i in 0..10 {
            let chunk = Chunk::new(format!("chunk {}", i), "data/ar6.pdf", i + 1);
            index
                .upsert(&chunk, &[1.0, 0.1 * i as f32], "stub")
                .await
                .unwrap();
        }
        index
    }

    #[tokio::test]
    async fn top_k_returns_k_results_in_descending_order() {
        let dir = tempfile::tempdir().unwrap();
        let index = index_with_ten_known_vectors(&dir).await;
        let retriever = Retriever::new(
            index,
            Arc::new(FixedEmbedder {
                vector: vec![1.0, 0.0],
            }),
        );

        let results = retriever.retrieve("closest chunks", 4).await.unwrap();
        assert_eq!(results.len(), 4);
        let contents: Vec<&str> = results.iter().map(|r| r.chunk.page_content.as_str()).collect();
        assert_eq!(contents, vec!["chunk 0", "chunk 1", "chunk 2", "chunk 3"]);
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[tokio::test]
    async fn k_beyond_index_size_returns_everything() {
        let dir = tempfile::tempdir().unwrap();
        let index = index_with_ten_known_vectors(&dir).await;
        let retriever = Retriever::new(
            index,
            Arc::new(FixedEmbedder {
                vector: vec![1.0, 0.0],
            }),
        );

        let results = retriever.retrieve("everything", 20).await.unwrap();
        assert_eq!(results.len(), 10);
    }

    #[tokio::test]
    async fn retrieval_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let index = index_with_ten_known_vectors(&dir).await;
        let retriever = Retriever::new(
            index,
            Arc::new(FixedEmbedder {
                vector: vec![1.0, 0.0],
            }),
        );

        let a = retriever.retrieve("same query", 4).await.unwrap();
        let b = retriever.retrieve("same query", 4).await.unwrap();
        let ids_a: Vec<String> = a.iter().map(|r| r.chunk.id()).collect();
        let ids_b: Vec<String> = b.iter().map(|r| r.chunk.id()).collect();
        assert_eq!(ids_a, ids_b);
    }
}
