//! SQLite-backed vector index.
//!
//! One row per chunk, keyed by the content-addressed chunk id, holding the
//! chunk text, its provenance JSON, and the embedding as a little-endian
//! f32 BLOB. Similarity search is a linear cosine scan over stored vectors,
//! which is comfortably fast at this corpus scale and keeps the index a
//! plain SQLite file that survives restarts.

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use crate::models::{Chunk, ChunkMetadata, ScoredChunk};

#[derive(Clone)]
pub struct VectorIndex {
    pool: SqlitePool,
}

/// One source's indexed footprint, as reported by
/// [`VectorIndex::counts_by_source`].
#[derive(Debug)]
pub struct SourceCount {
    pub source: String,
    pub chunks: i64,
    pub last_indexed_ts: Option<i64>,
}

impl VectorIndex {
    /// Open (creating if missing) the index database at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Create the schema. Idempotent.
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chunk_embeddings (
                chunk_id TEXT PRIMARY KEY,
                source TEXT NOT NULL,
                content TEXT NOT NULL,
                metadata_json TEXT NOT NULL DEFAULT '{}',
                model TEXT NOT NULL,
                dims INTEGER NOT NULL,
                embedding BLOB NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_chunk_embeddings_source ON chunk_embeddings(source)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert or replace one chunk's embedding. Keyed on the content hash,
    /// so re-indexing unchanged chunks rewrites identical rows.
    pub async fn upsert(&self, chunk: &Chunk, embedding: &[f32], model: &str) -> Result<()> {
        let metadata_json = serde_json::to_string(&chunk.metadata)?;
        let blob = vec_to_blob(embedding);
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO chunk_embeddings
                (chunk_id, source, content, metadata_json, model, dims, embedding, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(chunk_id) DO UPDATE SET
                source = excluded.source,
                content = excluded.content,
                metadata_json = excluded.metadata_json,
                model = excluded.model,
                dims = excluded.dims,
                embedding = excluded.embedding,
                created_at = excluded.created_at
            "#,
        )
        .bind(chunk.id())
        .bind(&chunk.metadata.source)
        .bind(&chunk.page_content)
        .bind(metadata_json)
        .bind(model)
        .bind(embedding.len() as i64)
        .bind(blob)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Top-k nearest chunks by cosine similarity, descending, with the
    /// chunk id as a deterministic tiebreak. Fewer than k rows returns all.
    pub async fn search(&self, query_vec: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let rows = sqlx::query(
            "SELECT chunk_id, content, metadata_json, embedding FROM chunk_embeddings",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut scored: Vec<(String, ScoredChunk)> = Vec::with_capacity(rows.len());
        for row in &rows {
            let blob: Vec<u8> = row.get("embedding");
            let vec = blob_to_vec(&blob);
            let score = cosine_similarity(query_vec, &vec);

            let metadata_json: String = row.get("metadata_json");
            let metadata: ChunkMetadata = serde_json::from_str(&metadata_json)?;
            let chunk = Chunk {
                page_content: row.get("content"),
                metadata,
            };
            scored.push((row.get("chunk_id"), ScoredChunk { chunk, score }));
        }

        scored.sort_by(|a, b| {
            b.1.score
                .partial_cmp(&a.1.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k);

        Ok(scored.into_iter().map(|(_, sc)| sc).collect())
    }

    /// All chunk ids currently in the index, for pending-skip logic.
    pub async fn existing_ids(&self) -> Result<HashSet<String>> {
        let rows = sqlx::query_scalar::<_, String>("SELECT chunk_id FROM chunk_embeddings")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().collect())
    }

    pub async fn contains(&self, chunk_id: &str) -> Result<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM chunk_embeddings WHERE chunk_id = ?")
                .bind(chunk_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunk_embeddings")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Per-source row counts and newest index timestamp, sorted by source,
    /// for the status report.
    pub async fn counts_by_source(&self) -> Result<Vec<SourceCount>> {
        let rows = sqlx::query(
            r#"
            SELECT source, COUNT(*) AS n, MAX(created_at) AS last_indexed
            FROM chunk_embeddings
            GROUP BY source
            ORDER BY source
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(|row| SourceCount {
                source: row.get("source"),
                chunks: row.get("n"),
                last_indexed_ts: row.get("last_indexed"),
            })
            .collect())
    }

    /// Delete every row. Used by `embed rebuild`.
    pub async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM chunk_embeddings")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Chunk;

    async fn open_temp_index(dir: &tempfile::TempDir) -> VectorIndex {
        let index = VectorIndex::open(&dir.path().join("index.sqlite"))
            .await
            .unwrap();
        index.init_schema().await.unwrap();
        index
    }

    #[tokio::test]
    async fn upsert_is_idempotent_per_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_temp_index(&dir).await;

        let chunk = Chunk::new("glacier mass loss", "data/ar6.pdf", 5);
        index.upsert(&chunk, &[1.0, 0.0], "stub").await.unwrap();
        index.upsert(&chunk, &[1.0, 0.0], "stub").await.unwrap();

        assert_eq!(index.count().await.unwrap(), 1);
        assert!(index.contains(&chunk.id()).await.unwrap());
    }

    #[tokio::test]
    async fn search_orders_by_similarity_and_respects_k() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_temp_index(&dir).await;

        // Vectors at known angles to the query [1, 0].
        let near = Chunk::new("near", "data/a.pdf", 1);
        let mid = Chunk::new("mid", "data/a.pdf", 2);
        let far = Chunk::new("far", "data/a.pdf", 3);
        index.upsert(&near, &[1.0, 0.1], "stub").await.unwrap();
        index.upsert(&mid, &[1.0, 1.0], "stub").await.unwrap();
        index.upsert(&far, &[-1.0, 0.2], "stub").await.unwrap();

        let results = index.search(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.page_content, "near");
        assert_eq!(results[1].chunk.page_content, "mid");
        assert!(results[0].score > results[1].score);

        // k larger than the index returns everything.
        let all = index.search(&[1.0, 0.0], 10).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].chunk.page_content, "far");
    }

    #[tokio::test]
    async fn clear_empties_the_index() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_temp_index(&dir).await;

        let chunk = Chunk::new("text", "data/a.pdf", 1);
        index.upsert(&chunk, &[0.5, 0.5], "stub").await.unwrap();
        assert_eq!(index.count().await.unwrap(), 1);

        index.clear().await.unwrap();
        assert_eq!(index.count().await.unwrap(), 0);
        assert!(index.existing_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn index_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.sqlite");

        let chunk = Chunk::new("persisted", "data/a.pdf", 1);
        {
            let index = VectorIndex::open(&path).await.unwrap();
            index.init_schema().await.unwrap();
            index.upsert(&chunk, &[0.2, 0.8], "stub").await.unwrap();
            index.close().await;
        }

        let reopened = VectorIndex::open(&path).await.unwrap();
        reopened.init_schema().await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
        let results = reopened.search(&[0.2, 0.8], 1).await.unwrap();
        assert_eq!(results[0].chunk.page_content, "persisted");
        assert_eq!(results[0].chunk.metadata.page, 1);
    }
}
