//! Batch embedding pipeline.
//!
//! Feeds persisted chunks through the embedding service in fixed-size
//! batches and upserts the vectors into the index. Batches run strictly
//! sequentially. A failed batch is retried exactly once after a fixed
//! backoff; if the retry also fails the batch's chunks are dropped, counted,
//! and the run continues. One bad batch never aborts the run.
//!
//! Outcomes are returned as an explicit [`IndexReport`] rather than only
//! being logged, so callers can detect partial failure.

use anyhow::Result;
use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::embedding::Embedder;
use crate::index::VectorIndex;
use crate::models::Chunk;
use crate::progress::{ProgressEvent, ProgressReporter};

/// Tuning for one indexing run.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub batch_size: usize,
    /// Pause between successful batches (skipped after the last batch).
    pub batch_pause_ms: u64,
    /// Wait before the single retry of a failed batch.
    pub retry_backoff_ms: u64,
}

impl IndexOptions {
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            batch_pause_ms: config.batch_pause_ms,
            retry_backoff_ms: config.retry_backoff_ms,
        }
    }
}

/// Outcome of one indexing run. `indexed + dropped == total` always holds.
#[derive(Debug, Default)]
pub struct IndexReport {
    pub total: usize,
    pub indexed: usize,
    pub dropped: usize,
    pub failed_batches: usize,
    /// Provenance labels of dropped chunks, for operator follow-up.
    pub dropped_chunks: Vec<String>,
}

/// Embed `chunks` in batches and upsert them into `index`.
///
/// Embedding-service failures are handled by the retry-then-drop policy.
/// Index storage failures are not part of that policy and propagate.
pub async fn index_chunks(
    index: &VectorIndex,
    embedder: &dyn Embedder,
    chunks: &[Chunk],
    options: &IndexOptions,
    progress: &dyn ProgressReporter,
) -> Result<IndexReport> {
    let mut report = IndexReport {
        total: chunks.len(),
        ..Default::default()
    };
    if chunks.is_empty() {
        return Ok(report);
    }

    let total_batches = (chunks.len() + options.batch_size - 1) / options.batch_size;

    for (i, batch) in chunks.chunks(options.batch_size).enumerate() {
        let batch_num = (i + 1) as u64;
        let texts: Vec<String> = batch.iter().map(|c| c.page_content.clone()).collect();

        let vectors = match embedder.embed(&texts).await {
            Ok(v) => Some(v),
            Err(e) => {
                eprintln!(
                    "Warning: embedding batch {}/{} failed: {}",
                    batch_num, total_batches, e
                );
                progress.report(ProgressEvent::BatchRetrying {
                    n: batch_num,
                    total: total_batches as u64,
                });
                tokio::time::sleep(Duration::from_millis(options.retry_backoff_ms)).await;
                match embedder.embed(&texts).await {
                    Ok(v) => Some(v),
                    Err(e2) => {
                        eprintln!(
                            "Warning: embedding batch {}/{} failed after retry: {}",
                            batch_num, total_batches, e2
                        );
                        None
                    }
                }
            }
        };

        match vectors {
            Some(vectors) => {
                for (chunk, vector) in batch.iter().zip(vectors.iter()) {
                    index.upsert(chunk, vector, embedder.model_name()).await?;
                }
                report.indexed += batch.len();
                progress.report(ProgressEvent::BatchEmbedded {
                    n: batch_num,
                    total: total_batches as u64,
                    indexed: report.indexed as u64,
                });
                if batch_num < total_batches as u64 && options.batch_pause_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(options.batch_pause_ms)).await;
                }
            }
            None => {
                report.dropped += batch.len();
                report.failed_batches += 1;
                for chunk in batch {
                    report.dropped_chunks.push(chunk.label());
                }
                progress.report(ProgressEvent::BatchDropped {
                    n: batch_num,
                    total: total_batches as u64,
                    dropped: batch.len() as u64,
                });
            }
        }
    }

    Ok(report)
}
