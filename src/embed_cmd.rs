//! `crag embed` command orchestration.
//!
//! Bridges the chunk store and the batch indexer: loads persisted chunk
//! files, decides which chunks still need embedding, runs the batch loop,
//! and prints the run summary. The skip set is keyed by content-addressed
//! chunk ids, so re-running `embed pending` after an edited ingest only
//! embeds what actually changed.

use anyhow::{bail, Result};

use crate::config::{Config, EmbeddingConfig};
use crate::embedding::OllamaEmbedder;
use crate::index::VectorIndex;
use crate::indexer::{index_chunks, IndexOptions, IndexReport};
use crate::models::Chunk;
use crate::progress::ProgressReporter;
use crate::store::load_all;

/// Embed chunks not yet present in the index.
pub async fn run_embed_pending(
    config: &Config,
    batch_size_override: Option<usize>,
    dry_run: bool,
    progress: &dyn ProgressReporter,
) -> Result<()> {
    let options = resolve_options(&config.embedding, batch_size_override)?;
    let load = load_all(&config.corpus.chunks_dir)?;
    if load.chunks.is_empty() {
        println!("embed pending");
        println!("  no chunks found (run `crag ingest` first)");
        return Ok(());
    }

    let index = VectorIndex::open(&config.index.path).await?;
    index.init_schema().await?;

    let store_total = load.chunks.len();
    let existing = index.existing_ids().await?;
    let pending: Vec<Chunk> = load
        .chunks
        .into_iter()
        .filter(|c| !existing.contains(&c.id()))
        .collect();

    if dry_run {
        println!("embed pending (dry-run)");
        println!("  chunks in store: {}", store_total);
        println!("  chunks needing embeddings: {}", pending.len());
        index.close().await;
        return Ok(());
    }

    if pending.is_empty() {
        println!("embed pending");
        println!("  all chunks up to date");
        index.close().await;
        return Ok(());
    }

    let report = embed_into(&index, config, &pending, &options, progress).await?;

    println!("embed pending");
    println!("  total pending: {}", report.total);
    print_outcome(&report);

    index.close().await;
    Ok(())
}

/// Clear the index, then embed every persisted chunk.
pub async fn run_embed_rebuild(
    config: &Config,
    batch_size_override: Option<usize>,
    progress: &dyn ProgressReporter,
) -> Result<()> {
    let options = resolve_options(&config.embedding, batch_size_override)?;
    let load = load_all(&config.corpus.chunks_dir)?;

    let index = VectorIndex::open(&config.index.path).await?;
    index.init_schema().await?;
    index.clear().await?;

    println!("embed rebuild — cleared existing index");

    if load.chunks.is_empty() {
        println!("  no chunks to embed");
        index.close().await;
        return Ok(());
    }

    let report = embed_into(&index, config, &load.chunks, &options, progress).await?;

    println!("embed rebuild");
    println!("  total chunks: {}", report.total);
    print_outcome(&report);

    index.close().await;
    Ok(())
}

/// Batch options from config with the CLI `--batch-size` override applied.
///
/// A zero override is rejected here, before the index is opened or
/// cleared; the config-file value is already validated at load time.
fn resolve_options(
    config: &EmbeddingConfig,
    batch_size_override: Option<usize>,
) -> Result<IndexOptions> {
    let mut options = IndexOptions::from_config(config);
    if let Some(batch_size) = batch_size_override {
        if batch_size == 0 {
            bail!("batch_size must be > 0");
        }
        options.batch_size = batch_size;
    }
    Ok(options)
}

async fn embed_into(
    index: &VectorIndex,
    config: &Config,
    chunks: &[Chunk],
    options: &IndexOptions,
    progress: &dyn ProgressReporter,
) -> Result<IndexReport> {
    let embedder = OllamaEmbedder::new(&config.embedding)?;
    index_chunks(index, &embedder, chunks, options, progress).await
}

fn print_outcome(report: &IndexReport) {
    println!("  indexed: {}", report.indexed);
    println!("  dropped: {}", report.dropped);
    if report.failed_batches > 0 {
        println!("  failed batches: {}", report.failed_batches);
    }
    if !report.dropped_chunks.is_empty() {
        println!("  dropped chunks:");
        for label in &report.dropped_chunks {
            println!("    {}", label);
        }
    }
    println!("ok");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_size_override_replaces_config_value() {
        let config = EmbeddingConfig::default();
        assert_eq!(resolve_options(&config, Some(7)).unwrap().batch_size, 7);
        assert_eq!(
            resolve_options(&config, None).unwrap().batch_size,
            config.batch_size
        );
    }

    #[test]
    fn zero_batch_size_override_is_rejected() {
        let err = resolve_options(&EmbeddingConfig::default(), Some(0)).unwrap_err();
        assert!(err.to_string().contains("batch_size must be > 0"));
    }
}
