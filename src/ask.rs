use anyhow::{bail, Result};
use std::sync::Arc;

use crate::config::Config;
use crate::embedding::OllamaEmbedder;
use crate::generation::OllamaGenerator;
use crate::index::VectorIndex;
use crate::retrieve::Retriever;
use crate::synthesize::synthesize;

/// One-shot question answering from the terminal: retrieve, synthesize,
/// print the answer and its sources.
pub async fn run_ask(config: &Config, question: &str, k_override: Option<usize>) -> Result<()> {
    let question = question.trim();
    if question.is_empty() {
        bail!("question must not be empty");
    }
    let k = k_override.unwrap_or(config.retrieval.top_k);
    if k == 0 {
        bail!("k must be >= 1");
    }

    let index = VectorIndex::open(&config.index.path).await?;
    index.init_schema().await?;

    let embedder = Arc::new(OllamaEmbedder::new(&config.embedding)?);
    let retriever = Retriever::new(index.clone(), embedder);

    let retrieved = retriever.retrieve(question, k).await?;
    if retrieved.is_empty() {
        eprintln!(
            "Warning: index returned no chunks; run `crag ingest` and `crag embed pending` first"
        );
    }

    let generator = OllamaGenerator::new(&config.generation)?;
    let answer = synthesize(&generator, question, &retrieved).await?;

    println!("{}", answer.answer);

    if !answer.sources.is_empty() {
        println!();
        println!("Sources:");
        for (i, (scored, excerpt)) in retrieved.iter().zip(answer.sources.iter()).enumerate() {
            println!("  {}. [{:.2}] {}", i + 1, scored.score, scored.chunk.label());
            println!("     \"{}\"", excerpt.content.replace('\n', " ").trim());
        }
    }

    index.close().await;
    Ok(())
}
