//! Pipeline status overview.
//!
//! Summarizes each stage of the corpus pipeline: PDFs on disk, chunk files
//! written by ingest, and index coverage. Used by `crag status` to give
//! confidence that ingest and embed runs did what was expected.

use anyhow::Result;

use crate::config::Config;
use crate::corpus::scan_pdfs;
use crate::index::VectorIndex;
use crate::store::load_all;

/// Run the status command: inspect the corpus, chunk store, and index, and
/// print a summary.
pub async fn run_status(config: &Config) -> Result<()> {
    let pdf_count = scan_pdfs(&config.corpus).map(|files| files.len()).ok();

    let load = load_all(&config.corpus.chunks_dir)?;
    let chunk_total = load.chunks.len() as i64;

    let index = VectorIndex::open(&config.index.path).await?;
    index.init_schema().await?;
    let indexed = index.count().await?;
    let by_source = index.counts_by_source().await?;

    let db_size = std::fs::metadata(&config.index.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("climate-rag — Status");
    println!("====================");
    println!();
    println!("  PDF dir:     {}", config.corpus.pdf_dir.display());
    match pdf_count {
        Some(n) => println!("  PDF files:   {}", n),
        None => println!("  PDF files:   (directory not found)"),
    }
    println!("  Chunks dir:  {}", config.corpus.chunks_dir.display());
    if load.files_skipped.is_empty() {
        println!("  Chunk files: {}", load.files_loaded);
    } else {
        println!(
            "  Chunk files: {} ({} skipped)",
            load.files_loaded,
            load.files_skipped.len()
        );
    }
    println!("  Chunks:      {}", chunk_total);
    println!();
    println!("  Index:       {}", config.index.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!(
        "  Indexed:     {} / {} ({}%)",
        indexed,
        chunk_total,
        if chunk_total > 0 {
            (indexed * 100) / chunk_total
        } else {
            0
        }
    );

    if !by_source.is_empty() {
        println!();
        println!("  By source:");
        println!("  {:<40} {:>8}   {}", "SOURCE", "CHUNKS", "LAST INDEXED");
        println!("  {}", "-".repeat(68));
        for s in &by_source {
            let indexed_display = match s.last_indexed_ts {
                Some(ts) => format_ts_relative(ts),
                None => "never".to_string(),
            };
            println!(
                "  {:<40} {:>8}   {}",
                s.source, s.chunks, indexed_display
            );
        }
    }

    println!();

    index.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let delta = now - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
