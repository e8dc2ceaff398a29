//! Ingestion pipeline orchestration.
//!
//! Coordinates the offline corpus flow: scan the PDF directory, extract page
//! text, split pages into overlapping chunks, and persist each document's
//! chunks as a JSON file. A PDF that cannot be read, yields no text, or
//! whose chunk file cannot be written is skipped with a warning; the run
//! continues with the remaining files.

use anyhow::Result;

use crate::chunk::chunk_pages;
use crate::config::Config;
use crate::corpus::scan_pdfs;
use crate::pdf::extract_pages;
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::store::save_chunks;

/// Outcome of one ingest run.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// PDFs matched by the corpus scan.
    pub files_found: usize,
    /// PDFs successfully extracted and chunked.
    pub files_processed: usize,
    /// Source paths skipped because extraction or the chunk file write failed.
    pub files_skipped: Vec<String>,
    /// Total chunks across all processed files.
    pub chunks_written: usize,
}

/// Runs the ingest pipeline: PDFs in, chunk JSON files out.
///
/// With `dry_run` set, extraction and chunking still run (so chunk counts
/// are exact) but nothing is written.
pub fn run_ingest(
    config: &Config,
    dry_run: bool,
    progress: &dyn ProgressReporter,
) -> Result<IngestReport> {
    let files = scan_pdfs(&config.corpus)?;
    let total = files.len() as u64;

    let mut report = IngestReport {
        files_found: files.len(),
        ..Default::default()
    };

    for (i, path) in files.iter().enumerate() {
        let source = path.display().to_string();

        let pages = match extract_pages(path) {
            Ok(pages) => pages,
            Err(e) => {
                eprintln!("Warning: skipping {}: {}", path.display(), e);
                report.files_skipped.push(source);
                continue;
            }
        };

        let chunks = chunk_pages(
            &source,
            &pages,
            config.chunking.chunk_size,
            config.chunking.chunk_overlap,
        )?;

        if !dry_run {
            if let Err(e) = save_chunks(&config.corpus.chunks_dir, path, &chunks) {
                eprintln!("Warning: skipping {}: {}", path.display(), e);
                report.files_skipped.push(source);
                continue;
            }
        }

        report.files_processed += 1;
        report.chunks_written += chunks.len();

        progress.report(ProgressEvent::FileIngested {
            source,
            n: (i + 1) as u64,
            total,
        });
    }

    if dry_run {
        println!("ingest (dry-run)");
        println!("  pdf files found: {}", report.files_found);
        println!("  files processed: {}", report.files_processed);
        println!("  files skipped: {}", report.files_skipped.len());
        println!("  estimated chunks: {}", report.chunks_written);
    } else {
        println!("ingest");
        println!("  pdf files found: {}", report.files_found);
        println!("  files processed: {}", report.files_processed);
        println!("  files skipped: {}", report.files_skipped.len());
        println!("  chunks written: {}", report.chunks_written);
    }
    println!("ok");

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.corpus.pdf_dir = dir.path().join("pdfs");
        config.corpus.chunks_dir = dir.path().join("chunks");
        config
    }

    #[test]
    fn empty_corpus_produces_empty_report() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        std::fs::create_dir_all(&config.corpus.pdf_dir).unwrap();

        let report = run_ingest(&config, false, &NoProgress).unwrap();
        assert_eq!(report.files_found, 0);
        assert_eq!(report.files_processed, 0);
        assert_eq!(report.chunks_written, 0);
    }

    #[test]
    fn missing_pdf_dir_is_an_error() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);

        let err = run_ingest(&config, false, &NoProgress).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn unreadable_pdf_is_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        std::fs::create_dir_all(&config.corpus.pdf_dir).unwrap();
        std::fs::write(config.corpus.pdf_dir.join("broken.pdf"), b"not a pdf").unwrap();

        let report = run_ingest(&config, false, &NoProgress).unwrap();
        assert_eq!(report.files_found, 1);
        assert_eq!(report.files_processed, 0);
        assert_eq!(report.files_skipped.len(), 1);
        assert!(report.files_skipped[0].ends_with("broken.pdf"));
        // nothing processed, so the chunks directory is never created
        assert!(!config.corpus.chunks_dir.exists());
    }
}
