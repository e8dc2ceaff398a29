//! On-disk chunk store: one JSON file per source PDF.
//!
//! Each file is named `<pdf-file-name>.json` inside the configured chunks
//! directory and holds the ordered array of that document's chunk records in
//! the `page_content` / `metadata` wire format, pretty-printed so the files
//! stay inspectable with ordinary tools.

use std::path::{Path, PathBuf};

use crate::models::Chunk;

#[derive(Debug)]
pub enum StoreError {
    Io(String),
    /// A persisted file failed to parse. The whole file is rejected; partial
    /// records from a corrupt file never enter a batch.
    Format { file: String, message: String },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "chunk store I/O error: {}", e),
            StoreError::Format { file, message } => {
                write!(f, "malformed chunk file {}: {}", file, message)
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Everything `load_all` found: the usable chunks plus skip accounting.
#[derive(Debug, Default)]
pub struct ChunkLoad {
    pub chunks: Vec<Chunk>,
    pub files_loaded: usize,
    pub files_skipped: Vec<String>,
}

/// Path of the chunk file for a given source PDF.
pub fn chunk_file_path(chunks_dir: &Path, pdf_path: &Path) -> PathBuf {
    let name = pdf_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "unnamed".to_string());
    chunks_dir.join(format!("{}.json", name))
}

/// Persist one document's chunks, creating the chunks directory if needed.
/// Returns the path written.
pub fn save_chunks(
    chunks_dir: &Path,
    pdf_path: &Path,
    chunks: &[Chunk],
) -> Result<PathBuf, StoreError> {
    std::fs::create_dir_all(chunks_dir).map_err(|e| StoreError::Io(e.to_string()))?;
    let path = chunk_file_path(chunks_dir, pdf_path);
    let json = serde_json::to_string_pretty(chunks).map_err(|e| StoreError::Io(e.to_string()))?;
    std::fs::write(&path, json).map_err(|e| StoreError::Io(e.to_string()))?;
    Ok(path)
}

/// Load one chunk file strictly: any parse failure rejects the whole file.
pub fn load_chunks(path: &Path) -> Result<Vec<Chunk>, StoreError> {
    let content = std::fs::read_to_string(path).map_err(|e| StoreError::Io(e.to_string()))?;
    serde_json::from_str(&content).map_err(|e| StoreError::Format {
        file: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Load every chunk file in the store, in sorted filename order.
///
/// Malformed files are warned about, counted, and skipped; the rest of the
/// load continues. A missing chunks directory yields an empty load (the
/// caller tells the operator to ingest first); other directory-level I/O
/// failures propagate.
pub fn load_all(chunks_dir: &Path) -> Result<ChunkLoad, StoreError> {
    let mut load = ChunkLoad::default();
    if !chunks_dir.exists() {
        return Ok(load);
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(chunks_dir)
        .map_err(|e| StoreError::Io(e.to_string()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().map(|e| e == "json").unwrap_or(false))
        .collect();
    files.sort();

    for path in files {
        match load_chunks(&path) {
            Ok(mut chunks) => {
                load.chunks.append(&mut chunks);
                load.files_loaded += 1;
            }
            Err(e) => {
                eprintln!("Warning: skipping chunk file: {}", e);
                load.files_skipped.push(path.display().to_string());
            }
        }
    }

    Ok(load)
}
