//! # Climate RAG CLI (`crag`)
//!
//! The `crag` binary is the primary interface for the pipeline. It provides
//! commands for index initialization, PDF ingestion, embedding management,
//! one-shot question answering, status reporting, and starting the HTTP
//! query service.
//!
//! ## Usage
//!
//! ```bash
//! crag --config ./config/crag.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `crag init` | Create the SQLite vector index and its schema |
//! | `crag ingest` | Extract and chunk PDFs into chunk record files |
//! | `crag embed pending` | Embed chunks not yet in the index |
//! | `crag embed rebuild` | Clear the index and re-embed every chunk |
//! | `crag ask "<question>"` | Answer one question from the terminal |
//! | `crag status` | Corpus, chunk-store, and index counts |
//! | `crag serve` | Start the HTTP query service and browser UI |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the index
//! crag init --config ./config/crag.toml
//!
//! # Chunk the PDFs in [corpus].pdf_dir
//! crag ingest --config ./config/crag.toml
//!
//! # Embed new chunks (retry-once-then-skip per batch)
//! crag embed pending --config ./config/crag.toml
//!
//! # Ask from the terminal
//! crag ask "What are the main drivers of sea level rise?"
//!
//! # Serve the API and UI
//! crag serve --config ./config/crag.toml
//! ```

use anyhow::bail;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use climate_rag::config;
use climate_rag::embedding::OllamaEmbedder;
use climate_rag::generation::{Generator, OllamaGenerator};
use climate_rag::index::VectorIndex;
use climate_rag::progress::ProgressMode;
use climate_rag::retrieve::Retriever;
use climate_rag::{ask, embed_cmd, ingest, server, status};

/// Climate RAG CLI: retrieval-augmented question answering over climate
/// report PDFs.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/crag.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "crag",
    about = "Climate RAG — retrieval-augmented question answering over climate report PDFs",
    version,
    long_about = "Climate RAG ingests climate report PDFs, chunks and embeds them into a \
    SQLite vector index via a local Ollama service, and answers questions grounded in the \
    most similar chunks through a CLI and an HTTP query service with a browser client."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/crag.toml`. All corpus, chunking, embedding,
    /// retrieval, and server settings are read from this file.
    #[arg(long, global = true, default_value = "./config/crag.toml")]
    config: PathBuf,

    /// Progress reporting on stderr: `auto` (human when stderr is a TTY),
    /// `off`, or `json` (one JSON object per line).
    #[arg(long, global = true, default_value = "auto")]
    progress: String,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the vector index.
    ///
    /// Creates the SQLite database file and the embeddings table. This
    /// command is idempotent; running it multiple times is safe.
    Init,

    /// Extract and chunk the PDF corpus.
    ///
    /// Scans `[corpus].pdf_dir` for PDFs, extracts text page by page, splits
    /// pages into overlapping chunks, and writes one chunk record file per
    /// PDF into `[corpus].chunks_dir`. Unreadable PDFs are skipped with a
    /// warning.
    Ingest {
        /// Show file and chunk counts without writing chunk files.
        #[arg(long)]
        dry_run: bool,
    },

    /// Manage the embedding index.
    ///
    /// Subcommands for embedding new chunks and rebuilding the index from
    /// scratch. Requires the Ollama embedding service to be reachable.
    Embed {
        #[command(subcommand)]
        action: EmbedAction,
    },

    /// Answer one question from the terminal.
    ///
    /// Embeds the question, retrieves the most similar chunks from the
    /// index, and prints the model's grounded answer with its sources.
    Ask {
        /// The question to answer.
        question: String,

        /// Number of chunks to retrieve (defaults to `[retrieval].top_k`).
        #[arg(short)]
        k: Option<usize>,
    },

    /// Show corpus, chunk-store, and index counts.
    ///
    /// Useful for spotting partial ingests or partial embedding runs at a
    /// glance.
    Status,

    /// Start the HTTP query service.
    ///
    /// Binds to `[server].bind` and serves `POST /ask` plus the browser
    /// client at `/ui`.
    Serve,
}

/// Embedding management subcommands.
#[derive(Subcommand)]
enum EmbedAction {
    /// Embed chunks that are not yet in the index.
    ///
    /// Loads all persisted chunk files, skips chunks whose ids are already
    /// indexed, and embeds the rest in batches. A batch that fails twice is
    /// dropped with a warning; the run continues.
    Pending {
        /// Override the batch size from config (number of texts per API call).
        #[arg(long)]
        batch_size: Option<usize>,

        /// Show counts without performing any embedding.
        #[arg(long)]
        dry_run: bool,
    },

    /// Delete and regenerate all embeddings.
    ///
    /// Useful when switching embedding models or dimensions. Clears the
    /// index and re-embeds every persisted chunk.
    Rebuild {
        /// Override the batch size from config (number of texts per API call).
        #[arg(long)]
        batch_size: Option<usize>,
    },
}

fn progress_mode(value: &str) -> anyhow::Result<ProgressMode> {
    match value {
        "auto" => Ok(ProgressMode::default_for_tty()),
        "off" => Ok(ProgressMode::Off),
        "json" => Ok(ProgressMode::Json),
        _ => bail!("Unknown progress mode: {}. Use auto, off, or json.", value),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_config(&cli.config)?;
    let progress = progress_mode(&cli.progress)?.reporter();

    match cli.command {
        Commands::Init => {
            let index = VectorIndex::open(&cfg.index.path).await?;
            index.init_schema().await?;
            index.close().await;
            println!("Index initialized at {}.", cfg.index.path.display());
        }
        Commands::Ingest { dry_run } => {
            ingest::run_ingest(&cfg, dry_run, progress.as_ref())?;
        }
        Commands::Embed { action } => match action {
            EmbedAction::Pending {
                batch_size,
                dry_run,
            } => {
                embed_cmd::run_embed_pending(&cfg, batch_size, dry_run, progress.as_ref()).await?;
            }
            EmbedAction::Rebuild { batch_size } => {
                embed_cmd::run_embed_rebuild(&cfg, batch_size, progress.as_ref()).await?;
            }
        },
        Commands::Ask { question, k } => {
            ask::run_ask(&cfg, &question, k).await?;
        }
        Commands::Status => {
            status::run_status(&cfg).await?;
        }
        Commands::Serve => {
            let index = VectorIndex::open(&cfg.index.path).await?;
            index.init_schema().await?;
            let embedder = Arc::new(OllamaEmbedder::new(&cfg.embedding)?);
            let retriever = Retriever::new(index, embedder);
            let generator: Arc<dyn Generator> = Arc::new(OllamaGenerator::new(&cfg.generation)?);
            server::run_server(&cfg, retriever, generator).await?;
        }
    }

    Ok(())
}
