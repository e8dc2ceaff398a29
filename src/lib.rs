//! # Climate RAG
//!
//! A retrieval-augmented question answering pipeline for climate reports.
//!
//! Climate RAG ingests IPCC-style PDF reports, splits them into overlapping
//! chunks, embeds the chunks with a local Ollama model into a SQLite vector
//! index, and answers questions grounded in the most similar chunks via a
//! CLI and a small HTTP service with a browser client.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────┐   ┌───────────────┐
//! │ PDF dir  │──▶│ ingest        │──▶│ chunks/*.json │
//! └──────────┘   │ extract+chunk │   └───────┬───────┘
//!                └───────────────┘           │
//!                                            ▼
//!                ┌───────────────┐   ┌───────────────┐
//!                │ Ollama        │◀─▶│ embed         │
//!                │ /api/embed    │   │ batch+retry   │
//!                └───────────────┘   └───────┬───────┘
//!                                            ▼
//! ┌──────────┐   ┌───────────────┐   ┌───────────────┐
//! │ Browser  │──▶│ serve /ask    │◀──│ SQLite index  │
//! │ CLI ask  │   │ retrieve+LLM  │   │ cosine top-k  │
//! └──────────┘   └───────────────┘   └───────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! crag init                   # create the vector index
//! crag ingest                 # PDFs -> chunk JSON files
//! crag embed pending          # embed new chunks into the index
//! crag ask "How much has the planet warmed?"
//! crag serve                  # HTTP API + browser UI
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`models`] | Core data types (chunks, answers, excerpts) |
//! | [`corpus`] | PDF directory scanning |
//! | [`pdf`] | PDF text extraction, one string per page |
//! | [`chunk`] | Overlapping text chunking |
//! | [`store`] | Chunk record files on disk |
//! | [`ingest`] | PDF-to-chunk-files pipeline |
//! | [`embedding`] | Embedding client and vector helpers |
//! | [`index`] | SQLite vector index |
//! | [`indexer`] | Batched embed-and-upsert loop with retry policy |
//! | [`retrieve`] | Top-k cosine retrieval |
//! | [`generation`] | Chat-model client |
//! | [`synthesize`] | Prompt assembly and answer synthesis |
//! | [`server`] | HTTP query service and browser UI |
//! | [`progress`] | Progress reporting for long-running commands |
//! | [`embed_cmd`] | `crag embed` orchestration |
//! | [`ask`] | `crag ask` one-shot terminal answers |
//! | [`status`] | `crag status` pipeline overview |

pub mod ask;
pub mod chunk;
pub mod config;
pub mod corpus;
pub mod embed_cmd;
pub mod embedding;
pub mod generation;
pub mod index;
pub mod indexer;
pub mod ingest;
pub mod models;
pub mod pdf;
pub mod progress;
pub mod retrieve;
pub mod server;
pub mod status;
pub mod store;
pub mod synthesize;
