//! Ingest and embed progress reporting.
//!
//! Long-running commands (`crag ingest`, `crag embed`) report progress so the
//! operator can see how far along a run is and which batches were retried or
//! dropped. Progress is emitted on **stderr** so stdout stays parseable.

use std::io::Write;

/// A single progress event from the ingest or embed pipeline.
#[derive(Clone, Debug)]
pub enum ProgressEvent {
    /// A source PDF finished ingesting: n of total files done.
    FileIngested { source: String, n: u64, total: u64 },
    /// An embedding batch was stored: n of total batches done, with the
    /// running count of indexed chunks.
    BatchEmbedded { n: u64, total: u64, indexed: u64 },
    /// A batch failed once and is about to be retried.
    BatchRetrying { n: u64, total: u64 },
    /// A batch failed twice; its chunks were dropped and the run continues.
    BatchDropped { n: u64, total: u64, dropped: u64 },
}

/// Reports pipeline progress. Implementations write to stderr.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Human-friendly progress lines on stderr.
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: ProgressEvent) {
        let line = match &event {
            ProgressEvent::FileIngested { source, n, total } => {
                format!("ingest  {} / {} files  {}\n", n, total, source)
            }
            ProgressEvent::BatchEmbedded { n, total, indexed } => {
                format!(
                    "embed  batch {} / {}  indexed {}\n",
                    n,
                    total,
                    format_number(*indexed)
                )
            }
            ProgressEvent::BatchRetrying { n, total } => {
                format!("embed  batch {} / {}  failed, retrying...\n", n, total)
            }
            ProgressEvent::BatchDropped { n, total, dropped } => {
                format!("embed  batch {} / {}  dropped {} chunks\n", n, total, dropped)
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        let obj = match &event {
            ProgressEvent::FileIngested { source, n, total } => serde_json::json!({
                "event": "progress",
                "phase": "ingest",
                "source": source,
                "n": n,
                "total": total
            }),
            ProgressEvent::BatchEmbedded { n, total, indexed } => serde_json::json!({
                "event": "progress",
                "phase": "embed",
                "batch": n,
                "batches": total,
                "indexed": indexed
            }),
            ProgressEvent::BatchRetrying { n, total } => serde_json::json!({
                "event": "progress",
                "phase": "embed_retry",
                "batch": n,
                "batches": total
            }),
            ProgressEvent::BatchDropped { n, total, dropped } => serde_json::json!({
                "event": "progress",
                "phase": "embed_drop",
                "batch": n,
                "batches": total,
                "dropped": dropped
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
