//! Ingestion for Namu.
//!
//! Streams rows from a [`RowSource`], embeds them in batches, persists them
//! through a `RetrievalStore`, and reports progress through a shared
//! [`ProgressTracker`].
//!
//! # Modules
//!
//! - [`progress`]: Progress state machine with bounded history
//! - [`source`]: Row sources (in-memory, JSON Lines)
//! - [`orchestrator`]: Batch embed and insert pipeline
//! - [`runner`]: Background task launcher with an atomic start guard
//! - [`config`]: Ingestion settings

pub mod config;
pub mod orchestrator;
pub mod progress;
pub mod runner;
pub mod source;

pub use config::IngestConfig;
pub use orchestrator::{IngestionOrchestrator, IngestionSummary};
pub use progress::{
    DEFAULT_HISTORY_CAPACITY, IngestionProgressState, IngestionStatus, ProgressSnapshot,
    ProgressTracker,
};
pub use runner::IngestionRunner;
pub use source::{JsonlRowSource, RowSource, RowStream, VecRowSource};
