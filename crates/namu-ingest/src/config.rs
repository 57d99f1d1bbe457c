//! Ingestion configuration.

use serde::{Deserialize, Serialize};

use crate::progress::DEFAULT_HISTORY_CAPACITY;

/// Ingestion settings.
///
/// The embedding batch size lives with the embedding settings; this covers
/// the write side and the dataset location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Documents per `insert_batch` call.
    #[serde(default = "default_insert_batch_size")]
    pub insert_batch_size: usize,

    /// JSON Lines dataset to ingest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_path: Option<String>,

    /// Stop after this many rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    /// Progress snapshots kept for status queries.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_insert_batch_size() -> usize {
    100
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            insert_batch_size: default_insert_batch_size(),
            dataset_path: None,
            limit: None,
            history_capacity: default_history_capacity(),
        }
    }
}
