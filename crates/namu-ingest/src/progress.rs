//! Ingestion progress tracking.
//!
//! The tracker owns one immutable [`IngestionProgressState`] behind an
//! `RwLock<Arc<..>>`. Every transition builds a complete new state and swaps
//! it in under the write lock, so readers always see a consistent record.
//!
//! # State machine
//!
//! ```text
//!   Idle ──start──▶ Running ──done──▶ Done
//!                      │
//!                      └───error──▶ Error
//!
//!   any ──reset──▶ Idle
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, PoisonError, RwLock};

use namu_core::{Error, Result};

/// Default number of progress snapshots kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 120;

/// Lifecycle of an ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestionStatus {
    /// No run has started since the last reset.
    #[default]
    Idle,
    /// A run is in progress.
    Running,
    /// The last run finished successfully.
    Done,
    /// The last run failed.
    Error,
}

/// Counts at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// When the snapshot was taken.
    pub at: DateTime<Utc>,
    /// Rows read so far.
    pub rows_read: u64,
    /// Documents inserted so far.
    pub inserted: u64,
}

/// A complete, immutable view of ingestion progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestionProgressState {
    /// Current status.
    pub status: IngestionStatus,
    /// Rows read by the current or last run.
    pub rows_read: u64,
    /// Documents inserted by the current or last run.
    pub inserted: u64,
    /// When the run started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the run finished or failed.
    pub finished_at: Option<DateTime<Utc>>,
    /// Failure message, when status is `Error`.
    pub error_message: Option<String>,
    /// Recent snapshots, oldest first.
    pub history: VecDeque<ProgressSnapshot>,
}

impl IngestionProgressState {
    fn running() -> Self {
        Self {
            status: IngestionStatus::Running,
            started_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    fn with_snapshot(mut self, rows_read: u64, inserted: u64, capacity: usize) -> Self {
        self.rows_read = rows_read;
        self.inserted = inserted;
        self.history.push_back(ProgressSnapshot {
            at: Utc::now(),
            rows_read,
            inserted,
        });
        while self.history.len() > capacity {
            self.history.pop_front();
        }
        self
    }
}

/// Shared, concurrency-safe ingestion progress.
#[derive(Debug)]
pub struct ProgressTracker {
    state: RwLock<Arc<IngestionProgressState>>,
    capacity: usize,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    /// Create an idle tracker with the default history capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create an idle tracker keeping at most `capacity` snapshots.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: RwLock::new(Arc::new(IngestionProgressState::default())),
            capacity,
        }
    }

    /// The current state.
    pub fn get(&self) -> Arc<IngestionProgressState> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*state)
    }

    /// Begin a run unless one is already running.
    ///
    /// The check and the transition happen under one write lock, so two
    /// concurrent callers can never both succeed.
    pub fn try_start(&self) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.status == IngestionStatus::Running {
            return Err(Error::AlreadyRunning);
        }
        *state = Arc::new(IngestionProgressState::running());
        Ok(())
    }

    /// Begin a run unconditionally, discarding the previous state.
    pub fn start(&self) {
        self.replace(|_| IngestionProgressState::running());
    }

    /// Record cumulative counts without changing status.
    pub fn update(&self, rows_read: u64, inserted: u64) {
        let capacity = self.capacity;
        self.replace(|current| current.clone().with_snapshot(rows_read, inserted, capacity));
    }

    /// Record final counts and mark the run done.
    pub fn done(&self, rows_read: u64, inserted: u64) {
        let capacity = self.capacity;
        self.replace(|current| IngestionProgressState {
            status: IngestionStatus::Done,
            finished_at: Some(Utc::now()),
            ..current.clone().with_snapshot(rows_read, inserted, capacity)
        });
    }

    /// Mark the run failed, keeping the last recorded counts.
    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        self.replace(|current| IngestionProgressState {
            status: IngestionStatus::Error,
            finished_at: Some(Utc::now()),
            error_message: Some(message),
            ..current.clone()
        });
    }

    /// Return to the idle baseline.
    pub fn reset(&self) {
        self.replace(|_| IngestionProgressState::default());
    }

    fn replace(&self, next: impl FnOnce(&IngestionProgressState) -> IngestionProgressState) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = Arc::new(next(&**state));
    }
}

// ============================================================================
// Tests
// ============================================================================
