//! Background ingestion runs.

use std::sync::Arc;
use tokio::task::JoinHandle;

use namu_core::{Error, Result};

use crate::orchestrator::{IngestionOrchestrator, IngestionSummary};
use crate::progress::ProgressTracker;
use crate::source::RowSource;

/// Launches ingestion runs on their own tokio task.
///
/// The start transition is taken synchronously in [`start`](Self::start),
/// so a caller learns of a rejection before anything is spawned. The spawned
/// run does not depend on the caller staying alive, and a run that panics is
/// still recorded as an error so the tracker never stays `Running`.
#[derive(Clone)]
pub struct IngestionRunner {
    orchestrator: Arc<IngestionOrchestrator>,
}

impl IngestionRunner {
    /// Create a runner around a shared orchestrator.
    pub fn new(orchestrator: Arc<IngestionOrchestrator>) -> Self {
        Self { orchestrator }
    }

    /// The progress tracker the runs report to.
    pub fn progress(&self) -> &Arc<ProgressTracker> {
        self.orchestrator.progress()
    }

    /// Start a run over `source` in the background.
    ///
    /// Returns [`namu_core::Error::AlreadyRunning`] if a run is in flight.
    pub fn start(
        &self,
        source: Arc<dyn RowSource>,
    ) -> Result<JoinHandle<Result<IngestionSummary>>> {
        self.orchestrator.progress().try_start()?;

        let orchestrator = Arc::clone(&self.orchestrator);
        let progress = Arc::clone(self.orchestrator.progress());
        let run = tokio::spawn(async move { orchestrator.run_started(source.as_ref()).await });

        Ok(tokio::spawn(async move {
            match run.await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(error = %e, "ingestion task aborted");
                    let err = Error::task(format!("ingestion task aborted: {e}"));
                    progress.error(err.to_string());
                    Err(err)
                }
            }
        }))
    }
}
