//! Ingestion control and progress.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;

use namu_core::Error;
use namu_ingest::{IngestionProgressState, IngestionStatus, ProgressSnapshot};

use crate::error::ApiError;
use crate::state::AppState;

/// Progress as reported over HTTP, with epoch-millisecond timestamps.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    /// Lowercase status.
    pub status: IngestionStatus,
    /// Rows read so far.
    pub rows_read: u64,
    /// Documents inserted so far.
    pub inserted: u64,
    /// Start time in epoch milliseconds.
    pub started_at: Option<i64>,
    /// Finish time in epoch milliseconds.
    pub finished_at: Option<i64>,
    /// Failure message.
    pub error_message: Option<String>,
    /// Recent snapshots, oldest first.
    pub history: Vec<SnapshotResponse>,
}

/// One progress snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotResponse {
    /// Snapshot time in epoch milliseconds.
    pub at: i64,
    /// Rows read at that time.
    pub rows_read: u64,
    /// Documents inserted at that time.
    pub inserted: u64,
}

fn millis(at: Option<DateTime<Utc>>) -> Option<i64> {
    at.map(|t| t.timestamp_millis())
}

impl From<&ProgressSnapshot> for SnapshotResponse {
    fn from(snapshot: &ProgressSnapshot) -> Self {
        Self {
            at: snapshot.at.timestamp_millis(),
            rows_read: snapshot.rows_read,
            inserted: snapshot.inserted,
        }
    }
}

impl From<&IngestionProgressState> for ProgressResponse {
    fn from(state: &IngestionProgressState) -> Self {
        Self {
            status: state.status,
            rows_read: state.rows_read,
            inserted: state.inserted,
            started_at: millis(state.started_at),
            finished_at: millis(state.finished_at),
            error_message: state.error_message.clone(),
            history: state.history.iter().map(SnapshotResponse::from).collect(),
        }
    }
}

/// POST /api/ingest - start a background ingestion run.
pub async fn start(State(state): State<AppState>) -> Result<(StatusCode, Json<Value>), ApiError> {
    let source = state
        .source
        .as_ref()
        .ok_or_else(|| Error::config("no row source configured for ingestion"))?;

    let handle = state.runner.start(Arc::clone(source))?;
    tracing::info!(source = %source.describe(), "ingestion requested");
    // The run reports through the progress tracker; the handle is detached.
    drop(handle);

    Ok((StatusCode::ACCEPTED, Json(json!({ "status": "started" }))))
}

/// GET /api/progress - current ingestion progress.
pub async fn progress(State(state): State<AppState>) -> Json<ProgressResponse> {
    Json(ProgressResponse::from(state.runner.progress().get().as_ref()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::handlers::testing::{DIM, send, state};
    use namu_core::Row;
    use namu_embed::MockEmbeddingProvider;
    use namu_ingest::VecRowSource;
    use namu_store::MemoryStore;

    fn source() -> Arc<VecRowSource> {
        Arc::new(VecRowSource::new(vec![
            Row::new("Seoul", "capital"),
            Row::new("Busan", "port"),
        ]))
    }

    #[tokio::test]
    async fn test_progress_idle() {
        let app = state(MockEmbeddingProvider::new(DIM), MemoryStore::new());
        let (status, body) = send(app, "GET", "/api/progress").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "idle");
        assert_eq!(body["rowsRead"], 0);
        assert_eq!(body["inserted"], 0);
        assert!(body["startedAt"].is_null());
        assert!(body["finishedAt"].is_null());
        assert!(body["errorMessage"].is_null());
        assert_eq!(body["history"], json!([]));
    }

    #[tokio::test]
    async fn test_ingest_without_source_is_config_error() {
        let app = state(MockEmbeddingProvider::new(DIM), MemoryStore::new());
        let (status, body) = send(app, "POST", "/api/ingest").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("no row source"));
    }

    #[tokio::test]
    async fn test_ingest_accepted() {
        let app = state(MockEmbeddingProvider::new(DIM), MemoryStore::new()).with_source(source());

        let (status, body) = send(app.clone(), "POST", "/api/ingest").await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body, json!({ "status": "started" }));

        let progress = app.runner.progress().get();
        assert_ne!(progress.status, IngestionStatus::Idle);
        assert!(progress.started_at.is_some());
    }

    #[tokio::test]
    async fn test_ingest_rejected_while_running() {
        let app = state(MockEmbeddingProvider::new(DIM), MemoryStore::new()).with_source(source());
        app.runner.progress().try_start().unwrap();

        let (status, body) = send(app.clone(), "POST", "/api/ingest").await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"], "Ingestion is already running");

        let (_, body) = send(app, "GET", "/api/progress").await;
        assert_eq!(body["status"], "running");
        assert!(body["startedAt"].is_i64());
    }

    #[tokio::test]
    async fn test_progress_after_run() {
        let app = state(MockEmbeddingProvider::new(DIM), MemoryStore::new());
        app.runner.start(source()).unwrap().await.unwrap().unwrap();

        let (_, body) = send(app, "GET", "/api/progress").await;
        assert_eq!(body["status"], "done");
        assert_eq!(body["rowsRead"], 2);
        assert_eq!(body["inserted"], 2);
        assert!(body["finishedAt"].is_i64());
        let history = body["history"].as_array().unwrap();
        assert!(!history.is_empty());
        assert!(history[0]["at"].is_i64());
        assert_eq!(history.last().unwrap()["rowsRead"], 2);
    }
}
