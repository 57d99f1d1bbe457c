//! Row sources.
//!
//! A [`RowSource`] opens a lazy, finite stream of rows. The orchestrator
//! consumes it once, front to back.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::LinesStream;

use namu_core::{Error, Result, Row};

/// A stream of rows, where any item may carry a source failure.
pub type RowStream = BoxStream<'static, Result<Row>>;

/// Something that can produce rows for ingestion.
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Open a fresh stream of rows.
    async fn open(&self) -> Result<RowStream>;

    /// Human-readable description for logs.
    fn describe(&self) -> String;
}

// ============================================================================
// In-memory source
// ============================================================================

/// Rows held in memory, optionally ending in a failure.
#[derive(Debug, Clone, Default)]
pub struct VecRowSource {
    rows: Vec<Row>,
    failure: Option<String>,
}

impl VecRowSource {
    /// Create a source yielding `rows` in order.
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows,
            failure: None,
        }
    }

    /// After the rows are exhausted, yield one source error with `message`.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }
}

#[async_trait]
impl RowSource for VecRowSource {
    async fn open(&self) -> Result<RowStream> {
        let rows = stream::iter(self.rows.clone().into_iter().map(Ok));
        let failure = stream::iter(self.failure.clone().map(|m| Err(Error::source(m))));
        Ok(rows.chain(failure).boxed())
    }

    fn describe(&self) -> String {
        format!("{} in-memory rows", self.rows.len())
    }
}

// ============================================================================
// JSON Lines source
// ============================================================================

/// Rows read from a JSON Lines file, one object per line.
///
/// Each line must deserialize into a [`Row`]. Blank lines are skipped and do
/// not count towards the limit.
#[derive(Debug, Clone)]
pub struct JsonlRowSource {
    path: PathBuf,
    limit: Option<usize>,
}

impl JsonlRowSource {
    /// Create a source reading `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            limit: None,
        }
    }

    /// Stop after `limit` rows.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }
}

fn parse_line(line_no: usize, line: std::io::Result<String>) -> Option<Result<Row>> {
    match line {
        Err(e) => Some(Err(Error::source(format!("read line {line_no}: {e}")))),
        Ok(text) if text.trim().is_empty() => None,
        Ok(text) => Some(
            serde_json::from_str(&text)
                .map_err(|e| Error::source(format!("parse line {line_no}: {e}"))),
        ),
    }
}

#[async_trait]
impl RowSource for JsonlRowSource {
    async fn open(&self) -> Result<RowStream> {
        let file = tokio::fs::File::open(&self.path)
            .await
            .map_err(|e| Error::source(format!("open {}: {e}", self.path.display())))?;

        let rows = LinesStream::new(BufReader::new(file).lines())
            .enumerate()
            .filter_map(|(idx, line)| futures::future::ready(parse_line(idx + 1, line)));

        Ok(match self.limit {
            Some(limit) => rows.take(limit).boxed(),
            None => rows.boxed(),
        })
    }

    fn describe(&self) -> String {
        match self.limit {
            Some(limit) => format!("{} (limit {limit})", self.path.display()),
            None => self.path.display().to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
