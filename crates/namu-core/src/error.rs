//! Error types for Namu operations.
//!
//! This module provides a common `Error` type and `Result<T>` alias used across
//! all Namu crates. Uses `thiserror` for derive macros.

use thiserror::Error;

/// Errors that can occur in Namu operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (missing endpoint, unreadable config file, ...).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The embedding service was unreachable or answered with a non-success status.
    ///
    /// `status` is 0 when no HTTP response was received.
    #[error("Embedding service error (status {status}): {message}")]
    RemoteService {
        /// HTTP status code, or 0 for transport failures.
        status: u16,
        /// Response body or transport error text.
        message: String,
    },

    /// The embedding service answered with an unexpected shape.
    #[error("Unexpected embedding response: expected {expected}, got {actual}")]
    ResponseShape {
        /// What the caller asked for.
        expected: String,
        /// What came back.
        actual: String,
    },

    /// A retrieval store query or write failed.
    #[error("Store error: {0}")]
    Store(String),

    /// The row source failed while streaming.
    #[error("Source error: {0}")]
    Source(String),

    /// An ingestion run is already in progress.
    #[error("Ingestion is already running")]
    AlreadyRunning,

    /// A background task panicked or was cancelled before finishing.
    #[error("Background task failed: {0}")]
    Task(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a remote service error.
    pub fn remote(status: u16, msg: impl Into<String>) -> Self {
        Self::RemoteService {
            status,
            message: msg.into(),
        }
    }

    /// Create a response shape error.
    pub fn response_shape(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::ResponseShape {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a store error.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a source error.
    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    /// Create a background task error.
    pub fn task(msg: impl Into<String>) -> Self {
        Self::Task(msg.into())
    }

    /// Whether this error came from the embedding provider.
    pub fn is_embedding_failure(&self) -> bool {
        matches!(
            self,
            Self::RemoteService { .. } | Self::ResponseShape { .. }
        )
    }
}

/// Result type alias using Namu's Error type.
pub type Result<T> = std::result::Result<T, Error>;
