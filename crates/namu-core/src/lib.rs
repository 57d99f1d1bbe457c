//! Namu Core: shared types, errors, and scoring.
//!
//! This crate provides the foundational types used across all Namu crates.
//! It has no internal Namu dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`types`]: Rows, documents, and search result shapes
//! - [`scoring`]: The hybrid fusion formula, as Rust and as SQL
//! - [`fusion`]: Per-id score accumulation and ranking

pub mod error;
pub mod fusion;
pub mod scoring;
pub mod types;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};
pub use fusion::FusionAccumulator;
pub use scoring::FusionWeights;
pub use types::{Document, FusedHit, Row, SearchResult, TextHit, VectorHit};
