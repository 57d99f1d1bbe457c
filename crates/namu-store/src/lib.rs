//! Retrieval store abstraction for Namu.
//!
//! This crate defines the `RetrievalStore` trait that ingestion writes
//! through and search reads from, plus the backends that implement it.
//!
//! # Features
//!
//! - `store-postgres`: Enable the PostgreSQL + pgvector backend
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       namu-store                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  RetrievalStore trait                                       │
//! │  ├── MemoryStore (always available, fault injection)        │
//! │  └── PgStore (feature: store-postgres)                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  DatabaseConfig (connection and table settings)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod memory;
pub mod store;

#[cfg(feature = "store-postgres")]
pub mod postgres;

pub use config::DatabaseConfig;
pub use memory::{MemoryStore, StoreCalls};
pub use store::{EMPTY_EXPLANATION, RetrievalStore};

#[cfg(feature = "store-postgres")]
pub use postgres::{PgStore, quote_ident};
