//! Configuration for the `namu` binary.
//!
//! Provides the [`NamuConfig`] struct that loads from TOML files,
//! environment variables, and defaults using the `confyg` crate.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `NAMU_CONFIG` environment variable
//! 3. XDG default: `~/.config/namu/config.toml`
//! 4. Built-in defaults
//!
//! Environment overrides use the `NAMU_<SECTION>_<KEY>` form, for example
//! `NAMU_DATABASE_URL` or `NAMU_EMBEDDING_ENDPOINT_URL`.

use confyg::{Confygery, env};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use namu_core::{Error, Result};
use namu_embed::EmbeddingConfig;
use namu_ingest::IngestConfig;
use namu_search::SearchConfig;
use namu_store::DatabaseConfig;

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "NAMU_CONFIG";

// ============================================================================
// Configuration structs
// ============================================================================

/// Main configuration for the `namu` binary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamuConfig {
    /// Postgres connection and table.
    pub database: DatabaseConfig,

    /// Embedding service.
    pub embedding: EmbeddingConfig,

    /// Ingestion batching and dataset.
    pub ingest: IngestConfig,

    /// Search tuning.
    pub search: SearchConfig,

    /// HTTP server.
    pub server: ServerConfig,
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,

    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// The address to bind.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::config(format!("invalid server address: {e}")))
    }
}

// ============================================================================
// Config loading
// ============================================================================

impl NamuConfig {
    /// Load configuration from file, environment, and defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path)
            && path.exists()
        {
            builder
                .add_file(&path.to_string_lossy())
                .map_err(|e| Error::config(format!("config file: {e}")))?;
        }

        let mut env_opts = env::Options::with_top_level("NAMU");
        env_opts.add_section("database");
        env_opts.add_section("embedding");
        env_opts.add_section("ingest");
        env_opts.add_section("search");
        env_opts.add_section("server");
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        let config: Self = builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))?;

        Ok(config)
    }

    /// Resolve the config file path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Some(PathBuf::from(path));
        }

        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("namu").join("config.toml"))
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================
