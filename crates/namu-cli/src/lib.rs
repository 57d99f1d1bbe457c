//! Command-line interface for Namu.
//!
//! # Key Abstractions
//!
//! - [`NamuConfig`]: settings loaded from TOML, environment, and defaults
//! - [`CliArgs`]: argument parsing for the `namu` binary
//! - [`NamuApp`]: wires providers and stores together and runs commands

pub mod app;
pub mod cli;
pub mod config;
pub mod config_handlers;

pub use app::NamuApp;
pub use cli::{CliArgs, Command, ConfigAction};
pub use config::{NamuConfig, ServerConfig};
