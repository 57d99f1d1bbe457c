//! Handler functions for `namu config {path,show}`.

use crate::cli::ConfigAction;
use crate::config::NamuConfig;
use namu_core::{Error, Result};

/// Handle a config subcommand.
///
/// Receives the raw `--config` path rather than a loaded config so that
/// `path` works before a config file exists.
pub fn handle_config_command(config_path: Option<&str>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => cmd_config_path(config_path),
        ConfigAction::Show => {
            let config = NamuConfig::load(config_path)?;
            print!("{}", render_config(&config)?);
            Ok(())
        }
    }
}

fn cmd_config_path(config_path: Option<&str>) -> Result<()> {
    match NamuConfig::resolve_config_path(config_path) {
        Some(path) => {
            println!("{}", path.display());
            if !path.exists() {
                eprintln!("(file does not exist; built-in defaults apply)");
            }
            Ok(())
        }
        None => Err(Error::config(
            "Could not determine config directory for this platform",
        )),
    }
}

/// Render the effective config as TOML with the API key masked.
pub fn render_config(config: &NamuConfig) -> Result<String> {
    let mut shown = config.clone();
    if shown.embedding.api_key.is_some() {
        shown.embedding.api_key = Some("********".to_string());
    }
    shown.to_toml_string()
}
