//! CLI command implementations for `tabula`.
//!
//! - [`chat`] -- Interactive chat session or single-message mode.
//! - [`models`] -- Provider overview.

pub mod chat;
pub mod models;

use std::path::Path;

use tabula_core::AppConfig;

/// Load configuration from the given path override or via auto-discovery.
///
/// If `config_override` is provided, loads from that path. Otherwise the
/// discovery chain applies:
/// 1. `TABULA_CONFIG` env var
/// 2. `~/.tabula/config.json`
///
/// Returns the default `AppConfig` if no config file is found.
pub fn load_config(config_override: Option<&str>) -> anyhow::Result<AppConfig> {
    if let Some(path_str) = config_override
        && !Path::new(path_str).exists()
    {
        anyhow::bail!("config file not found: {path_str}");
    }
    let config = tabula_core::config::load(config_override.map(Path::new))?;
    Ok(config)
}
