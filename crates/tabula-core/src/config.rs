//! Application configuration and file discovery.
//!
//! The discovery order is:
//! 1. An explicit path (the CLI `--config` flag).
//! 2. `TABULA_CONFIG` environment variable.
//! 3. `~/.tabula/config.json`
//! 4. If none found, built-in defaults.
//!
//! camelCase keys are accepted alongside snake_case. Unknown keys are ignored.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use tabula_llm::config::builtin_config;
use tabula_llm::{ModelConfig, ProviderKind, SecretString};

use crate::error::ConfigError;
use crate::history::DEFAULT_CONTEXT_LIMIT;
use crate::registry::ProviderRegistry;

pub const CONFIG_ENV: &str = "TABULA_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Provider used at start-up.
    #[serde(default = "default_active_provider", alias = "activeProvider")]
    pub active_provider: ProviderKind,

    #[serde(default)]
    pub providers: ProviderOverrides,

    /// Folder scanned for dataset files.
    #[serde(default = "default_data_dir", alias = "dataDir")]
    pub data_dir: PathBuf,

    /// Entries of history folded into completion-style prompts.
    #[serde(default = "default_history_limit", alias = "historyLimit")]
    pub history_limit: usize,
}

fn default_active_provider() -> ProviderKind {
    ProviderKind::OpenAi
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_history_limit() -> usize {
    DEFAULT_CONTEXT_LIMIT
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            active_provider: default_active_provider(),
            providers: ProviderOverrides::default(),
            data_dir: default_data_dir(),
            history_limit: default_history_limit(),
        }
    }
}

/// Per-provider overrides, keyed by provider id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProviderOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini: Option<ProviderOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai: Option<ProviderOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic: Option<ProviderOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ollama: Option<ProviderOverride>,
}

impl ProviderOverrides {
    pub fn get(&self, kind: ProviderKind) -> Option<&ProviderOverride> {
        match kind {
            ProviderKind::Gemini => self.gemini.as_ref(),
            ProviderKind::OpenAi => self.openai.as_ref(),
            ProviderKind::Anthropic => self.anthropic.as_ref(),
            ProviderKind::Ollama => self.ollama.as_ref(),
        }
    }
}

/// Partial [`ModelConfig`]; unset fields keep the built-in default.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProviderOverride {
    #[serde(default, alias = "modelName", skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, alias = "apiKey", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretString>,
    #[serde(default, alias = "baseUrl", skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, alias = "maxTokens", skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, alias = "timeoutSecs", skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, alias = "additionalParams")]
    pub additional_params: HashMap<String, serde_json::Value>,
}

impl ProviderOverride {
    fn apply(&self, cfg: &mut ModelConfig) {
        if let Some(ref m) = self.model_name {
            cfg.model_name = m.clone();
        }
        if let Some(ref k) = self.api_key {
            cfg.api_key = Some(k.clone());
        }
        if let Some(ref u) = self.base_url {
            cfg.base_url = Some(u.clone());
        }
        if let Some(t) = self.temperature {
            cfg.temperature = t;
        }
        if let Some(m) = self.max_tokens {
            cfg.max_tokens = Some(m);
        }
        if let Some(t) = self.timeout_secs {
            cfg.timeout_secs = Some(t);
        }
        cfg.additional_params.extend(
            self.additional_params
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
    }
}

impl AppConfig {
    /// Parse configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Built-in defaults with this file's overrides applied.
    pub fn model_config(&self, kind: ProviderKind) -> ModelConfig {
        let mut cfg = builtin_config(kind);
        if let Some(ov) = self.providers.get(kind) {
            ov.apply(&mut cfg);
        }
        cfg
    }

    /// Registry holding one merged configuration per provider.
    pub fn registry(&self) -> ProviderRegistry {
        ProviderRegistry::from_configs(ProviderKind::all().map(|k| self.model_config(k)))
            .with_context_limit(self.history_limit)
    }
}

/// Discover the config file path using the fallback chain.
///
/// Returns `None` if no file exists at the home-directory location and
/// `TABULA_CONFIG` is unset.
pub fn discover_config_path(home_dir: Option<PathBuf>) -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        return Some(PathBuf::from(env_path));
    }

    let path = home_dir?.join(".tabula").join("config.json");
    path.exists().then_some(path)
}

/// Load configuration.
///
/// An explicit path must exist. A discovered path that does not exist
/// falls back to defaults with a warning.
pub fn load(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    if let Some(path) = explicit {
        return read_file(path);
    }

    let Some(path) = discover_config_path(dirs::home_dir()) else {
        info!("no config file found, using defaults");
        return Ok(AppConfig::default());
    };

    if !path.exists() {
        warn!(path = %path.display(), "config path does not exist, using defaults");
        return Ok(AppConfig::default());
    }

    read_file(&path)
}

fn read_file(path: &Path) -> Result<AppConfig, ConfigError> {
    debug!(path = %path.display(), "loading config file");
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    AppConfig::from_json_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
