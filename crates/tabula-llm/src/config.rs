//! Provider identifiers and per-provider model configuration.
//!
//! Each supported backend has exactly one [`ModelConfig`]. The built-in
//! defaults are returned by [`builtin_config`]; the application layer merges
//! user overrides on top of them.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::secret::SecretString;

/// Default sampling temperature for every provider.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Default output-token budget for every provider.
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// HTTP timeout for cloud backends, in seconds.
pub const CLOUD_TIMEOUT_SECS: u64 = 120;

/// HTTP timeout for Ollama generation, in seconds.
pub const OLLAMA_TIMEOUT_SECS: u64 = 30;

/// The closed set of supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    OpenAi,
    Anthropic,
    Ollama,
}

/// How a backend expects conversation history to be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStyle {
    /// Role-tagged message list (system, user, assistant, ...).
    Chat,
    /// A single text prompt with prior turns folded into it.
    Completion,
}

impl ProviderKind {
    /// All supported providers, in display order.
    pub fn all() -> [ProviderKind; 4] {
        [
            ProviderKind::Gemini,
            ProviderKind::OpenAi,
            ProviderKind::Anthropic,
            ProviderKind::Ollama,
        ]
    }

    /// Lowercase identifier (`"openai"`, `"gemini"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Ollama => "ollama",
        }
    }

    /// Human-readable name used in user-facing messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "Gemini",
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Anthropic => "Anthropic",
            ProviderKind::Ollama => "Ollama",
        }
    }

    /// Environment variable holding the API key, if the provider needs one.
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderKind::Gemini => Some("GEMINI_API_KEY"),
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            ProviderKind::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderKind::Ollama => None,
        }
    }

    pub fn requires_api_key(&self) -> bool {
        self.api_key_env().is_some()
    }

    pub fn prompt_style(&self) -> PromptStyle {
        match self {
            ProviderKind::OpenAi => PromptStyle::Chat,
            _ => PromptStyle::Completion,
        }
    }

    /// Base URL used when the config does not set one.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::Anthropic => "https://api.anthropic.com/v1",
            ProviderKind::Ollama => "http://localhost:11434",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini-pro",
            ProviderKind::OpenAi => "gpt-3.5-turbo",
            ProviderKind::Anthropic => "claude-3-sonnet-20240229",
            ProviderKind::Ollama => "llama2",
        }
    }

    fn default_timeout_secs(&self) -> u64 {
        match self {
            ProviderKind::Ollama => OLLAMA_TIMEOUT_SECS,
            _ => CLOUD_TIMEOUT_SECS,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(ProviderKind::Gemini),
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "ollama" => Ok(ProviderKind::Ollama),
            _ => Err(ProviderError::UnsupportedProvider(s.to_string())),
        }
    }
}

/// Settings for one backend: which model, how to reach it, how to sample.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    pub provider: ProviderKind,

    #[serde(alias = "modelName")]
    pub model_name: String,

    /// Explicit key. Falls back to the provider's env var when unset.
    #[serde(default, alias = "apiKey", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretString>,

    #[serde(default, alias = "baseUrl", skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default, alias = "maxTokens", skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Provider-specific extras merged into the request body.
    #[serde(default, alias = "additionalParams")]
    pub additional_params: HashMap<String, serde_json::Value>,

    #[serde(default, alias = "timeoutSecs", skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

impl ModelConfig {
    /// The base URL to use, without a trailing slash.
    pub fn endpoint(&self) -> String {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(
            self.timeout_secs
                .unwrap_or_else(|| self.provider.default_timeout_secs()),
        )
    }

    /// Resolve the API key: explicit key > environment variable.
    ///
    /// Empty and placeholder values count as absent at both levels.
    pub fn resolve_api_key(&self) -> Option<SecretString> {
        if let Some(key) = self.api_key.as_ref().filter(|k| k.is_usable()) {
            return Some(key.clone());
        }
        let env = self.provider.api_key_env()?;
        std::env::var(env)
            .ok()
            .map(SecretString::new)
            .filter(SecretString::is_usable)
    }

    /// Like [`resolve_api_key`](Self::resolve_api_key) but fails with
    /// `NotConfigured` when no usable key is found.
    pub fn require_api_key(&self) -> crate::Result<SecretString> {
        self.resolve_api_key().ok_or_else(|| {
            let hint = match self.provider.api_key_env() {
                Some(env) => format!(
                    "{} API key is required (set it in config or the {env} env var)",
                    self.provider.display_name()
                ),
                None => format!("{} API key is required", self.provider.display_name()),
            };
            ProviderError::NotConfigured(hint)
        })
    }

    /// Whether a usable credential is present (always true for keyless providers).
    pub fn has_credentials(&self) -> bool {
        !self.provider.requires_api_key() || self.resolve_api_key().is_some()
    }
}

/// Built-in defaults for one provider.
pub fn builtin_config(kind: ProviderKind) -> ModelConfig {
    ModelConfig {
        provider: kind,
        model_name: kind.default_model().to_string(),
        api_key: None,
        base_url: match kind {
            ProviderKind::Ollama => Some(kind.default_base_url().to_string()),
            _ => None,
        },
        temperature: DEFAULT_TEMPERATURE,
        max_tokens: Some(DEFAULT_MAX_TOKENS),
        additional_params: HashMap::new(),
        timeout_secs: None,
    }
}

/// Built-in defaults for every provider.
pub fn builtin_configs() -> HashMap<ProviderKind, ModelConfig> {
    ProviderKind::all()
        .into_iter()
        .map(|kind| (kind, builtin_config(kind)))
        .collect()
}
