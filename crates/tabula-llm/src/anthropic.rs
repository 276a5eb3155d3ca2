//! Anthropic Messages API client.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::{ModelConfig, ProviderKind};
use crate::error::{ProviderError, Result};
use crate::http;
use crate::provider::Provider;
use crate::secret::SecretString;
use crate::types::{ChatMessage, ChatRequest, Completion, Usage};

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// `max_tokens` is mandatory on this API; used when the config leaves it unset.
const FALLBACK_MAX_TOKENS: u32 = 1024;

pub struct AnthropicProvider {
    base_url: String,
    http: reqwest::Client,
    api_key: Option<SecretString>,
}

impl AnthropicProvider {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        Ok(Self {
            base_url: config.endpoint(),
            http: http::build_client(config.timeout())?,
            api_key: config.resolve_api_key(),
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/messages", self.base_url)
    }

    fn api_key(&self) -> Result<&SecretString> {
        self.api_key.as_ref().ok_or_else(|| {
            ProviderError::NotConfigured(
                "Anthropic API key is required (set it in config or the ANTHROPIC_API_KEY env var)"
                    .into(),
            )
        })
    }

    fn request_body(request: &ChatRequest) -> serde_json::Value {
        let messages: Vec<&ChatMessage> = request.dialogue().collect();
        let mut body = serde_json::json!({
            "model": request.model,
            "max_tokens": request.max_tokens.unwrap_or(FALLBACK_MAX_TOKENS),
            "temperature": request.temperature,
            "messages": messages,
        });
        if let Some(system) = request.system_prompt() {
            body["system"] = serde_json::json!(system);
        }
        http::merge_extra(&mut body, &request.extra);
        body
    }
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    async fn initialize(&self) -> Result<()> {
        self.api_key().map(|_| ())
    }

    async fn complete(&self, request: &ChatRequest) -> Result<Completion> {
        let api_key = self.api_key()?;

        debug!(
            provider = "anthropic",
            model = %request.model,
            messages = request.messages.len(),
            "sending messages request"
        );

        let response = self
            .http
            .post(self.messages_url())
            .header("x-api-key", api_key.expose())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&Self::request_body(request))
            .send()
            .await
            .map_err(http::send_error)?;
        let response = http::check_status(self.name(), &request.model, response).await?;
        let parsed: MessagesResponse = http::decode_json(response).await?;

        let text: String = parsed
            .content
            .iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse(self.name().into()));
        }

        Ok(Completion {
            text,
            model: parsed.model.unwrap_or_else(|| request.model.clone()),
            usage: parsed.usage,
        })
    }
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}
