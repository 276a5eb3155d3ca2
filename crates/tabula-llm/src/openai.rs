//! OpenAI chat-completions client.
//!
//! Sends the role-tagged message list as-is to `{base}/chat/completions`
//! and reads the first choice back.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::{ModelConfig, ProviderKind};
use crate::error::{ProviderError, Result};
use crate::http;
use crate::provider::Provider;
use crate::secret::SecretString;
use crate::types::{ChatRequest, Completion, Usage};

pub struct OpenAiProvider {
    base_url: String,
    http: reqwest::Client,
    api_key: Option<SecretString>,
}

impl OpenAiProvider {
    /// Build a client from `config`. The API key is resolved here
    /// (config value, then `OPENAI_API_KEY`).
    pub fn new(config: &ModelConfig) -> Result<Self> {
        Ok(Self {
            base_url: config.endpoint(),
            http: http::build_client(config.timeout())?,
            api_key: config.resolve_api_key(),
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn api_key(&self) -> Result<&SecretString> {
        self.api_key.as_ref().ok_or_else(|| {
            ProviderError::NotConfigured(
                "OpenAI API key is required (set it in config or the OPENAI_API_KEY env var)"
                    .into(),
            )
        })
    }

    fn request_body(request: &ChatRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": request.messages,
            "temperature": request.temperature,
        });
        if let Some(max) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max);
        }
        http::merge_extra(&mut body, &request.extra);
        body
    }
}

#[derive(Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn initialize(&self) -> Result<()> {
        self.api_key().map(|_| ())
    }

    async fn complete(&self, request: &ChatRequest) -> Result<Completion> {
        let api_key = self.api_key()?;

        debug!(
            provider = "openai",
            model = %request.model,
            messages = request.messages.len(),
            "sending chat completion request"
        );

        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(api_key.expose())
            .json(&Self::request_body(request))
            .send()
            .await
            .map_err(http::send_error)?;
        let response = http::check_status(self.name(), &request.model, response).await?;
        let parsed: ChatCompletion = http::decode_json(response).await?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ProviderError::EmptyResponse(self.name().into()))?;

        debug!(provider = "openai", chars = text.len(), "chat completion received");

        Ok(Completion {
            text,
            model: parsed.model.unwrap_or_else(|| request.model.clone()),
            usage: parsed.usage.map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            }),
        })
    }
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}
