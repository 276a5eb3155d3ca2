//! Google Gemini `generateContent` client.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ModelConfig, ProviderKind};
use crate::error::{ProviderError, Result};
use crate::http;
use crate::provider::Provider;
use crate::secret::SecretString;
use crate::types::{ChatRequest, Completion, Usage};

pub struct GeminiProvider {
    base_url: String,
    http: reqwest::Client,
    api_key: Option<SecretString>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(flatten)]
    extra: HashMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

impl GeminiProvider {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        Ok(Self {
            base_url: config.endpoint(),
            http: http::build_client(config.timeout())?,
            api_key: config.resolve_api_key(),
        })
    }

    fn generate_url(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }

    fn api_key(&self) -> Result<&SecretString> {
        self.api_key.as_ref().ok_or_else(|| {
            ProviderError::NotConfigured(
                "Gemini API key is required (set it in config or the GEMINI_API_KEY env var)"
                    .into(),
            )
        })
    }

    fn request_body(request: &ChatRequest) -> GenerateRequest {
        let contents = request
            .dialogue()
            .map(|m| Content {
                // Gemini calls the assistant side "model".
                role: Some(if m.role == "assistant" { "model" } else { "user" }.into()),
                parts: vec![Part {
                    text: m.content.clone(),
                }],
            })
            .collect();
        let system_instruction = request.system_prompt().map(|s| Content {
            role: None,
            parts: vec![Part { text: s.into() }],
        });
        GenerateRequest {
            contents,
            system_instruction,
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
                extra: request.extra.clone(),
            },
        }
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn initialize(&self) -> Result<()> {
        self.api_key().map(|_| ())
    }

    async fn complete(&self, request: &ChatRequest) -> Result<Completion> {
        let api_key = self.api_key()?;

        debug!(
            provider = "gemini",
            model = %request.model,
            messages = request.messages.len(),
            "sending generateContent request"
        );

        let response = self
            .http
            .post(self.generate_url(&request.model))
            .header("x-goog-api-key", api_key.expose())
            .json(&Self::request_body(request))
            .send()
            .await
            .map_err(http::send_error)?;
        let response = http::check_status(self.name(), &request.model, response).await?;
        let parsed: GenerateResponse = http::decode_json(response).await?;

        let text: String = parsed
            .candidates
            .first()
            .map(|c| c.content.parts.iter().map(|p| p.text.as_str()).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse(self.name().into()));
        }

        Ok(Completion {
            text,
            model: parsed.model_version.unwrap_or_else(|| request.model.clone()),
            usage: parsed.usage_metadata.map(|u| Usage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
            }),
        })
    }
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}
