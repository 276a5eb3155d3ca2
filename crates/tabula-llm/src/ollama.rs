//! Ollama client for locally hosted models.
//!
//! Ollama needs no credential; `initialize` instead checks that the server
//! answers on `/api/tags`. Generation goes through the non-streaming
//! `/api/generate` endpoint with a single text prompt.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{ModelConfig, ProviderKind};
use crate::error::{ProviderError, Result};
use crate::http;
use crate::provider::Provider;
use crate::types::{ChatRequest, Completion, Usage};

/// Timeout for the connectivity probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub struct OllamaProvider {
    base_url: String,
    http: reqwest::Client,
    probe: reqwest::Client,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

impl OllamaProvider {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        Ok(Self {
            base_url: config.endpoint(),
            http: http::build_client(config.timeout())?,
            probe: http::build_client(PROBE_TIMEOUT)?,
        })
    }

    fn request_body(request: &ChatRequest) -> serde_json::Value {
        let mut options = serde_json::json!({ "temperature": request.temperature });
        if let Some(max) = request.max_tokens {
            options["num_predict"] = serde_json::json!(max);
        }
        http::merge_extra(&mut options, &request.extra);

        let mut body = serde_json::json!({
            "model": request.model,
            "prompt": request.flattened_prompt(),
            "stream": false,
            "options": options,
        });
        if let Some(system) = request.system_prompt() {
            body["system"] = serde_json::json!(system);
        }
        body
    }

    fn unreachable(&self, reason: impl Into<String>) -> ProviderError {
        ProviderError::Unreachable {
            endpoint: self.base_url.clone(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    async fn initialize(&self) -> Result<()> {
        let url = format!("{}/api/tags", self.base_url);
        debug!(provider = "ollama", url = %url, "probing server");

        let response = self.probe.get(&url).send().await.map_err(|e| {
            warn!(provider = "ollama", error = %e, "probe failed");
            self.unreachable(e.to_string())
        })?;

        if response.status().as_u16() != 200 {
            return Err(self.unreachable(format!(
                "server returned status {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn complete(&self, request: &ChatRequest) -> Result<Completion> {
        debug!(
            provider = "ollama",
            model = %request.model,
            messages = request.messages.len(),
            "sending generate request"
        );

        let response = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .json(&Self::request_body(request))
            .send()
            .await
            .map_err(http::send_error)?;
        let response = http::check_status(self.name(), &request.model, response).await?;
        let parsed: GenerateResponse = http::decode_json(response).await?;

        let text = parsed
            .response
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ProviderError::EmptyResponse(self.name().into()))?;

        let usage = match (parsed.prompt_eval_count, parsed.eval_count) {
            (None, None) => None,
            (i, o) => Some(Usage {
                input_tokens: i.unwrap_or(0),
                output_tokens: o.unwrap_or(0),
            }),
        };

        Ok(Completion {
            text,
            model: parsed.model.unwrap_or_else(|| request.model.clone()),
            usage,
        })
    }
}
