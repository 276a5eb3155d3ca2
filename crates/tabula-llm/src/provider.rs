//! The core [`Provider`] trait and the factory that picks a client per backend.

use async_trait::async_trait;

use crate::anthropic::AnthropicProvider;
use crate::config::{ModelConfig, ProviderKind};
use crate::error::Result;
use crate::gemini::GeminiProvider;
use crate::ollama::OllamaProvider;
use crate::openai::OpenAiProvider;
use crate::types::{ChatRequest, Completion};

/// A backend that can answer chat requests.
///
/// Implementations own the protocol details of one native API
/// (authentication, request shape, response parsing). They hold no
/// conversation state.
///
/// # Example
///
/// ```rust,ignore
/// use tabula_llm::{ChatMessage, ChatRequest, Provider};
///
/// async fn ask(provider: &dyn Provider, req: &ChatRequest) -> tabula_llm::Result<String> {
///     provider.initialize().await?;
///     Ok(provider.complete(req).await?.text)
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
    /// Returns the provider name (e.g. "openai", "ollama").
    fn name(&self) -> &str;

    fn kind(&self) -> ProviderKind;

    /// Check that the backend is usable: a credential is present, or the
    /// local endpoint answers. Safe to call more than once.
    ///
    /// # Errors
    ///
    /// `NotConfigured` when a required key is missing or a placeholder,
    /// `Unreachable` when a local endpoint cannot be contacted.
    async fn initialize(&self) -> Result<()>;

    /// Send one request and return the generated text.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`](crate::error::ProviderError) on transport,
    /// authentication, rate-limit, or parse failures, and when the backend
    /// produced no text.
    async fn complete(&self, request: &ChatRequest) -> Result<Completion>;
}

/// Construct the client matching `config.provider`.
///
/// This does not touch the network; call [`Provider::initialize`] next.
pub fn build_provider(config: &ModelConfig) -> Result<Box<dyn Provider>> {
    let provider: Box<dyn Provider> = match config.provider {
        ProviderKind::OpenAi => Box::new(OpenAiProvider::new(config)?),
        ProviderKind::Anthropic => Box::new(AnthropicProvider::new(config)?),
        ProviderKind::Gemini => Box::new(GeminiProvider::new(config)?),
        ProviderKind::Ollama => Box::new(OllamaProvider::new(config)?),
    };
    Ok(provider)
}
