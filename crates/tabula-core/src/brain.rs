//! The orchestrator.
//!
//! [`Brain`] ties the pipeline together: classify, compose, generate,
//! record. It owns the active adapter and the registry used to replace it,
//! and borrows dataset state through a [`DatasetContextProvider`].
//!
//! `think` and `switch_model` never return errors; failures come back as
//! user-facing text. Mutating operations take `&mut self`, so a shared
//! `Brain` must sit behind a mutex.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use tabula_llm::{ProviderError, ProviderKind, SecretString};

use crate::adapter::{ProviderAdapter, generation_apology};
use crate::composer::compose;
use crate::dataset::DatasetContextProvider;
use crate::error::BrainError;
use crate::guardrail::{RelevanceClassifier, RelevanceDecision, suggest_questions};
use crate::registry::{ProviderListing, ProviderRegistry};

/// Reply used when `think` fails for reasons other than the backend call.
pub const GENERIC_APOLOGY: &str =
    "I'm sorry, I encountered an error while processing your request. Please try again.";

/// Snapshot of the active model settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub provider: ProviderKind,
    pub model_name: String,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
}

enum ThinkError {
    Internal(BrainError),
    Generation(ProviderError),
}

impl From<BrainError> for ThinkError {
    fn from(e: BrainError) -> Self {
        ThinkError::Internal(e)
    }
}

impl From<ProviderError> for ThinkError {
    fn from(e: ProviderError) -> Self {
        ThinkError::Generation(e)
    }
}

pub struct Brain<D: DatasetContextProvider> {
    registry: ProviderRegistry,
    adapter: ProviderAdapter,
    classifier: RelevanceClassifier,
    datasets: D,
    rng: StdRng,
}

impl<D: DatasetContextProvider> Brain<D> {
    /// Start with `active` as the serving provider.
    ///
    /// # Errors
    ///
    /// Fails when the provider cannot initialize (missing key, unreachable
    /// local server).
    pub async fn new(
        registry: ProviderRegistry,
        active: ProviderKind,
        datasets: D,
    ) -> Result<Self, ProviderError> {
        let adapter = registry.create_kind(active).await?;
        Ok(Self::with_adapter(registry, adapter, datasets))
    }

    /// Start with an already initialized adapter.
    pub fn with_adapter(registry: ProviderRegistry, adapter: ProviderAdapter, datasets: D) -> Self {
        Self {
            registry,
            adapter,
            classifier: RelevanceClassifier::new(),
            datasets,
            rng: StdRng::from_entropy(),
        }
    }

    /// Fix the redirect-message random source.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Answer one user message.
    ///
    /// Off-topic messages get a canned redirect without touching the
    /// backend or the history. Backend failures come back as an apology
    /// embedding the error; anything else as [`GENERIC_APOLOGY`].
    pub async fn think(&mut self, text: &str) -> String {
        match self.respond(text).await {
            Ok(reply) => reply,
            Err(ThinkError::Generation(e)) => {
                warn!(provider = %self.adapter.kind(), error = %e, "generation failed");
                generation_apology(self.adapter.kind(), &e)
            }
            Err(ThinkError::Internal(e)) => {
                error!(
                    provider = %self.adapter.kind(),
                    error = %e,
                    "failed to process message"
                );
                GENERIC_APOLOGY.to_string()
            }
        }
    }

    async fn respond(&mut self, text: &str) -> Result<String, ThinkError> {
        let context = self.datasets.context().map_err(BrainError::from)?;

        let decision = self
            .classifier
            .classify(text, context.is_some(), &mut self.rng);
        if let RelevanceDecision::Redirect { reason, message } = decision {
            debug!(?reason, "message redirected");
            return Ok(message.to_string());
        }

        let prompt = compose(text, context.as_ref());
        Ok(self.adapter.try_generate_for(text, &prompt).await?)
    }

    /// Switch the serving provider by id and report the outcome as text.
    pub async fn switch_model(&mut self, provider_id: &str) -> String {
        let kind = match provider_id.parse::<ProviderKind>() {
            Ok(kind) => kind,
            Err(e) => return format!("Failed to switch to {}: {e}", provider_id.trim()),
        };
        match self.switch_to(kind).await {
            Ok(info) => format!("Switched to {kind} model: {}", info.model_name),
            Err(e) => format!("Failed to switch to {kind}: {e}"),
        }
    }

    /// Replace the active adapter with a fresh one for `kind`.
    ///
    /// The new adapter starts with empty history. On failure the current
    /// adapter stays active and untouched.
    pub async fn switch_to(&mut self, kind: ProviderKind) -> Result<ModelInfo, ProviderError> {
        let adapter = self.registry.create_kind(kind).await.inspect_err(|e| {
            warn!(provider = %kind, error = %e, "switch failed; keeping current provider");
        })?;
        let previous = self.adapter.kind();
        self.adapter = adapter;
        info!(from = %previous, to = %kind, "switched provider");
        Ok(self.get_current_model_info())
    }

    pub fn get_current_model_info(&self) -> ModelInfo {
        let cfg = self.adapter.config();
        ModelInfo {
            provider: cfg.provider,
            model_name: cfg.model_name.clone(),
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
        }
    }

    pub fn active_provider(&self) -> ProviderKind {
        self.adapter.kind()
    }

    pub fn clear_history(&mut self) {
        self.adapter.clear_history();
    }

    pub fn get_history(&self) -> Vec<String> {
        self.adapter.history().entries().to_vec()
    }

    /// Store a new key for `kind`; used the next time that provider is built.
    pub fn update_api_key(&mut self, kind: ProviderKind, key: impl Into<SecretString>) {
        self.registry.update_api_key(kind, key);
    }

    pub fn list_models(&self) -> Vec<ProviderListing> {
        self.registry.listings(self.active_provider())
    }

    /// Suggested questions for the active dataset.
    pub fn suggestions(&self) -> Vec<String> {
        match self.datasets.context() {
            Ok(ctx) => suggest_questions(ctx.as_ref()),
            Err(e) => {
                warn!(error = %e, "dataset context unavailable for suggestions");
                suggest_questions(None)
            }
        }
    }

    pub fn datasets(&self) -> &D {
        &self.datasets
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }
}
