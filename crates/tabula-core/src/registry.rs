//! Provider registry: one configuration per backend, and adapter construction.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use tabula_llm::config::builtin_configs;
use tabula_llm::{ModelConfig, ProviderError, ProviderKind, SecretString};

use crate::adapter::ProviderAdapter;
use crate::history::DEFAULT_CONTEXT_LIMIT;

/// One row of the provider overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderListing {
    pub provider: ProviderKind,
    pub model_name: String,
    pub has_credentials: bool,
    pub active: bool,
}

/// Holds exactly one [`ModelConfig`] per supported provider.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    configs: HashMap<ProviderKind, ModelConfig>,
    context_limit: usize,
}

impl ProviderRegistry {
    /// Registry seeded with the built-in defaults.
    pub fn new() -> Self {
        Self::from_configs(Vec::new())
    }

    /// Registry from explicit configurations; providers not listed keep
    /// their built-in defaults. A later entry for the same provider wins.
    pub fn from_configs(configs: impl IntoIterator<Item = ModelConfig>) -> Self {
        let mut map = builtin_configs();
        for cfg in configs {
            map.insert(cfg.provider, cfg);
        }
        Self {
            configs: map,
            context_limit: DEFAULT_CONTEXT_LIMIT,
        }
    }

    /// History window handed to every adapter this registry builds.
    pub fn with_context_limit(mut self, limit: usize) -> Self {
        self.context_limit = limit;
        self
    }

    pub fn supported_providers() -> [ProviderKind; 4] {
        ProviderKind::all()
    }

    pub fn config(&self, kind: ProviderKind) -> &ModelConfig {
        &self.configs[&kind]
    }

    /// Change the API key for one provider. Takes effect the next time an
    /// adapter is built for it.
    pub fn update_api_key(&mut self, kind: ProviderKind, key: impl Into<SecretString>) {
        if let Some(cfg) = self.configs.get_mut(&kind) {
            cfg.api_key = Some(key.into());
            info!(provider = %kind, "api key updated");
        }
    }

    /// Build and initialize an adapter for `config`.
    ///
    /// # Errors
    ///
    /// Propagates the adapter's initialization failure (`NotConfigured`,
    /// `Unreachable`).
    pub async fn create(&self, config: ModelConfig) -> Result<ProviderAdapter, ProviderError> {
        let mut adapter = self.build(config)?;
        adapter.initialize().await?;
        Ok(adapter)
    }

    /// Construct an uninitialized adapter. Credentials are resolved here.
    pub fn build(&self, config: ModelConfig) -> Result<ProviderAdapter, ProviderError> {
        debug!(provider = %config.provider, model = %config.model_name, "creating adapter");
        Ok(ProviderAdapter::new(config)?.with_context_limit(self.context_limit))
    }

    /// Build and initialize an adapter from the stored configuration.
    pub async fn create_kind(&self, kind: ProviderKind) -> Result<ProviderAdapter, ProviderError> {
        self.create(self.config(kind).clone()).await
    }

    /// Like [`create_kind`](Self::create_kind) but from a provider id string.
    ///
    /// # Errors
    ///
    /// `UnsupportedProvider` when `id` names no known backend.
    pub async fn create_by_id(&self, id: &str) -> Result<ProviderAdapter, ProviderError> {
        let kind: ProviderKind = id.parse()?;
        self.create_kind(kind).await
    }

    /// Overview of every provider, in display order.
    pub fn listings(&self, active: ProviderKind) -> Vec<ProviderListing> {
        ProviderKind::all()
            .into_iter()
            .map(|kind| {
                let cfg = self.config(kind);
                ProviderListing {
                    provider: kind,
                    model_name: cfg.model_name.clone(),
                    has_credentials: cfg.has_credentials(),
                    active: kind == active,
                }
            })
            .collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
