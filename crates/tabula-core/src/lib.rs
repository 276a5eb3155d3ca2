//! Guardrail core for tabula.
//!
//! Keeps a chat assistant focused on the tabular dataset the user loaded,
//! while routing the conversation to one of several LLM backends.
//!
//! # Pipeline
//!
//! ```text
//! Brain::think(text)
//!   -> RelevanceClassifier::classify   (may short-circuit with a redirect)
//!   -> composer::compose               (dataset context + guidelines)
//!   -> ProviderAdapter::try_generate_for (backend call)
//!   -> ConversationHistory::record
//! ```
//!
//! # Modules
//!
//! - [`history`]: conversation transcript per adapter
//! - [`dataset`]: the dataset collaborator interface and an in-memory implementation
//! - [`guardrail`]: relevance classifier, suggestions, data-command detection
//! - [`composer`]: final prompt assembly
//! - [`adapter`]: uniform wrapper over one backend plus its history
//! - [`registry`]: per-provider configuration and adapter construction
//! - [`brain`]: the orchestrator
//! - [`config`]: application configuration and discovery

pub mod adapter;
pub mod brain;
pub mod composer;
pub mod config;
pub mod dataset;
pub mod error;
pub mod guardrail;
pub mod history;
pub mod registry;

pub use adapter::{AdapterState, ProviderAdapter};
pub use brain::{Brain, ModelInfo};
pub use config::AppConfig;
pub use dataset::{DatasetContext, DatasetContextProvider, DatasetSchema, InMemoryDatasets};
pub use error::{BrainError, ConfigError, DatasetError};
pub use guardrail::{RelevanceClassifier, RelevanceDecision};
pub use history::ConversationHistory;
pub use registry::{ProviderListing, ProviderRegistry};
