//! Backend chat clients for tabula.
//!
//! This crate knows how to talk to each supported LLM backend over HTTP.
//! It holds no conversation state; history, prompt framing and fail-soft
//! behaviour live in `tabula-core`.
//!
//! # Architecture
//!
//! - [`ProviderKind`] is the closed set of supported backends
//! - [`ModelConfig`] describes how to reach one backend (model, key, endpoint)
//! - [`Provider`] trait defines `initialize` + `complete`
//! - [`OpenAiProvider`], [`AnthropicProvider`], [`GeminiProvider`] and
//!   [`OllamaProvider`] implement it for each native API
//! - [`build_provider`] picks the concrete client for a config
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use tabula_llm::{build_provider, config, ChatMessage, ChatRequest, ProviderKind};
//!
//! let cfg = config::builtin_config(ProviderKind::OpenAi);
//! let provider = build_provider(&cfg)?;
//! provider.initialize().await?;
//!
//! let request = ChatRequest::from_config(&cfg, vec![ChatMessage::user("What is a median?")]);
//! let completion = provider.complete(&request).await?;
//! println!("{}", completion.text);
//! ```

pub mod anthropic;
pub mod config;
pub mod error;
pub mod gemini;
mod http;
pub mod ollama;
pub mod openai;
pub mod provider;
pub mod secret;
pub mod types;

pub use anthropic::AnthropicProvider;
pub use config::{ModelConfig, ProviderKind};
pub use error::{ProviderError, Result};
pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use provider::{Provider, build_provider};
pub use secret::SecretString;
pub use types::{ChatMessage, ChatRequest, Completion, Usage};
