//! Request and response types shared by every backend client.
//!
//! A [`ChatRequest`] is provider-neutral: each client translates it into
//! its native wire format and reduces the reply to a [`Completion`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;

/// A message in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// The role of the message author ("system", "user" or "assistant").
    pub role: String,

    /// The content of the message.
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

/// A provider-neutral generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: f64,
    /// Provider-specific parameters merged into the native request body.
    pub extra: HashMap<String, serde_json::Value>,
}

impl ChatRequest {
    /// Build a request carrying the sampling settings of `config`.
    pub fn from_config(config: &ModelConfig, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: config.model_name.clone(),
            messages,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            extra: config.additional_params.clone(),
        }
    }

    /// The system message, if any.
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == "system")
            .map(|m| m.content.as_str())
    }

    /// All messages except system ones, in order.
    pub fn dialogue(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(|m| m.role != "system")
    }

    /// Flatten the dialogue into a single prompt for single-text endpoints.
    ///
    /// A lone user message is returned as-is.
    pub fn flattened_prompt(&self) -> String {
        let turns: Vec<&ChatMessage> = self.dialogue().collect();
        if let [only] = turns.as_slice() {
            return only.content.clone();
        }
        turns
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Token usage reported by a backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// The text a backend produced for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    /// Model name as reported by the backend (falls back to the requested one).
    pub model: String,
    pub usage: Option<Usage>,
}
