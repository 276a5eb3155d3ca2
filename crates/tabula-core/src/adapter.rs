//! Uniform wrapper over one backend.
//!
//! A [`ProviderAdapter`] pairs a [`Provider`] client with its own
//! [`ConversationHistory`] and lifecycle state:
//!
//! ```text
//! Uninitialized --initialize ok--> Ready --generate*--> Ready
//!       \--initialize err--> Failed (terminal)
//! ```
//!
//! History is replayed in the backend's native shape: a role-tagged
//! message list for chat-style APIs, or one framed text prompt for
//! completion-style APIs.

use tracing::{debug, info, warn};

use tabula_llm::config::PromptStyle;
use tabula_llm::{
    ChatMessage, ChatRequest, ModelConfig, Provider, ProviderError, ProviderKind, build_provider,
};

use crate::history::{ConversationHistory, DEFAULT_CONTEXT_LIMIT};

/// System message sent ahead of chat-style conversations.
pub const CHAT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    Uninitialized,
    Ready,
    Failed,
}

pub struct ProviderAdapter {
    config: ModelConfig,
    provider: Box<dyn Provider>,
    state: AdapterState,
    history: ConversationHistory,
    context_limit: usize,
}

impl ProviderAdapter {
    /// Build the client for `config.provider`. Call [`initialize`](Self::initialize) next.
    pub fn new(config: ModelConfig) -> Result<Self, ProviderError> {
        let provider = build_provider(&config)?;
        Ok(Self::with_provider(config, provider))
    }

    /// Wrap an existing client, e.g. a test double.
    pub fn with_provider(config: ModelConfig, provider: Box<dyn Provider>) -> Self {
        Self {
            config,
            provider,
            state: AdapterState::Uninitialized,
            history: ConversationHistory::new(),
            context_limit: DEFAULT_CONTEXT_LIMIT,
        }
    }

    /// Number of recent history entries sent with each request.
    pub fn with_context_limit(mut self, limit: usize) -> Self {
        self.context_limit = limit;
        self
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn kind(&self) -> ProviderKind {
        self.config.provider
    }

    pub fn state(&self) -> AdapterState {
        self.state
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Validate credentials or connectivity. Safe to call repeatedly;
    /// after a failure the adapter stays `Failed`.
    pub async fn initialize(&mut self) -> Result<(), ProviderError> {
        match self.state {
            AdapterState::Ready => Ok(()),
            AdapterState::Failed => Err(ProviderError::NotReady(format!(
                "{} failed to initialize earlier",
                self.kind().display_name()
            ))),
            AdapterState::Uninitialized => match self.provider.initialize().await {
                Ok(()) => {
                    self.state = AdapterState::Ready;
                    info!(
                        provider = %self.kind(),
                        model = %self.config.model_name,
                        "provider ready"
                    );
                    Ok(())
                }
                Err(e) => {
                    self.state = AdapterState::Failed;
                    warn!(provider = %self.kind(), error = %e, "provider initialization failed");
                    Err(e)
                }
            },
        }
    }

    /// Build the backend request for `prompt`, replaying history in the
    /// provider's native shape.
    pub fn build_request(&self, prompt: &str) -> ChatRequest {
        let messages = match self.kind().prompt_style() {
            PromptStyle::Chat => {
                let mut messages = vec![ChatMessage::system(CHAT_SYSTEM_PROMPT)];
                messages.extend(self.history.replay_recent(self.context_limit));
                messages.push(ChatMessage::user(prompt));
                messages
            }
            PromptStyle::Completion => {
                vec![ChatMessage::user(frame_with_history(
                    &self.history.recent_context(self.context_limit),
                    prompt,
                ))]
            }
        };
        ChatRequest::from_config(&self.config, messages)
    }

    /// Send `prompt` and record `(user_input, reply)` on success.
    ///
    /// `user_input` is what lands in history; `prompt` is what the backend sees.
    pub async fn try_generate_for(
        &mut self,
        user_input: &str,
        prompt: &str,
    ) -> Result<String, ProviderError> {
        if self.state != AdapterState::Ready {
            return Err(ProviderError::NotReady(format!(
                "{} adapter is {:?}",
                self.kind().display_name(),
                self.state
            )));
        }

        let request = self.build_request(prompt);
        let completion = self.provider.complete(&request).await?;
        self.history.record(user_input, &completion.text);

        debug!(
            provider = %self.kind(),
            history = self.history.len(),
            "response recorded"
        );
        Ok(completion.text)
    }

    /// Fail-soft generation: any error becomes an apology embedding it.
    pub async fn generate(&mut self, prompt: &str) -> String {
        self.generate_for(prompt, prompt).await
    }

    /// Fail-soft variant of [`try_generate_for`](Self::try_generate_for).
    pub async fn generate_for(&mut self, user_input: &str, prompt: &str) -> String {
        match self.try_generate_for(user_input, prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(provider = %self.kind(), error = %e, "generation failed");
                generation_apology(self.kind(), &e)
            }
        }
    }
}

impl std::fmt::Debug for ProviderAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderAdapter")
            .field("provider", &self.kind())
            .field("model", &self.config.model_name)
            .field("state", &self.state)
            .field("history", &self.history.len())
            .finish()
    }
}

/// Fold prior turns into a single completion-style prompt.
pub fn frame_with_history(context: &str, prompt: &str) -> String {
    if context.is_empty() {
        prompt.to_string()
    } else {
        format!(
            "Previous conversation:\n{context}\n\nCurrent user input: {prompt}\n\nPlease respond naturally and helpfully:"
        )
    }
}

/// User-facing text for a failed generation.
pub fn generation_apology(kind: ProviderKind, err: &ProviderError) -> String {
    format!(
        "I'm sorry, I encountered an error: Error with {}: {err}",
        kind.display_name()
    )
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use tabula_llm::config::builtin_config;
    use tabula_llm::{Completion, Result as LlmResult};

    use super::*;

    /// Scripted backend that records every request it receives.
    struct ScriptedProvider {
        kind: ProviderKind,
        init_ok: bool,
        reply: Option<String>,
        seen: Arc<Mutex<Vec<ChatRequest>>>,
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            self.kind.as_str()
        }

        fn kind(&self) -> ProviderKind {
            self.kind
        }

        async fn initialize(&self) -> LlmResult<()> {
            if self.init_ok {
                Ok(())
            } else {
                Err(ProviderError::NotConfigured("no key".into()))
            }
        }

        async fn complete(&self, request: &ChatRequest) -> LlmResult<Completion> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.reply {
                Some(text) => Ok(Completion {
                    text: text.clone(),
                    model: request.model.clone(),
                    usage: None,
                }),
                None => Err(ProviderError::RequestFailed("connection reset".into())),
            }
        }
    }

    fn adapter(
        kind: ProviderKind,
        init_ok: bool,
        reply: Option<&str>,
    ) -> (ProviderAdapter, Arc<Mutex<Vec<ChatRequest>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let provider = ScriptedProvider {
            kind,
            init_ok,
            reply: reply.map(String::from),
            seen: seen.clone(),
        };
        (
            ProviderAdapter::with_provider(builtin_config(kind), Box::new(provider)),
            seen,
        )
    }

    #[tokio::test]
    async fn initialize_transitions_to_ready_and_is_idempotent() {
        let (mut a, _) = adapter(ProviderKind::Gemini, true, Some("ok"));
        assert_eq!(a.state(), AdapterState::Uninitialized);
        a.initialize().await.unwrap();
        a.initialize().await.unwrap();
        assert_eq!(a.state(), AdapterState::Ready);
    }

    #[tokio::test]
    async fn failed_initialize_is_terminal() {
        let (mut a, seen) = adapter(ProviderKind::Anthropic, false, Some("ok"));
        assert!(matches!(
            a.initialize().await,
            Err(ProviderError::NotConfigured(_))
        ));
        assert_eq!(a.state(), AdapterState::Failed);
        assert!(matches!(a.initialize().await, Err(ProviderError::NotReady(_))));

        let reply = a.generate("hello").await;
        assert!(reply.starts_with("I'm sorry, I encountered an error: Error with Anthropic"));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn generate_before_initialize_is_not_ready() {
        let (mut a, _) = adapter(ProviderKind::OpenAi, true, Some("ok"));
        let err = a.try_generate_for("q", "q").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotReady(_)));
    }

    #[tokio::test]
    async fn success_records_user_input_not_prompt() {
        let (mut a, _) = adapter(ProviderKind::Ollama, true, Some("42 rows"));
        a.initialize().await.unwrap();
        let reply = a.generate_for("how many rows?", "<composed prompt>").await;
        assert_eq!(reply, "42 rows");
        assert_eq!(
            a.history().entries(),
            ["User: how many rows?", "Assistant: 42 rows"]
        );
    }

    #[tokio::test]
    async fn failure_is_fail_soft_and_leaves_history_alone() {
        let (mut a, _) = adapter(ProviderKind::Gemini, true, None);
        a.initialize().await.unwrap();
        let reply = a.generate("q").await;
        assert_eq!(
            reply,
            "I'm sorry, I encountered an error: Error with Gemini: request failed: connection reset"
        );
        assert!(a.history().is_empty());
    }

    #[tokio::test]
    async fn chat_style_replays_pairs_as_messages() {
        let (mut a, seen) = adapter(ProviderKind::OpenAi, true, Some("r"));
        a.initialize().await.unwrap();
        a.generate_for("first", "P1").await;
        a.generate_for("second", "P2").await;

        let requests = seen.lock().unwrap();
        let last = &requests[1];
        let roles: Vec<&str> = last.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, ["system", "user", "assistant", "user"]);
        assert_eq!(last.messages[0].content, CHAT_SYSTEM_PROMPT);
        assert_eq!(last.messages[1].content, "first");
        assert_eq!(last.messages[3].content, "P2");
    }

    #[tokio::test]
    async fn completion_style_frames_history() {
        let (mut a, seen) = adapter(ProviderKind::Anthropic, true, Some("r1"));
        a.initialize().await.unwrap();
        a.generate_for("first", "P1").await;
        a.generate_for("second", "P2").await;

        let requests = seen.lock().unwrap();
        assert_eq!(requests[0].messages.len(), 1);
        assert_eq!(requests[0].messages[0].content, "P1");
        assert_eq!(
            requests[1].messages[0].content,
            "Previous conversation:\nUser: first\nAssistant: r1\n\nCurrent user input: P2\n\nPlease respond naturally and helpfully:"
        );
    }

    #[tokio::test]
    async fn context_limit_bounds_framed_history() {
        let (a, _) = adapter(ProviderKind::Ollama, true, Some("r"));
        let mut a = a.with_context_limit(2);
        a.initialize().await.unwrap();
        for i in 0..3 {
            a.generate_for(&format!("q{i}"), "p").await;
        }
        let req = a.build_request("next");
        let text = &req.messages[0].content;
        assert!(text.contains("User: q2\nAssistant: r"));
        assert!(!text.contains("q1"));
    }

    #[tokio::test]
    async fn context_limit_bounds_chat_replay() {
        let (a, _) = adapter(ProviderKind::OpenAi, true, Some("r"));
        let mut a = a.with_context_limit(20);
        a.initialize().await.unwrap();
        for i in 0..100 {
            a.generate_for(&format!("q{i}"), "p").await;
        }
        assert_eq!(a.history().len(), 200);

        let req = a.build_request("next");
        // system + ten exchanges + the new prompt
        assert_eq!(req.messages.len(), 22);
        assert_eq!(req.messages[1].role, "user");
        assert_eq!(req.messages[1].content, "q90");
        assert_eq!(req.messages[21].content, "next");
    }

    #[test]
    fn build_request_uses_config_sampling() {
        let (a, _) = adapter(ProviderKind::Gemini, true, None);
        let req = a.build_request("x");
        assert_eq!(req.model, "gemini-pro");
        assert_eq!(req.temperature, 0.7);
        assert_eq!(req.max_tokens, Some(2048));
    }

    #[test]
    fn frame_without_history_is_prompt() {
        assert_eq!(frame_with_history("", "just this"), "just this");
    }
}
