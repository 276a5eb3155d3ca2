//! Conversation transcript owned by one provider adapter.
//!
//! Entries are stored as `"User: ..."` / `"Assistant: ..."` strings and are
//! only ever appended in pairs.

use tracing::warn;

use tabula_llm::ChatMessage;

const USER_PREFIX: &str = "User: ";
const ASSISTANT_PREFIX: &str = "Assistant: ";

/// Default size of the recent-context window.
pub const DEFAULT_CONTEXT_LIMIT: usize = 20;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationHistory {
    entries: Vec<String>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a history from stored entries, e.g. a saved transcript.
    pub fn from_entries(entries: Vec<String>) -> Self {
        Self { entries }
    }

    /// Append one exchange.
    pub fn record(&mut self, user: &str, assistant: &str) {
        self.entries.push(format!("{USER_PREFIX}{user}"));
        self.entries.push(format!("{ASSISTANT_PREFIX}{assistant}"));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The last `limit` entries joined by newlines; empty when there is no history.
    pub fn recent_context(&self, limit: usize) -> String {
        let start = self.entries.len().saturating_sub(limit);
        self.entries[start..].join("\n")
    }

    /// Replay at most the last `limit` entries as alternating user/assistant
    /// messages, rounded down to whole exchanges so the window always opens
    /// on a user turn. A trailing unpaired entry is dropped.
    pub fn replay_recent(&self, limit: usize) -> Vec<ChatMessage> {
        let paired = self.entries.len() - self.entries.len() % 2;
        if paired < self.entries.len() {
            warn!(
                entries = self.entries.len(),
                "conversation history has an unpaired trailing entry; ignoring it"
            );
        }
        let window = limit.min(paired) & !1;
        self.entries[paired - window..paired]
            .chunks_exact(2)
            .flat_map(|pair| {
                [
                    ChatMessage::user(strip(&pair[0], USER_PREFIX)),
                    ChatMessage::assistant(strip(&pair[1], ASSISTANT_PREFIX)),
                ]
            })
            .collect()
    }
}

fn strip<'a>(entry: &'a str, prefix: &str) -> &'a str {
    entry.strip_prefix(prefix).unwrap_or(entry)
}
