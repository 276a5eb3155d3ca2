//! Relevance classifier (keyword + pattern rules).
//!
//! Decides whether a raw user message belongs to a data-analysis
//! conversation. Rules are checked in order and the first match wins:
//!
//! 1. Nothing loaded and no bootstrap keyword: redirect with a
//!    "no data loaded" message.
//! 2. Any off-topic pattern matches: redirect.
//! 3. A data keyword is present, or a dataset is loaded: relevant.
//! 4. Otherwise: redirect.
//!
//! Keyword matching is case-insensitive substring containment; the
//! off-topic patterns are anchored on word boundaries. Redirect text is
//! drawn from fixed pools with a caller-supplied random source.

use rand::Rng;
use rand::seq::SliceRandom;
use regex::Regex;

use crate::dataset::DatasetContext;

/// Redirects used for off-topic and ambiguous messages.
pub const REDIRECT_RESPONSES: [&str; 4] = [
    "I'm here to help you analyze and understand your data files. Let's focus on the data you've loaded.",
    "I specialize in data analysis. Would you like to explore the information in your files instead?",
    "Let's keep our conversation focused on your data. What would you like to know about the loaded files?",
    "I'm designed to help with data analysis and file exploration. How can I assist you with your data?",
];

/// Redirects used when no dataset has been loaded yet.
pub const NO_DATA_RESPONSES: [&str; 3] = [
    "I don't see any data files loaded yet. Would you like to load a file from the data folder?",
    "To get started, please load a data file using the 'load' command. I can then help you analyze it.",
    "No data files are currently loaded. Use 'files' to see available files or 'load <filename>' to load one.",
];

/// Words that let a message through before any dataset is loaded.
const BOOTSTRAP_KEYWORDS: &[&str] = &["load", "file", "data"];

/// Terms that mark a message as data-related.
const DATA_KEYWORDS: &[&str] = &[
    "data",
    "column",
    "row",
    "table",
    "csv",
    "excel",
    "file",
    "analyze",
    "analysis",
    "statistics",
    "stats",
    "summary",
    "count",
    "sum",
    "average",
    "mean",
    "median",
    "max",
    "min",
    "trend",
    "pattern",
    "correlation",
    "distribution",
    "filter",
    "sort",
    "group",
    "aggregate",
    "pivot",
    "chart",
    "graph",
    "plot",
    "visualization",
    "missing",
    "null",
    "duplicate",
    "unique",
    // domain
    "sales",
    "revenue",
    "product",
    "customer",
    "region",
];

/// Off-topic pattern source: topic label, regex, and an optional word that
/// cancels the match when it appears later on the same line.
const OFF_TOPIC_PATTERNS: &[(&str, &str, Option<&str>)] = &[
    (
        "current events",
        r"\b(weather|news|politics|sports|entertainment|movies|music)\b",
        None,
    ),
    ("food", r"\b(recipe|cooking|food|restaurant)\b", None),
    ("travel", r"\b(travel|vacation|hotel|flight)\b", None),
    ("health", r"\b(health|medical|doctor|medicine)\b", None),
    (
        "programming",
        r"\b(programming|code|software|development)\b",
        Some("data"),
    ),
    ("personal", r"\b(personal|family|relationship|dating)\b", None),
    ("humor", r"\b(joke|funny|humor|meme)\b", None),
];

const DATA_COMMANDS: &[&str] = &[
    "load", "files", "describe", "summary", "head", "tail", "columns", "info", "shape", "stats",
    "analyze",
];

/// Why a message was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    NoDataLoaded,
    OffTopic(&'static str),
    Ambiguous,
}

/// Outcome of [`RelevanceClassifier::classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelevanceDecision {
    Relevant,
    Redirect {
        reason: RedirectReason,
        message: &'static str,
    },
}

impl RelevanceDecision {
    pub fn is_relevant(&self) -> bool {
        matches!(self, RelevanceDecision::Relevant)
    }

    pub fn redirect_message(&self) -> Option<&'static str> {
        match self {
            RelevanceDecision::Relevant => None,
            RelevanceDecision::Redirect { message, .. } => Some(*message),
        }
    }
}

struct OffTopicRule {
    topic: &'static str,
    regex: Regex,
    unless_followed_by: Option<&'static str>,
}

impl OffTopicRule {
    /// `text` must already be lowercased.
    fn matches(&self, text: &str) -> bool {
        self.regex.find_iter(text).any(|m| match self.unless_followed_by {
            None => true,
            Some(word) => {
                let rest_of_line = text[m.end()..].split('\n').next().unwrap_or("");
                !rest_of_line.contains(word)
            }
        })
    }
}

pub struct RelevanceClassifier {
    rules: Vec<OffTopicRule>,
}

impl RelevanceClassifier {
    pub fn new() -> Self {
        let rules = OFF_TOPIC_PATTERNS
            .iter()
            .map(|&(topic, pattern, unless)| OffTopicRule {
                topic,
                regex: Regex::new(&format!("(?i){pattern}")).expect("static off-topic pattern"),
                unless_followed_by: unless,
            })
            .collect();
        Self { rules }
    }

    /// Classify one message. Pure apart from the draw from `rng`.
    pub fn classify<R: Rng + ?Sized>(
        &self,
        text: &str,
        dataset_loaded: bool,
        rng: &mut R,
    ) -> RelevanceDecision {
        let lower = text.to_lowercase();

        if !dataset_loaded && !contains_any(&lower, BOOTSTRAP_KEYWORDS) {
            return redirect(RedirectReason::NoDataLoaded, &NO_DATA_RESPONSES, rng);
        }

        if let Some(rule) = self.rules.iter().find(|r| r.matches(&lower)) {
            return redirect(RedirectReason::OffTopic(rule.topic), &REDIRECT_RESPONSES, rng);
        }

        if dataset_loaded || contains_any(&lower, DATA_KEYWORDS) {
            return RelevanceDecision::Relevant;
        }

        redirect(RedirectReason::Ambiguous, &REDIRECT_RESPONSES, rng)
    }
}

impl Default for RelevanceClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

fn redirect<R: Rng + ?Sized>(
    reason: RedirectReason,
    pool: &[&'static str],
    rng: &mut R,
) -> RelevanceDecision {
    RelevanceDecision::Redirect {
        reason,
        message: pool.choose(rng).copied().unwrap_or(pool[0]),
    }
}

/// Suggested questions for the active dataset, at most six.
pub fn suggest_questions(context: Option<&DatasetContext>) -> Vec<String> {
    let Some(active) = context.and_then(|c| c.active.as_deref()) else {
        return vec![
            "Load a data file to get started".to_string(),
            "Use 'files' to see available data files".to_string(),
            "Try 'load sales_data.csv' to load the sample file".to_string(),
        ];
    };
    let Some(schema) = context.and_then(|c| c.schema.as_ref()) else {
        return vec!["File information not available".to_string()];
    };

    let mut suggestions = vec![
        format!("What are the main insights from {active}?"),
        "Show me a summary of the data".to_string(),
        "What columns have missing values?".to_string(),
        "Describe the data distribution".to_string(),
    ];

    if let Some(first) = schema.columns.first() {
        suggestions.push(format!("Tell me about the '{first}' column"));
    }

    let lower: Vec<String> = schema.columns.iter().map(|c| c.to_lowercase()).collect();
    let any_col = |needles: &[&str]| lower.iter().any(|c| needles.iter().any(|n| c.contains(n)));

    if any_col(&["sales", "amount", "revenue"]) {
        suggestions.extend([
            "What are the total sales?".to_string(),
            "Which products sell the most?".to_string(),
            "Show sales trends over time".to_string(),
        ]);
    }
    if any_col(&["date", "time"]) {
        suggestions.push("Show me data trends over time".to_string());
    }
    if any_col(&["category", "type"]) {
        suggestions.push("Break down the data by category".to_string());
    }

    suggestions.truncate(6);
    suggestions
}

/// Whether the first word of `text` names a data command (`load`, `files`, ...).
pub fn is_data_command(text: &str) -> bool {
    text.split_whitespace()
        .next()
        .map(|w| DATA_COMMANDS.contains(&w.to_lowercase().as_str()))
        .unwrap_or(false)
}
