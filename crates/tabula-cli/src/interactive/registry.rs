//! Slash command registry and dispatch.
//!
//! The [`SlashCommandRegistry`] holds a set of named [`SlashCommand`]
//! implementations and dispatches user input that starts with `/` to the
//! matching handler.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut registry = SlashCommandRegistry::new();
//! registry.register(Box::new(HelpCommand));
//! let result = registry.dispatch("/help", &mut ctx).await;
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;

use tabula_core::{Brain, InMemoryDatasets};

/// Mutable session state handed to slash commands.
pub struct InteractiveContext {
    /// The orchestrator serving this session.
    pub brain: Brain<InMemoryDatasets>,

    /// Folder that `/files` lists and `/load` reads from.
    pub data_dir: PathBuf,
}

impl InteractiveContext {
    pub fn new(brain: Brain<InMemoryDatasets>, data_dir: PathBuf) -> Self {
        Self { brain, data_dir }
    }
}

/// Trait for a slash command handler.
///
/// Implementors provide a name (without the `/` prefix), a description
/// for help text, and an [`execute`](SlashCommand::execute) method that
/// processes the command arguments and returns output to display.
#[async_trait]
pub trait SlashCommand: Send + Sync {
    /// Command name without the leading `/`.
    fn name(&self) -> &str;

    /// One-line description for help text.
    fn description(&self) -> &str;

    /// Argument synopsis shown in help, e.g. `<file>`.
    fn usage(&self) -> &str {
        ""
    }

    /// Execute the command with the given arguments string.
    async fn execute(&self, args: &str, ctx: &mut InteractiveContext) -> anyhow::Result<String>;
}

/// Registry of slash commands with dispatch.
pub struct SlashCommandRegistry {
    commands: HashMap<String, Box<dyn SlashCommand>>,
}

impl SlashCommandRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Register a slash command, replacing any command with the same name.
    pub fn register(&mut self, cmd: Box<dyn SlashCommand>) {
        self.commands.insert(cmd.name().to_string(), cmd);
    }

    /// Dispatch a line of input.
    ///
    /// The first word after `/` is the command name and the rest is passed
    /// as `args`. Returns `None` for input without a leading `/` or for an
    /// unregistered command.
    pub async fn dispatch(
        &self,
        input: &str,
        ctx: &mut InteractiveContext,
    ) -> Option<anyhow::Result<String>> {
        let without_slash = input.trim().strip_prefix('/')?;
        let (name, args) = match without_slash.split_once(char::is_whitespace) {
            Some((n, a)) => (n, a.trim()),
            None => (without_slash, ""),
        };

        let cmd = self.commands.get(name)?;
        Some(cmd.execute(args, ctx).await)
    }

    pub fn has(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// All registered command names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }

    /// Help listing built from every registered command.
    pub fn help_text(&self) -> String {
        let mut output = String::from("Commands:\n");
        for name in self.names() {
            let cmd = &self.commands[name];
            let synopsis = match cmd.usage() {
                "" => format!("/{name}"),
                usage => format!("/{name} {usage}"),
            };
            output.push_str(&format!("  {synopsis:<26}-- {}\n", cmd.description()));
        }
        output.push_str("\nAnything else is sent to the assistant.");
        output
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Default for SlashCommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
