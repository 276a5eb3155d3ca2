//! Built-in slash commands for the `tabula chat` interactive REPL.
//!
//! - `/help` -- list commands
//! - `/quit` -- exit
//! - `/clear` -- forget the conversation
//! - `/history` -- last ten history entries
//! - `/model [list | switch <provider>]` -- inspect or change the backend
//! - `/files` -- data files on disk and which are loaded
//! - `/load <file>` -- load a data file and make it active
//! - `/columns`, `/shape`, `/info` -- schema of the active file
//! - `/suggest` -- questions to ask about the active data

use async_trait::async_trait;
use comfy_table::{Table, presets::UTF8_FULL};

use tabula_core::{DatasetContextProvider, DatasetSchema, ProviderRegistry};

use super::registry::{InteractiveContext, SlashCommand, SlashCommandRegistry};
use crate::commands::models::render_table;
use crate::loader;

/// Sentinel value returned by `/quit` to signal session exit.
pub const QUIT_SENTINEL: &str = "__QUIT__";

const HISTORY_SHOWN: usize = 10;

const NO_DATA: &str = "No data available. Load a file first.";

/// Register all built-in slash commands into the given registry.
pub fn register_builtins(registry: &mut SlashCommandRegistry) {
    registry.register(Box::new(QuitCommand));
    registry.register(Box::new(ClearCommand));
    registry.register(Box::new(HistoryCommand));
    registry.register(Box::new(ModelCommand));
    registry.register(Box::new(FilesCommand));
    registry.register(Box::new(LoadCommand));
    registry.register(Box::new(SchemaCommand::Columns));
    registry.register(Box::new(SchemaCommand::Shape));
    registry.register(Box::new(SchemaCommand::Info));
    registry.register(Box::new(SuggestCommand));

    // Help lists itself, so register a placeholder before rendering.
    registry.register(Box::new(HelpCommand {
        text: String::new(),
    }));
    let text = registry.help_text();
    registry.register(Box::new(HelpCommand { text }));
}

fn provider_ids() -> String {
    ProviderRegistry::supported_providers()
        .map(|k| k.as_str())
        .join(", ")
}

// ── /help ─────────────────────────────────────────────────────────────────

struct HelpCommand {
    text: String,
}

#[async_trait]
impl SlashCommand for HelpCommand {
    fn name(&self) -> &str {
        "help"
    }

    fn description(&self) -> &str {
        "Show available commands"
    }

    async fn execute(&self, _args: &str, _ctx: &mut InteractiveContext) -> anyhow::Result<String> {
        Ok(self.text.clone())
    }
}

// ── /quit ─────────────────────────────────────────────────────────────────

/// Returns [`QUIT_SENTINEL`]; the REPL loop breaks on it.
struct QuitCommand;

#[async_trait]
impl SlashCommand for QuitCommand {
    fn name(&self) -> &str {
        "quit"
    }

    fn description(&self) -> &str {
        "Exit the session"
    }

    async fn execute(&self, _args: &str, _ctx: &mut InteractiveContext) -> anyhow::Result<String> {
        Ok(QUIT_SENTINEL.into())
    }
}

// ── /clear ────────────────────────────────────────────────────────────────

struct ClearCommand;

#[async_trait]
impl SlashCommand for ClearCommand {
    fn name(&self) -> &str {
        "clear"
    }

    fn description(&self) -> &str {
        "Clear conversation history"
    }

    async fn execute(&self, _args: &str, ctx: &mut InteractiveContext) -> anyhow::Result<String> {
        ctx.brain.clear_history();
        Ok("Conversation history cleared!".into())
    }
}

// ── /history ──────────────────────────────────────────────────────────────

struct HistoryCommand;

#[async_trait]
impl SlashCommand for HistoryCommand {
    fn name(&self) -> &str {
        "history"
    }

    fn description(&self) -> &str {
        "Show the last ten history entries"
    }

    async fn execute(&self, _args: &str, ctx: &mut InteractiveContext) -> anyhow::Result<String> {
        let history = ctx.brain.get_history();
        if history.is_empty() {
            return Ok("No conversation history yet.".into());
        }

        let start = history.len().saturating_sub(HISTORY_SHOWN);
        let mut output = String::from("Conversation History:\n");
        for entry in &history[start..] {
            output.push_str(&format!("  {entry}\n"));
        }
        Ok(output)
    }
}

// ── /model ────────────────────────────────────────────────────────────────

struct ModelCommand;

#[async_trait]
impl SlashCommand for ModelCommand {
    fn name(&self) -> &str {
        "model"
    }

    fn description(&self) -> &str {
        "Show, list or switch AI models"
    }

    fn usage(&self) -> &str {
        "[list | switch <provider>]"
    }

    async fn execute(&self, args: &str, ctx: &mut InteractiveContext) -> anyhow::Result<String> {
        let parts: Vec<&str> = args.split_whitespace().collect();
        match parts.as_slice() {
            [] => {
                let info = ctx.brain.get_current_model_info();
                let max_tokens = info
                    .max_tokens
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "provider default".into());
                Ok(format!(
                    "Current AI Model:\n  \
                     Provider:    {}\n  \
                     Model:       {}\n  \
                     Temperature: {}\n  \
                     Max Tokens:  {max_tokens}",
                    info.provider, info.model_name, info.temperature,
                ))
            }
            ["list"] => Ok(format!(
                "{}\nTo switch models, use: /model switch <provider>\nAvailable providers: {}",
                render_table(&ctx.brain.list_models()),
                provider_ids()
            )),
            ["switch", provider] => Ok(ctx.brain.switch_model(&provider.to_lowercase()).await),
            _ => Ok(format!(
                "Invalid model command. Use:\n  \
                 /model                    -- Show current model info\n  \
                 /model list               -- Show available models\n  \
                 /model switch <provider>  -- Switch to a different model ({})",
                provider_ids()
            )),
        }
    }
}

// ── /files ────────────────────────────────────────────────────────────────

struct FilesCommand;

#[async_trait]
impl SlashCommand for FilesCommand {
    fn name(&self) -> &str {
        "files"
    }

    fn description(&self) -> &str {
        "List data files and which are loaded"
    }

    async fn execute(&self, _args: &str, ctx: &mut InteractiveContext) -> anyhow::Result<String> {
        let available = loader::list_data_files(&ctx.data_dir)?;
        if available.is_empty() {
            return Ok(format!(
                "No data files found in '{}'.\nAdd CSV files there to get started.",
                ctx.data_dir.display()
            ));
        }

        let loaded = ctx.brain.datasets().loaded_files()?;
        let active = ctx.brain.datasets().current_identity()?;
        let mut output = String::from("Available Data Files:\n");
        for name in &available {
            let status = if active.as_deref() == Some(name.as_str()) {
                "Active   "
            } else if loaded.contains(name) {
                "Loaded   "
            } else {
                "Available"
            };
            output.push_str(&format!("  {status} {name}\n"));
        }
        if loaded.is_empty() {
            output.push_str("\nUse /load <filename> to load a file");
        }
        Ok(output)
    }
}

// ── /load ─────────────────────────────────────────────────────────────────

struct LoadCommand;

#[async_trait]
impl SlashCommand for LoadCommand {
    fn name(&self) -> &str {
        "load"
    }

    fn description(&self) -> &str {
        "Load a data file and make it active"
    }

    fn usage(&self) -> &str {
        "<file>"
    }

    async fn execute(&self, args: &str, ctx: &mut InteractiveContext) -> anyhow::Result<String> {
        let name = args.trim();
        if name.is_empty() {
            return Ok("Please specify a filename. Usage: /load <filename>".into());
        }

        match loader::load_into(ctx.brain.datasets(), &ctx.data_dir, name) {
            Ok(schema) => {
                let mut output = schema.summary(name);
                output.push_str("\n\nTry asking:\n");
                for suggestion in ctx.brain.suggestions().iter().take(3) {
                    output.push_str(&format!("  - {suggestion}\n"));
                }
                Ok(output)
            }
            Err(e) => Ok(format!("Failed to load '{name}': {e}")),
        }
    }
}

// ── /columns, /shape, /info ───────────────────────────────────────────────

/// Answers schema questions about the active file without the assistant.
enum SchemaCommand {
    Columns,
    Shape,
    Info,
}

impl SchemaCommand {
    fn render(&self, identity: &str, schema: &DatasetSchema) -> String {
        match self {
            Self::Columns => format!("Columns: {}", schema.columns.join(", ")),
            Self::Shape => format!("Shape: {} rows x {} columns", schema.rows, schema.cols),
            Self::Info => format!(
                "Dataset: {identity}\nDimensions: {} rows x {} columns\n{}",
                schema.rows,
                schema.cols,
                column_table(schema)
            ),
        }
    }
}

fn column_table(schema: &DatasetSchema) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(["#", "COLUMN", "KIND", "MISSING"]);

    for (i, column) in schema.columns.iter().enumerate() {
        let kind = schema.kinds.get(i).map(|k| k.as_str()).unwrap_or("unknown");
        let missing = schema
            .null_counts
            .get(i)
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".into());
        table.add_row([(i + 1).to_string(), column.clone(), kind.to_string(), missing]);
    }
    table
}

#[async_trait]
impl SlashCommand for SchemaCommand {
    fn name(&self) -> &str {
        match self {
            Self::Columns => "columns",
            Self::Shape => "shape",
            Self::Info => "info",
        }
    }

    fn description(&self) -> &str {
        match self {
            Self::Columns => "List column names of the active file",
            Self::Shape => "Row and column count of the active file",
            Self::Info => "Kind and missing values per column",
        }
    }

    async fn execute(&self, _args: &str, ctx: &mut InteractiveContext) -> anyhow::Result<String> {
        let datasets = ctx.brain.datasets();
        let (Some(identity), Some(schema)) = (datasets.current_identity()?, datasets.schema()?)
        else {
            return Ok(NO_DATA.into());
        };
        Ok(self.render(&identity, &schema))
    }
}

// ── /suggest ──────────────────────────────────────────────────────────────

struct SuggestCommand;

#[async_trait]
impl SlashCommand for SuggestCommand {
    fn name(&self) -> &str {
        "suggest"
    }

    fn description(&self) -> &str {
        "Suggest questions about the active data"
    }

    async fn execute(&self, _args: &str, ctx: &mut InteractiveContext) -> anyhow::Result<String> {
        let mut output = String::from("Suggested questions:\n");
        for (i, suggestion) in ctx.brain.suggestions().iter().enumerate() {
            output.push_str(&format!("  {}. {suggestion}\n", i + 1));
        }
        Ok(output)
    }
}
