//! `tabula chat` -- interactive chat session or single-message mode.
//!
//! In single-message mode (`--message "..."`), answers one message and
//! prints the reply. In interactive mode (no `--message`), reads from
//! stdin in a REPL loop. Either way the first data file in the data folder
//! is loaded at start-up.
//!
//! # Examples
//!
//! ```text
//! # Single message
//! tabula chat -m "Which region sells the most?"
//!
//! # Interactive mode
//! tabula chat
//! > /load sales.csv
//! > show me sales trends
//! [assistant reply]
//! > /quit
//!
//! # Override provider
//! tabula chat --provider ollama -m "average order value?"
//! ```

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use tokio::io::AsyncBufReadExt;
use tracing::{info, warn};

use tabula_core::guardrail::is_data_command;
use tabula_core::{Brain, InMemoryDatasets};
use tabula_llm::ProviderKind;

use super::load_config;
use crate::interactive::builtins::{QUIT_SENTINEL, register_builtins};
use crate::interactive::registry::{InteractiveContext, SlashCommandRegistry};
use crate::loader;

/// Bare words that end the session like `/quit`.
const EXIT_WORDS: &[&str] = &["quit", "exit", "bye", "goodbye"];

/// Arguments for the `tabula chat` subcommand.
#[derive(Args)]
pub struct ChatArgs {
    /// Send a single message and exit (non-interactive mode).
    #[arg(short, long)]
    pub message: Option<String>,

    /// Provider to start with: gemini, openai, anthropic or ollama (overrides config).
    #[arg(long)]
    pub provider: Option<String>,

    /// Config file path (overrides auto-discovery).
    #[arg(short, long)]
    pub config: Option<String>,

    /// Data folder (overrides config).
    #[arg(long)]
    pub data_dir: Option<String>,
}

/// Run the chat command.
pub async fn run(args: ChatArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;

    let active = match args.provider.as_deref() {
        Some(id) => id.parse::<ProviderKind>()?,
        None => config.active_provider,
    };
    let data_dir = args
        .data_dir
        .map(PathBuf::from)
        .unwrap_or_else(|| config.data_dir.clone());
    info!(provider = %active, data_dir = %data_dir.display(), "starting chat");

    let brain = Brain::new(config.registry(), active, InMemoryDatasets::new())
        .await
        .map_err(|e| anyhow::anyhow!("failed to start {}: {e}", active.display_name()))?;
    let mut ctx = InteractiveContext::new(brain, data_dir);

    if let Some(ref message) = args.message {
        for line in auto_load_first_file(&ctx) {
            info!("{line}");
        }
        println!("{}", ctx.brain.think(message).await);
        return Ok(());
    }

    run_interactive(&mut ctx).await
}

/// Load the first data file in the folder. Returns the lines to show the
/// user; failures are reported there rather than aborting start-up.
fn auto_load_first_file(ctx: &InteractiveContext) -> Vec<String> {
    let available = match loader::list_data_files(&ctx.data_dir) {
        Ok(files) => files,
        Err(e) => {
            warn!(error = %e, "cannot scan data folder");
            return vec![format!("Cannot read data folder: {e}")];
        }
    };
    let Some(first) = available.first() else {
        return vec![
            "Data folder is empty.".into(),
            format!(
                "Add CSV files to '{}' to get started with data analysis.",
                ctx.data_dir.display()
            ),
        ];
    };

    let mut lines = vec![format!("Auto-loading first file: {first}")];
    match loader::load_into(ctx.brain.datasets(), &ctx.data_dir, first) {
        Ok(schema) => {
            lines.push(schema.summary(first));
            if available.len() > 1 {
                lines.push(format!(
                    "{} more data files available. Use /files to list them and /load <filename> to switch.",
                    available.len() - 1
                ));
            }
        }
        Err(e) => {
            lines.push(format!("Failed to auto-load {first}: {e}"));
            lines.push("You can load files manually with: /load <filename>".into());
        }
    }
    lines
}

/// Route non-chat input: slash commands, bare exit words, and data
/// commands typed without the slash (`load sales.csv`, `columns`). `None`
/// means the input goes to the assistant.
async fn dispatch_command(
    registry: &SlashCommandRegistry,
    input: &str,
    ctx: &mut InteractiveContext,
) -> Option<anyhow::Result<String>> {
    if input.starts_with('/') {
        return Some(registry.dispatch(input, ctx).await.unwrap_or_else(|| {
            Ok(format!("Unknown command: {input}. Type /help for commands."))
        }));
    }
    if EXIT_WORDS.contains(&input.to_lowercase().as_str()) {
        return Some(Ok(QUIT_SENTINEL.into()));
    }
    if is_data_command(input) {
        let (word, rest) = input
            .trim()
            .split_once(char::is_whitespace)
            .unwrap_or((input.trim(), ""));
        let command = format!("/{} {rest}", word.to_lowercase());
        return registry.dispatch(&command, ctx).await;
    }
    None
}

/// Run an interactive REPL loop reading from stdin.
async fn run_interactive(ctx: &mut InteractiveContext) -> anyhow::Result<()> {
    let mut registry = SlashCommandRegistry::new();
    register_builtins(&mut registry);

    let model = ctx.brain.get_current_model_info();
    println!("tabula chat -- interactive mode (type /help for commands)");
    println!("Model: {} ({})", model.model_name, model.provider.display_name());
    println!();
    for line in auto_load_first_file(ctx) {
        println!("{line}");
    }
    println!();

    let stdin = tokio::io::stdin();
    let mut reader = tokio::io::BufReader::new(stdin).lines();

    loop {
        eprint!("> ");
        // Flush so the prompt appears before blocking on read.
        std::io::stderr().flush().ok();

        let Some(line) = reader.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match dispatch_command(&registry, input, ctx).await {
            Some(Ok(output)) if output == QUIT_SENTINEL => break,
            Some(Ok(output)) => println!("{output}\n"),
            Some(Err(e)) => eprintln!("error: {e}\n"),
            None => println!("{}\n", ctx.brain.think(input).await),
        }
    }

    println!("Goodbye! Thanks for chatting.");
    Ok(())
}
