//! `tabula` -- CLI binary for the tabula data-chat assistant.
//!
//! Provides the following subcommands:
//!
//! - `tabula chat` -- Start an interactive chat session or send a single message.
//! - `tabula models` -- List supported providers and their credential status.

use clap::{Parser, Subcommand};

mod commands;
mod interactive;
mod loader;

/// tabula data-chat assistant CLI.
#[derive(Parser)]
#[command(name = "tabula", about = "tabula data-chat assistant CLI", version)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session or send a single message.
    Chat(commands::chat::ChatArgs),

    /// List supported providers and their credential status.
    Models(commands::models::ModelsArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Chat(args) => commands::chat::run(args).await?,
        Commands::Models(args) => commands::models::run(args)?,
    }

    Ok(())
}
