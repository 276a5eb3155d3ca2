//! `tabula models` -- list supported providers.

use clap::Args;
use comfy_table::{Table, presets::UTF8_FULL};

use tabula_core::ProviderListing;

use super::load_config;

/// Arguments for the `tabula models` subcommand.
#[derive(Args)]
pub struct ModelsArgs {
    /// Config file path (overrides auto-discovery).
    #[arg(short, long)]
    pub config: Option<String>,

    /// Print the listing as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ModelsArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let rows = config.registry().listings(config.active_provider);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        println!("{}", render_table(&rows));
        println!("\nSwitch inside a chat session with: /model switch <provider>");
    }
    Ok(())
}

pub(crate) fn render_table(rows: &[ProviderListing]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(["PROVIDER", "MODEL", "CREDENTIALS", "ACTIVE"]);

    for row in rows {
        let credentials = if row.has_credentials { "ok" } else { "missing" };
        let active = if row.active { "*" } else { "" };
        table.add_row([
            row.provider.as_str(),
            row.model_name.as_str(),
            credentials,
            active,
        ]);
    }
    table
}
