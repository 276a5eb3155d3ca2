//! Prompt composition.
//!
//! Builds the text sent to the backend for a relevant message: a role line,
//! the dataset block (when something is loaded), the guideline block, and
//! the labelled user question, joined by newlines.

use crate::dataset::DatasetContext;

const ROLE_LINE: &str = "You are a data analysis assistant. Your role is to help users understand and analyze their data files.";

const GUIDELINES: [&str; 4] = [
    "- Focus only on data analysis, statistics, and insights from the loaded files",
    "- Provide specific, actionable insights about the data",
    "- If asked about non-data topics, politely redirect to data analysis",
    "- Use the actual column names and data when providing examples",
];

/// Label that precedes the user text; it always ends the prompt.
pub const QUESTION_LABEL: &str = "\nUser question: ";

/// Compose the final prompt. Never fails and never touches the network.
pub fn compose(user_text: &str, context: Option<&DatasetContext>) -> String {
    let mut parts: Vec<String> = vec![ROLE_LINE.to_string()];

    if let Some(ctx) = context.filter(|c| !c.loaded_files.is_empty()) {
        parts.push(format!(
            "\nCurrently loaded files: {}",
            ctx.loaded_files.join(", ")
        ));
        if let (Some(active), Some(schema)) = (&ctx.active, &ctx.schema) {
            parts.push(format!("Active file: {active}"));
            parts.push(format!("Columns: {}", schema.columns.join(", ")));
            parts.push(format!(
                "Shape: {} rows × {} columns",
                schema.rows, schema.cols
            ));
        }
    }

    parts.push("\nGuidelines:".to_string());
    parts.extend(GUIDELINES.iter().map(|g| g.to_string()));
    parts.push(format!("{QUESTION_LABEL}{user_text}"));

    parts.join("\n")
}
