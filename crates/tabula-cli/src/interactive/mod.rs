//! Interactive slash-command framework for the `tabula chat` REPL.
//!
//! Provides a [`SlashCommandRegistry`](registry::SlashCommandRegistry) that
//! manages the built-in slash commands, plus an
//! [`InteractiveContext`](registry::InteractiveContext) holding the session
//! state command handlers work on.

pub mod builtins;
pub mod registry;
