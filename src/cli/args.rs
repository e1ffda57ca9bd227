//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands::{
    completions::CompletionsArgs, config::ConfigCommands, import::ImportArgs,
    inspect::InspectArgs, map::MapArgs, suggest::SuggestArgs, webhook::WebhookArgs,
};

#[derive(Parser)]
#[command(name = "staymap")]
#[command(author, version, about = "Staymap booking field mapper")]
#[command(long_about = "Map booking exports and webhook payloads from rental platforms onto a normalized booking schema.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the columns of a CSV export
    Inspect(InspectArgs),

    /// Suggest a field mapping for a CSV export or webhook payload
    Suggest(SuggestArgs),

    /// Build a field mapping interactively
    Map(MapArgs),

    /// Extract normalized booking records from a CSV export
    Import(ImportArgs),

    /// Apply or check a field mapping against a webhook payload
    Webhook(WebhookArgs),

    /// Show configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (table for listings, yaml for mappings)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// JSON format (for programming)
    Json,
    /// Tab-separated values (for piping)
    Tsv,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
}
