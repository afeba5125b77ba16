//! Defines the command-line interface structure using clap.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "prompt-pipeline",
    version,
    about = "Compose prompt templates and LLM calls into pipelines"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Cmd,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// Translate English text to Korean, then summarize it in three bullet points
    Translate {
        /// English text to translate
        #[arg(long)]
        text: String,
        /// LLM backend to use, e.g., 'openai:gpt-4o-mini' (overrides config.toml)
        #[arg(long)]
        backend: Option<String>,
        /// Skip the live backend and use the stub model
        #[arg(long)]
        stub: bool,
    },
    /// Extract a structured record from free-form text
    Extract {
        /// File containing the text to extract from
        #[arg(long, conflicts_with = "text", required_unless_present = "text")]
        file: Option<String>,
        /// Text to extract from
        #[arg(long)]
        text: Option<String>,
        /// YAML schema file (defaults to the built-in resume schema)
        #[arg(long)]
        schema: Option<String>,
        /// LLM backend to use, e.g., 'openai:gpt-4o' (overrides config.toml)
        #[arg(long)]
        backend: Option<String>,
        /// Skip the live backend and use the stub model
        #[arg(long)]
        stub: bool,
    },
    /// Render a template with variable substitution (local only)
    Render {
        /// Template text with `{name}` placeholders
        #[arg(long)]
        template: String,
        #[arg(long = "var", help = "Variable assignments in key=value format")]
        vars: Vec<String>,
    },
}
