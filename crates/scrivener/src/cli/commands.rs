//! CLI command definitions.

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use scrivener::ScrivenerConfig;
use std::path::PathBuf;

/// Scrivener - style-guided article rewriting with review and human sign-off
#[derive(Parser, Debug)]
#[command(name = "scrivener")]
#[command(about = "Style-guided article rewriting with review and human sign-off", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file, instead of the standard search path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Load and validate configuration.
    pub fn load_config(&self) -> anyhow::Result<ScrivenerConfig> {
        let config = match &self.config {
            Some(path) => ScrivenerConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ScrivenerConfig::load().context("loading configuration")?,
        };
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rewrite an article, review it, and finish after a decision
    Run(RunArgs),

    /// Review an article once and print the verdict
    Review(ReviewArgs),

    /// Extract a writing style from reference articles into a style TOML file
    Style(StyleArgs),
}

/// Arguments for `scrivener run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Source article: a file path or an http(s) URL
    #[arg(long)]
    pub source: String,

    /// Writing style TOML file
    #[arg(long)]
    pub style: PathBuf,

    /// Target length in characters (defaults to configuration)
    #[arg(long)]
    pub target_words: Option<u32>,

    /// Retries after failed reviews (defaults to configuration)
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Directory of .txt/.md reference materials; enables retrieval
    #[arg(long)]
    pub rag_dir: Option<PathBuf>,

    /// Materials retrieved per rewrite (defaults to configuration)
    #[arg(long)]
    pub rag_top_k: Option<usize>,

    /// What to do when the review passes
    #[arg(long, value_enum, default_value = "ask")]
    pub decision: DecisionMode,

    /// Edited article used for the `edit` decision
    #[arg(long)]
    pub edited_file: Option<PathBuf>,

    /// Generate a cover image in the cover step
    #[arg(long)]
    pub cover: bool,

    /// Cover size label or ratio (defaults to configuration)
    #[arg(long)]
    pub cover_size: Option<String>,
}

/// Arguments for `scrivener review`.
#[derive(Args, Debug)]
pub struct ReviewArgs {
    /// Article to review
    #[arg(long)]
    pub file: PathBuf,

    /// Writing style TOML file the article should follow
    #[arg(long)]
    pub style: PathBuf,
}

/// Arguments for `scrivener style`.
#[derive(Args, Debug)]
pub struct StyleArgs {
    /// Name of the new style
    #[arg(long)]
    pub name: String,

    /// Reference article files; at most five non-blank ones are analyzed
    #[arg(long = "article", required = true)]
    pub articles: Vec<PathBuf>,

    /// Labels stored with the style
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Where to write the style TOML, usable as `run --style`
    #[arg(long)]
    pub output: PathBuf,
}

/// Decision applied when a run reaches the decision gate.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecisionMode {
    /// Prompt on the terminal
    Ask,
    /// Replace the text with `--edited-file`
    Edit,
    /// Go straight to the cover step
    Cover,
}
