//! Scrivener CLI binary.
//!
//! - Run the rewrite workflow on a file or URL, streaming events as JSON lines
//! - Review an existing article once
//! - Extract a writing style from reference articles

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use cli::{Cli, Commands, run_review, run_style, run_workflow};

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = cli.load_config()?;

    let level = if cli.verbose {
        "debug"
    } else {
        config.logging().level().as_str()
    };
    scrivener::init_tracing(level).map_err(|e| anyhow::anyhow!(e))?;

    let result = match cli.command {
        Commands::Run(args) => run_workflow(&config, args).await,
        Commands::Review(args) => run_review(&config, args).await,
        Commands::Style(args) => run_style(&config, args).await,
    };

    scrivener::shutdown_tracing();
    result
}
