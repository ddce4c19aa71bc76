//! One-off review command handler.

use super::commands::ReviewArgs;
use super::inputs::load_style;
use anyhow::Context;
use futures_util::StreamExt;
use scrivener::{
    InMemoryRepository, OpenAiClient, ReviewRepository, ReviewResult, ReviewStep, ScrivenerConfig,
};
use std::sync::Arc;

/// Standalone reviews are not attached to a rewrite record.
const STANDALONE_REWRITE_ID: i64 = 0;

/// Review an article once, printing step events and then the stored record.
#[tracing::instrument(skip_all, fields(file = %args.file.display()))]
pub async fn run_review(config: &ScrivenerConfig, args: ReviewArgs) -> anyhow::Result<()> {
    let content = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("reading article {}", args.file.display()))?;
    if content.trim().is_empty() {
        anyhow::bail!("article {} is empty", args.file.display());
    }
    let style = load_style(&args.style).await?;

    let llm = Arc::new(OpenAiClient::from_config(config.llm())?);
    let repo = Arc::new(InMemoryRepository::new());
    let step = ReviewStep::new(llm, repo.clone())
        .with_pass_threshold(*config.workflow().pass_threshold());

    let record = step
        .create_review(STANDALONE_REWRITE_ID, content.trim(), 0)
        .await?;
    let mut events = step.execute(record.id, style.to_summary());
    while let Some(event) = events.next().await {
        println!("{}", event.to_json_line());
    }

    let record = repo
        .get_review(record.id)
        .await?
        .context("review record disappeared")?;
    println!("{}", serde_json::to_string(&record)?);

    match record.result {
        ReviewResult::Passed => Ok(()),
        _ => match record.error_message {
            Some(message) => anyhow::bail!("review failed: {message}"),
            None => anyhow::bail!(
                "article did not pass review (score {})",
                record.total_score.unwrap_or_default()
            ),
        },
    }
}
