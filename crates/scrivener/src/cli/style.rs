//! Style extraction command handler.

use super::commands::StyleArgs;
use super::inputs::{load_articles, save_style};
use anyhow::Context;
use futures_util::StreamExt;
use scrivener::{
    DonePayload, InMemoryRepository, OpenAiClient, ScrivenerConfig, StepEvent, StyleExtraction,
    StyleRepository, StyleRequest,
};
use std::sync::Arc;

/// Extract a style from article files, streaming events as JSON lines, and
/// write it to the output TOML file.
#[tracing::instrument(skip_all, fields(name = %args.name, output = %args.output.display()))]
pub async fn run_style(config: &ScrivenerConfig, args: StyleArgs) -> anyhow::Result<()> {
    let articles = load_articles(&args.articles).await?;

    let llm = Arc::new(OpenAiClient::from_config(config.llm())?);
    let repo = Arc::new(InMemoryRepository::new());
    let extraction = StyleExtraction::new(llm, repo.clone());

    let mut events = extraction.execute(StyleRequest {
        name: args.name,
        articles,
        tags: args.tags,
    })?;
    let mut stored = None;
    let mut failure = None;
    while let Some(event) = events.next().await {
        println!("{}", event.to_json_line());
        match event {
            StepEvent::Done(DonePayload::Style(done)) => stored = Some(done.id),
            StepEvent::Error { message } => failure = Some(message),
            _ => {}
        }
    }
    if let Some(message) = failure {
        anyhow::bail!("style extraction failed: {message}");
    }

    let id = stored.context("style extraction ended without a result")?;
    let style = repo
        .get_style(id)
        .await?
        .context("extracted style disappeared")?;
    save_style(&args.output, &style).await?;
    tracing::info!(style_id = id, "Wrote style file");
    Ok(())
}
