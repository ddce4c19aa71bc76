//! Workflow command handler.

use super::commands::{DecisionMode, RunArgs};
use super::inputs::{load_materials, load_source, load_style};
use anyhow::Context;
use futures_util::StreamExt;
use scrivener::{
    HttpArticleFetcher, HumanDecision, InMemoryRepository, OpenAiClient, OpenAiImageClient,
    PromptedCoverGenerator, ScrivenerConfig, WorkflowEvent, WorkflowInput, WorkflowOrchestrator,
    WorkflowState, WorkflowStatus, WorkflowStream,
};
use std::sync::Arc;

/// Run the full workflow, printing every event as a JSON line on stdout.
#[tracing::instrument(skip_all, fields(source = %args.source))]
pub async fn run_workflow(config: &ScrivenerConfig, args: RunArgs) -> anyhow::Result<()> {
    let workflow = config.workflow();
    let llm = Arc::new(OpenAiClient::from_config(config.llm())?);
    let repo = Arc::new(InMemoryRepository::new());

    let style = load_style(&args.style).await?;
    let style_id = repo.add_style(style).await;

    let mut orchestrator = WorkflowOrchestrator::new(llm.clone(), repo)
        .with_config(workflow)
        .with_fetcher(Arc::new(HttpArticleFetcher::new(
            *workflow.max_source_chars(),
        )));

    let enable_rag = match &args.rag_dir {
        Some(dir) => {
            let materials = load_materials(dir).await?;
            orchestrator = orchestrator.with_retrieval(Arc::new(materials));
            true
        }
        None => false,
    };

    if args.cover {
        let images = Arc::new(OpenAiImageClient::from_config(config.image())?);
        let size = args
            .cover_size
            .clone()
            .unwrap_or_else(|| config.image().size().clone());
        orchestrator = orchestrator
            .with_cover_generator(Arc::new(PromptedCoverGenerator::new(llm, images)))
            .with_cover_size(size);
    }

    let input = WorkflowInput::builder()
        .source_article(load_source(&args.source).await?)
        .style_id(style_id)
        .target_words(args.target_words.unwrap_or(*workflow.target_words()))
        .max_retries(args.max_retries.unwrap_or(*workflow.max_retries()))
        .enable_rag(enable_rag)
        .rag_top_k(args.rag_top_k.unwrap_or(*workflow.rag_top_k()))
        .build()
        .context("building workflow input")?;

    let stream = orchestrator.run_stream(&input).await?;
    let mut state = print_events(stream)
        .await
        .context("workflow ended without a node event")?;

    if state.status == WorkflowStatus::AwaitingDecision {
        let rewrite_id = state
            .rewrite_id
            .context("suspended workflow has no rewrite id")?;
        let (decision, edited) = decide(&args).await?;
        tracing::info!(rewrite_id, %decision, "Resuming after decision");

        let stream = orchestrator
            .resume_stream(rewrite_id, decision, edited)
            .await?;
        state = print_events(stream)
            .await
            .context("resumed workflow ended without a node event")?;
    }

    match state.status {
        WorkflowStatus::Completed => Ok(()),
        WorkflowStatus::RetriesExhausted => {
            anyhow::bail!("review did not pass within {} retries", input.max_retries)
        }
        status => anyhow::bail!(
            "workflow stopped with status {status:?}: {}",
            state.error_message.as_deref().unwrap_or("no error recorded")
        ),
    }
}

/// Print events and return the last node snapshot.
async fn print_events(mut stream: WorkflowStream) -> Option<WorkflowState> {
    let mut last = None;
    while let Some(event) = stream.next().await {
        println!("{}", event.to_json_line());
        if let WorkflowEvent::Node { state, .. } = event {
            last = Some(*state);
        }
    }
    last
}

async fn decide(args: &RunArgs) -> anyhow::Result<(HumanDecision, Option<String>)> {
    let mode = match args.decision {
        DecisionMode::Ask => ask().await?,
        mode => mode,
    };

    match mode {
        DecisionMode::Edit => {
            let path = args
                .edited_file
                .as_ref()
                .context("the edit decision needs --edited-file")?;
            let edited = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading edited article {}", path.display()))?;
            Ok((HumanDecision::ManualEdit, Some(edited)))
        }
        _ => Ok((HumanDecision::SkipToCover, None)),
    }
}

async fn ask() -> anyhow::Result<DecisionMode> {
    eprint!("Review passed. Type `edit` to use --edited-file, anything else for the cover step: ");
    let line = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).map(|_| line)
    })
    .await??;

    Ok(match line.trim() {
        "edit" | "e" => DecisionMode::Edit,
        _ => DecisionMode::Cover,
    })
}
