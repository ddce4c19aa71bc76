//! Tests for chat-driven cover generation.

mod test_utils;

use async_trait::async_trait;
use scrivener_core::{WorkflowInput, WorkflowStatus};
use scrivener_error::ScrivenerResult;
use scrivener_interface::{CoverGenerator, CoverRequest, GeneratedImage, ImageGeneration};
use scrivener_workflow::{PromptedCoverGenerator, RENDER_GUARD, WorkflowOrchestrator};
use std::sync::{Arc, Mutex};
use test_utils::{MockLlm, MockReply, repo_with_style, verdict};

#[derive(Default)]
struct RecordingImages {
    calls: Mutex<Vec<(String, String)>>,
}

impl RecordingImages {
    fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageGeneration for RecordingImages {
    async fn generate_image(&self, prompt: &str, size: &str) -> ScrivenerResult<GeneratedImage> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), size.to_string()));
        Ok(GeneratedImage {
            url: "https://img.example.com/cover.png".to_string(),
            size: size.to_string(),
        })
    }
}

const CONTENT: &str = "雨后的城市像被重新洗过一遍，街角的梧桐叶闪着光。";

#[tokio::test]
async fn test_keyword_path_uses_two_chat_calls() {
    let llm = Arc::new(
        MockLlm::new(MockReply::text("x"), MockReply::text("{}"))
            .queue_chat("雨后, 城市, 梧桐")
            .queue_chat("A rain-washed street lined with plane trees\n公众号封面 比例为 2.35:1"),
    );
    let images = Arc::new(RecordingImages::default());
    let generator = PromptedCoverGenerator::new(llm.clone(), images.clone());

    let request = CoverRequest::builder()
        .title("雨后")
        .content(CONTENT)
        .size("2.35:1")
        .build()
        .unwrap();
    let cover = generator.generate_cover(&request).await.unwrap();

    assert_eq!(llm.chat_calls(), 2);
    assert!(llm.prompts()[1].contains("雨后, 城市, 梧桐"));
    assert_eq!(cover.size, "3072x1308");
    assert_eq!(cover.image_url, "https://img.example.com/cover.png");
    assert!(cover.prompt.starts_with("A rain-washed street"));
    assert!(!cover.prompt.contains("公众号"));
    assert!(cover.prompt.ends_with(RENDER_GUARD));
    assert_eq!(images.calls()[0].0, cover.prompt);
}

#[tokio::test]
async fn test_template_path_skips_chat() {
    let llm = Arc::new(MockLlm::new(MockReply::text("x"), MockReply::text("{}")));
    let images = Arc::new(RecordingImages::default());
    let generator = PromptedCoverGenerator::new(llm.clone(), images.clone());

    let request = CoverRequest::builder()
        .title("雨后")
        .content(CONTENT)
        .style_template("胶片质感海报，主题《{title}》，{mood}")
        .build()
        .unwrap();
    let cover = generator.generate_cover(&request).await.unwrap();

    assert_eq!(llm.chat_calls(), 0);
    assert!(cover.prompt.starts_with("胶片质感海报，主题《雨后》，{mood}"));
    assert_eq!(images.calls()[0].1, "2k");
}

#[tokio::test]
async fn test_short_content_is_rejected() {
    let llm = Arc::new(MockLlm::new(MockReply::text("x"), MockReply::text("{}")));
    let images = Arc::new(RecordingImages::default());
    let generator = PromptedCoverGenerator::new(llm, images.clone());

    let request = CoverRequest::builder().content("太短了").build().unwrap();
    let err = generator.generate_cover(&request).await.unwrap_err();

    assert!(err.is_validation());
    assert!(images.calls().is_empty());
}

#[tokio::test]
async fn test_workflow_attaches_cover() {
    let (repo, style_id) = repo_with_style().await;
    let llm = Arc::new(
        MockLlm::new(
            MockReply::text("雨后的街道很安静，梧桐叶上挂着水珠，路人放慢了脚步。"),
            MockReply::text(verdict(true, 44)),
        )
        .queue_chat("雨后, 街道")
        .queue_chat("Quiet wet street after rain"),
    );
    let images = Arc::new(RecordingImages::default());
    let orchestrator = WorkflowOrchestrator::new(llm.clone(), Arc::new(repo.clone()))
        .with_cover_generator(Arc::new(PromptedCoverGenerator::new(llm, images)))
        .with_cover_size("1:1");

    let input = WorkflowInput::builder()
        .source_article(CONTENT)
        .style_id(style_id)
        .build()
        .unwrap();
    let state = orchestrator.run(&input).await.unwrap();
    let finished = orchestrator
        .resume_skip_to_cover(state.rewrite_id.unwrap())
        .await
        .unwrap();

    assert_eq!(finished.status, WorkflowStatus::Completed);
    let cover = finished.cover.unwrap();
    assert_eq!(cover.size, "2048x2048");
    assert!(cover.prompt.starts_with("Quiet wet street after rain"));
}

#[tokio::test]
async fn test_cover_failure_fails_the_run() {
    let (repo, style_id) = repo_with_style().await;
    // No chat replies queued, so keyword extraction fails
    let llm = Arc::new(MockLlm::new(
        MockReply::text("雨后的街道很安静，梧桐叶上挂着水珠。"),
        MockReply::text(verdict(true, 44)),
    ));
    let images = Arc::new(RecordingImages::default());
    let orchestrator = WorkflowOrchestrator::new(llm.clone(), Arc::new(repo.clone()))
        .with_cover_generator(Arc::new(PromptedCoverGenerator::new(llm, images)));

    let input = WorkflowInput::builder()
        .source_article(CONTENT)
        .style_id(style_id)
        .build()
        .unwrap();
    let state = orchestrator.run(&input).await.unwrap();
    let finished = orchestrator
        .resume_skip_to_cover(state.rewrite_id.unwrap())
        .await
        .unwrap();

    assert_eq!(finished.status, WorkflowStatus::Failed);
    assert!(finished.cover.is_none());
    assert!(finished.error_message.is_some());
}
