//! End-to-end tests for the workflow state machine.

mod test_utils;

use futures::StreamExt;
use scrivener_core::{
    HumanDecision, ReviewOutcome, Step, StepEvent, WorkflowEvent, WorkflowInput, WorkflowStatus,
};
use scrivener_interface::{ReviewRepository, RewriteRepository, SuspendedWorkflowStore};
use scrivener_workflow::{InMemoryRepository, WorkflowOrchestrator};
use std::sync::Arc;
use test_utils::{MockLlm, MockReply, repo_with_style, verdict};

fn input(style_id: i64, max_retries: u32) -> WorkflowInput {
    WorkflowInput::builder()
        .source_article("菜市场的清晨比闹钟更早。\n\n卖豆腐的阿姨五点就出摊了。")
        .style_id(style_id)
        .target_words(400u32)
        .max_retries(max_retries)
        .build()
        .unwrap()
}

fn orchestrator(llm: Arc<MockLlm>, repo: &InMemoryRepository) -> WorkflowOrchestrator {
    WorkflowOrchestrator::new(llm, Arc::new(repo.clone()))
}

fn passing_llm() -> Arc<MockLlm> {
    Arc::new(MockLlm::new(
        MockReply::text("清晨五点，豆腐摊已经冒着热气。\n\n阿姨说，晚了就没人买了。"),
        MockReply::text(verdict(true, 42)),
    ))
}

#[tokio::test]
async fn test_passing_run_suspends_at_decision() {
    let (repo, style_id) = repo_with_style().await;
    let llm = passing_llm();
    let orchestrator = orchestrator(llm.clone(), &repo);

    let state = orchestrator.run(&input(style_id, 3)).await.unwrap();

    assert_eq!(state.status, WorkflowStatus::AwaitingDecision);
    assert_eq!(state.current_step, Some(Step::Decision));
    assert_eq!(state.review_outcome, ReviewOutcome::Passed);
    assert_eq!(state.review_score, 42);
    assert_eq!(state.user_decision, HumanDecision::Pending);
    assert_eq!(state.retry_count, 0);
    assert_eq!(state.review_feedback["passed"], true);
    assert!(state.rewritten_content.starts_with("清晨五点"));

    let rewrite_id = state.rewrite_id.unwrap();
    let suspended = orchestrator.store().get(rewrite_id).await.unwrap().unwrap();
    assert_eq!(suspended, state);
    assert_eq!(llm.rewrite_calls(), 1);
    assert_eq!(llm.review_calls(), 1);
}

#[tokio::test]
async fn test_retry_ceiling_ends_without_decision() {
    let (repo, style_id) = repo_with_style().await;
    let llm = Arc::new(MockLlm::new(
        MockReply::text("总是不合格的稿子。"),
        MockReply::text(verdict(false, 20)),
    ));
    let orchestrator = orchestrator(llm.clone(), &repo);

    let events: Vec<WorkflowEvent> = orchestrator
        .run_stream(&input(style_id, 2))
        .await
        .unwrap()
        .collect()
        .await;
    let nodes: Vec<Step> = events
        .iter()
        .filter_map(|event| match event {
            WorkflowEvent::Node { node, .. } => Some(*node),
            WorkflowEvent::Step(_) => None,
        })
        .collect();

    assert_eq!(
        nodes,
        vec![
            Step::Rewrite,
            Step::Review,
            Step::Rewrite,
            Step::Review,
            Step::Rewrite,
            Step::Review,
        ]
    );
    assert_eq!(llm.rewrite_calls(), 3);
    assert_eq!(llm.review_calls(), 3);
    assert!(orchestrator.store().is_empty().await);

    let Some(WorkflowEvent::Node { state, .. }) = events.last() else {
        panic!("expected a final node");
    };
    let reviews = repo.list_reviews(state.rewrite_id.unwrap()).await.unwrap();
    let rounds: Vec<(u32, u32)> = reviews.iter().map(|r| (r.round, r.retry_count)).collect();
    assert_eq!(rounds, vec![(1, 0), (2, 1), (3, 2)]);
}

#[tokio::test]
async fn test_retry_ceiling_final_state() {
    let (repo, style_id) = repo_with_style().await;
    let llm = Arc::new(MockLlm::new(
        MockReply::text("总是不合格的稿子。"),
        MockReply::text(verdict(true, 10)),
    ));
    let orchestrator = orchestrator(llm, &repo);

    let state = orchestrator.run(&input(style_id, 2)).await.unwrap();

    assert_eq!(state.status, WorkflowStatus::RetriesExhausted);
    assert_eq!(state.review_outcome, ReviewOutcome::Failed);
    assert_eq!(state.retry_count, 2);
    assert_eq!(state.current_step, Some(Step::Review));
}

#[tokio::test]
async fn test_failed_review_then_pass() {
    let (repo, style_id) = repo_with_style().await;
    let llm = Arc::new(
        MockLlm::new(
            MockReply::text("改进后的稿子。"),
            MockReply::text(verdict(true, 40)),
        )
        .queue_review(MockReply::text(verdict(false, 25))),
    );
    let orchestrator = orchestrator(llm.clone(), &repo);

    let state = orchestrator.run(&input(style_id, 3)).await.unwrap();

    assert_eq!(state.status, WorkflowStatus::AwaitingDecision);
    assert_eq!(state.retry_count, 1);
    assert_eq!(llm.rewrite_calls(), 2);
    assert_eq!(repo.rewrite_count().await, 1);
    assert_eq!(repo.review_count().await, 2);
}

#[tokio::test]
async fn test_skip_to_cover_resumes_once() {
    let (repo, style_id) = repo_with_style().await;
    let orchestrator = orchestrator(passing_llm(), &repo);

    let state = orchestrator.run(&input(style_id, 3)).await.unwrap();
    let rewrite_id = state.rewrite_id.unwrap();

    let finished = orchestrator.resume_skip_to_cover(rewrite_id).await.unwrap();
    assert_eq!(finished.status, WorkflowStatus::Completed);
    assert_eq!(finished.current_step, Some(Step::Cover));
    assert_eq!(finished.user_decision, HumanDecision::SkipToCover);
    assert!(finished.cover.is_none());

    let again = orchestrator.resume_skip_to_cover(rewrite_id).await.unwrap_err();
    assert!(again.is_not_found());
    assert!(!again.is_validation());
}

#[tokio::test]
async fn test_unrecognized_decision_goes_to_cover() {
    let (repo, style_id) = repo_with_style().await;
    let orchestrator = orchestrator(passing_llm(), &repo);

    let state = orchestrator.run(&input(style_id, 3)).await.unwrap();
    let rewrite_id = state.rewrite_id.unwrap();

    let finished = orchestrator
        .resume_with_decision(rewrite_id, "publish_everywhere", None)
        .await
        .unwrap();
    assert_eq!(finished.status, WorkflowStatus::Completed);
    assert_eq!(finished.current_step, Some(Step::Cover));
}

#[tokio::test]
async fn test_manual_edit_overwrites_record() {
    let (repo, style_id) = repo_with_style().await;
    let orchestrator = orchestrator(passing_llm(), &repo);

    let state = orchestrator.run(&input(style_id, 3)).await.unwrap();
    let rewrite_id = state.rewrite_id.unwrap();

    let stream = orchestrator
        .resume_stream(rewrite_id, HumanDecision::ManualEdit, Some("人工 定稿".into()))
        .await
        .unwrap();
    let nodes: Vec<Step> = stream
        .filter_map(|event| async move {
            match event {
                WorkflowEvent::Node { node, .. } => Some(node),
                WorkflowEvent::Step(_) => None,
            }
        })
        .collect()
        .await;
    assert_eq!(nodes, vec![Step::ManualEdit, Step::Cover]);

    let record = repo.get_rewrite(rewrite_id).await.unwrap().unwrap();
    assert_eq!(record.final_content, "人工 定稿");
    assert_eq!(record.actual_words, 4);
}

#[tokio::test]
async fn test_manual_edit_requires_text() {
    let (repo, style_id) = repo_with_style().await;
    let orchestrator = orchestrator(passing_llm(), &repo);

    let state = orchestrator.run(&input(style_id, 3)).await.unwrap();
    let rewrite_id = state.rewrite_id.unwrap();

    let err = orchestrator
        .resume_with_manual_edit(rewrite_id, "  ")
        .await
        .unwrap_err();
    assert!(err.is_validation());
    // Still suspended
    assert_eq!(orchestrator.store().len().await, 1);

    let finished = orchestrator
        .resume_with_manual_edit(rewrite_id, "改好了")
        .await
        .unwrap();
    assert_eq!(finished.rewritten_content, "改好了");
    assert_eq!(finished.manual_edit_content, "改好了");
    assert_eq!(finished.status, WorkflowStatus::Completed);
}

#[tokio::test]
async fn test_resume_unknown_id_is_not_found() {
    let (repo, _) = repo_with_style().await;
    let orchestrator = orchestrator(passing_llm(), &repo);

    let err = orchestrator.resume_skip_to_cover(404).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_stream_forwards_step_events_before_nodes() {
    let (repo, style_id) = repo_with_style().await;
    let orchestrator = orchestrator(passing_llm(), &repo);

    let events: Vec<WorkflowEvent> = orchestrator
        .run_stream(&input(style_id, 3))
        .await
        .unwrap()
        .collect()
        .await;

    assert!(matches!(
        events.first(),
        Some(WorkflowEvent::Step(StepEvent::Start {
            step: Step::Rewrite,
            ..
        }))
    ));
    let first_node = events
        .iter()
        .position(|e| matches!(e, WorkflowEvent::Node { .. }))
        .unwrap();
    assert!(matches!(
        events[first_node - 1],
        WorkflowEvent::Step(StepEvent::Done(_))
    ));
    let last = events.last().unwrap().to_json_line();
    assert!(last.starts_with(r#"{"node":"decision","state":"#));
}

#[tokio::test]
async fn test_step_error_fails_the_run() {
    let (repo, style_id) = repo_with_style().await;
    let llm = Arc::new(MockLlm::new(
        MockReply::Refuse("quota exceeded".into()),
        MockReply::text(verdict(true, 45)),
    ));
    let orchestrator = orchestrator(llm.clone(), &repo);

    let events: Vec<WorkflowEvent> = orchestrator
        .run_stream(&input(style_id, 3))
        .await
        .unwrap()
        .collect()
        .await;

    let error_at = events
        .iter()
        .position(|e| matches!(e, WorkflowEvent::Step(StepEvent::Error { .. })))
        .unwrap();
    let WorkflowEvent::Node { node, state } = &events[error_at + 1] else {
        panic!("expected node after error");
    };
    assert_eq!(*node, Step::Rewrite);
    assert_eq!(state.status, WorkflowStatus::Failed);
    assert!(state.error_message.as_deref().unwrap().contains("quota exceeded"));
    assert_eq!(events.len(), error_at + 2);
    assert_eq!(llm.review_calls(), 0);
}

#[tokio::test]
async fn test_unparseable_review_fails_the_run() {
    let (repo, style_id) = repo_with_style().await;
    let llm = Arc::new(MockLlm::new(
        MockReply::text("改写后的稿子。"),
        MockReply::text("我觉得写得挺好，可以发。"),
    ));
    let orchestrator = orchestrator(llm.clone(), &repo);

    let state = orchestrator.run(&input(style_id, 3)).await.unwrap();

    assert_eq!(state.status, WorkflowStatus::Failed);
    assert_eq!(state.current_step, Some(Step::Review));
    assert!(state.error_message.as_deref().unwrap().contains("无法解析响应"));
    assert_eq!(llm.rewrite_calls(), 1);
    assert_eq!(llm.review_calls(), 1);
    assert!(orchestrator.store().is_empty().await);

    let reviews = repo.list_reviews(state.rewrite_id.unwrap()).await.unwrap();
    assert_eq!(reviews[0].feedback.as_ref().unwrap()["raw"], "我觉得写得挺好，可以发。");
}

#[tokio::test]
async fn test_validation_happens_before_streaming() {
    let (repo, style_id) = repo_with_style().await;
    let llm = passing_llm();
    let orchestrator = orchestrator(llm.clone(), &repo);

    let too_many = orchestrator.run_stream(&input(style_id, 11)).await;
    assert!(too_many.err().unwrap().is_validation());

    let unknown_style = orchestrator.run(&input(style_id + 50, 3)).await.unwrap_err();
    assert!(unknown_style.is_validation());

    assert_eq!(repo.rewrite_count().await, 0);
    assert_eq!(llm.rewrite_calls(), 0);
}

#[tokio::test]
async fn test_separate_runs_suspend_independently() {
    let (repo, style_id) = repo_with_style().await;
    let orchestrator = orchestrator(passing_llm(), &repo);

    let first = orchestrator.run(&input(style_id, 3)).await.unwrap();
    let second = orchestrator.run(&input(style_id, 3)).await.unwrap();
    assert_ne!(first.rewrite_id, second.rewrite_id);
    assert_eq!(orchestrator.store().len().await, 2);

    orchestrator
        .resume_skip_to_cover(first.rewrite_id.unwrap())
        .await
        .unwrap();
    assert_eq!(orchestrator.store().len().await, 1);
    assert!(
        orchestrator
            .store()
            .get(second.rewrite_id.unwrap())
            .await
            .unwrap()
            .is_some()
    );
}
