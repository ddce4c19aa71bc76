//! Tests for the review step.

mod test_utils;

use scrivener_core::{DonePayload, RecordStatus, ReviewDone, ReviewResult, Step, StepEvent};
use scrivener_interface::ReviewRepository;
use scrivener_workflow::{InMemoryRepository, ReviewStep, collect_step};
use std::sync::Arc;
use test_utils::{MockLlm, MockReply, verdict};

fn step(llm: Arc<MockLlm>, repo: &InMemoryRepository) -> ReviewStep {
    ReviewStep::new(llm, Arc::new(repo.clone()))
}

fn review_done(events: &[StepEvent]) -> ReviewDone {
    match events.last() {
        Some(StepEvent::Done(DonePayload::Review(done))) => done.clone(),
        other => panic!("expected review done, got {other:?}"),
    }
}

#[tokio::test]
async fn test_score_floor_overrides_model_pass() {
    let repo = InMemoryRepository::new();
    let llm = Arc::new(MockLlm::new(MockReply::text("x"), MockReply::text(verdict(true, 30))));
    let step = step(llm, &repo);

    let record = step.create_review(1, "待审内容", 0).await.unwrap();
    let events = collect_step(step.execute(record.id, "风格".into())).await;

    assert_eq!(
        events[0],
        StepEvent::Start {
            step: Step::Review,
            record_id: record.id
        }
    );
    let done = review_done(&events);
    assert!(!done.passed);
    assert_eq!(done.total_score, 30);
    assert_eq!(done.ai_score, 7);
    assert_eq!(done.result, "测试结论");

    let stored = repo.get_review(record.id).await.unwrap().unwrap();
    assert_eq!(stored.result, ReviewResult::Failed);
    assert_eq!(stored.status, RecordStatus::Completed);
    assert_eq!(stored.total_score, Some(30));
    assert_eq!(stored.feedback.unwrap()["quality_scores"]["total"], 30.0);
}

#[tokio::test]
async fn test_passing_verdict_at_threshold() {
    let repo = InMemoryRepository::new();
    let llm = Arc::new(MockLlm::new(MockReply::text("x"), MockReply::text(verdict(true, 35))));
    let step = step(llm, &repo);

    let record = step.create_review(1, "待审内容", 0).await.unwrap();
    let done = review_done(&collect_step(step.execute(record.id, "风格".into())).await);
    assert!(done.passed);
}

#[tokio::test]
async fn test_model_fail_is_honored_above_threshold() {
    let repo = InMemoryRepository::new();
    let llm = Arc::new(MockLlm::new(MockReply::text("x"), MockReply::text(verdict(false, 45))));
    let step = step(llm, &repo);

    let record = step.create_review(1, "待审内容", 0).await.unwrap();
    let done = review_done(&collect_step(step.execute(record.id, "风格".into())).await);
    assert!(!done.passed);
}

#[tokio::test]
async fn test_custom_threshold() {
    let repo = InMemoryRepository::new();
    let llm = Arc::new(MockLlm::new(MockReply::text("x"), MockReply::text(verdict(true, 30))));
    let step = step(llm, &repo).with_pass_threshold(25);

    let record = step.create_review(1, "待审内容", 0).await.unwrap();
    let done = review_done(&collect_step(step.execute(record.id, "风格".into())).await);
    assert!(done.passed);
}

#[tokio::test]
async fn test_fenced_verdict_split_across_fragments() {
    let repo = InMemoryRepository::new();
    let reply = format!("<think>先打分</think>结果如下：\n```json\n{}\n```", verdict(true, 42));
    let mid = reply.char_indices().nth(reply.chars().count() / 2).unwrap().0;
    let (a, b) = reply.split_at(mid);
    let llm = Arc::new(MockLlm::new(
        MockReply::text("x"),
        MockReply::Fragments(vec![a.to_string(), b.to_string()]),
    ));
    let step = step(llm, &repo);

    let record = step.create_review(1, "待审内容", 0).await.unwrap();
    let done = review_done(&collect_step(step.execute(record.id, "风格".into())).await);
    assert!(done.passed);
    assert_eq!(done.total_score, 42);
}

#[tokio::test]
async fn test_unparseable_reply_fails_the_step_and_keeps_raw_text() {
    let repo = InMemoryRepository::new();
    let llm = Arc::new(MockLlm::new(
        MockReply::text("x"),
        MockReply::text("整体不错，建议通过。"),
    ));
    let step = step(llm, &repo);

    let record = step.create_review(1, "待审内容", 0).await.unwrap();
    let events = collect_step(step.execute(record.id, "风格".into())).await;
    assert!(!events.iter().any(|e| matches!(e, StepEvent::Done(_))));
    match events.last() {
        Some(StepEvent::Error { message }) => assert!(message.contains("无法解析响应")),
        other => panic!("expected error, got {other:?}"),
    }

    let stored = repo.get_review(record.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RecordStatus::Failed);
    assert_eq!(stored.result, ReviewResult::Pending);
    assert_eq!(stored.total_score, None);
    assert!(stored.error_message.unwrap().contains("无法解析响应"));
    let feedback = stored.feedback.unwrap();
    assert_eq!(feedback["raw"], "整体不错，建议通过。");
    assert_eq!(feedback["error"], "无法解析响应");
}

#[tokio::test]
async fn test_off_schema_verdict_still_scores() {
    let repo = InMemoryRepository::new();
    let llm = Arc::new(MockLlm::new(
        MockReply::text("x"),
        MockReply::text(
            r#"{"ai_detection":{"has_ai_smell":"轻微"},"quality_scores":{"directness":"8","total":42},"issues":["开头太套路"],"passed":true}"#,
        ),
    ));
    let step = step(llm, &repo);

    let record = step.create_review(1, "待审内容", 0).await.unwrap();
    let done = review_done(&collect_step(step.execute(record.id, "风格".into())).await);
    assert!(done.passed);
    assert_eq!(done.total_score, 42);
    assert_eq!(done.ai_score, 10);

    let stored = repo.get_review(record.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RecordStatus::Completed);
    assert_eq!(stored.feedback.unwrap()["issues"][0], "开头太套路");
}

#[tokio::test]
async fn test_stream_failure_marks_review_failed() {
    let repo = InMemoryRepository::new();
    let llm = Arc::new(MockLlm::new(
        MockReply::text("x"),
        MockReply::BreakAfter(vec!["{\"passed\":".into()], "timeout".into()),
    ));
    let step = step(llm, &repo);

    let record = step.create_review(1, "待审内容", 0).await.unwrap();
    let events = collect_step(step.execute(record.id, "风格".into())).await;
    assert!(events.last().unwrap().is_error());

    let stored = repo.get_review(record.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RecordStatus::Failed);
    assert_eq!(stored.result, ReviewResult::Pending);
    assert!(stored.error_message.is_some());
}

#[tokio::test]
async fn test_rounds_increment_per_rewrite() {
    let repo = InMemoryRepository::new();
    let llm = Arc::new(MockLlm::new(MockReply::text("x"), MockReply::text("{}")));
    let step = step(llm, &repo);

    let first = step.create_review(7, "第一稿", 0).await.unwrap();
    let second = step.create_review(7, "第二稿", 1).await.unwrap();
    let other = step.create_review(8, "别的稿子", 0).await.unwrap();

    assert_eq!(first.round, 1);
    assert_eq!(second.round, 2);
    assert_eq!(second.retry_count, 1);
    assert_eq!(other.round, 1);

    let newest_first: Vec<u32> = step
        .reviews_for(7)
        .await
        .unwrap()
        .iter()
        .map(|r| r.round)
        .collect();
    assert_eq!(newest_first, vec![2, 1]);
}

#[tokio::test]
async fn test_review_prompt_carries_style_and_content() {
    let repo = InMemoryRepository::new();
    let llm = Arc::new(MockLlm::new(MockReply::text("x"), MockReply::text(verdict(true, 40))));
    let step = step(llm.clone(), &repo);

    let record = step.create_review(1, "这是待审的正文", 0).await.unwrap();
    collect_step(step.execute(record.id, "风格名称: 冷静叙事".into())).await;

    let prompt = &llm.prompts()[0];
    assert!(prompt.contains("风格名称: 冷静叙事"));
    assert!(prompt.contains("这是待审的正文"));
}
