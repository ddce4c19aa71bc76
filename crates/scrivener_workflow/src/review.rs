//! The review step: score a rewrite and decide pass or fail.

use crate::prompts::{REVIEW_SYSTEM, review_prompt};
use crate::{StepStream, parse_review_feedback, sanitized};
use futures_util::StreamExt;
use scrivener_core::{
    ChatRequest, DonePayload, NewReview, RecordStatus, ReviewDone, ReviewFeedback, ReviewRecord,
    ReviewResult, Step, StepEvent,
};
use scrivener_error::{
    ModelError, ModelErrorKind, ScrivenerError, ScrivenerResult, ValidationError,
    ValidationErrorKind,
};
use scrivener_interface::{ReviewRepository, Streaming};
use std::sync::Arc;

/// Scores at or above this pass, provided the reviewer also passes the text.
pub const DEFAULT_PASS_THRESHOLD: i64 = 35;

/// Reviews rewritten content with a language model.
#[derive(Clone)]
pub struct ReviewStep {
    llm: Arc<dyn Streaming>,
    reviews: Arc<dyn ReviewRepository>,
    pass_threshold: i64,
}

impl std::fmt::Debug for ReviewStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewStep")
            .field("model", &self.llm.model_name())
            .field("pass_threshold", &self.pass_threshold)
            .finish()
    }
}

impl ReviewStep {
    /// Create a step with the default pass threshold.
    pub fn new(llm: Arc<dyn Streaming>, reviews: Arc<dyn ReviewRepository>) -> Self {
        Self {
            llm,
            reviews,
            pass_threshold: DEFAULT_PASS_THRESHOLD,
        }
    }

    /// Override the minimum passing total.
    pub fn with_pass_threshold(mut self, pass_threshold: i64) -> Self {
        self.pass_threshold = pass_threshold;
        self
    }

    /// Minimum passing total.
    pub fn pass_threshold(&self) -> i64 {
        self.pass_threshold
    }

    /// Create the next review round for a rewrite.
    #[tracing::instrument(skip(self, content), fields(content_len = content.len()))]
    pub async fn create_review(
        &self,
        rewrite_id: i64,
        content: &str,
        retry_count: u32,
    ) -> ScrivenerResult<ReviewRecord> {
        let prior = self.reviews.list_reviews(rewrite_id).await?.len();
        let round = prior as u32 + 1;
        self.reviews
            .insert_review(NewReview {
                rewrite_id,
                content: content.to_string(),
                round,
                retry_count,
            })
            .await
    }

    /// Reviews of a rewrite, newest round first.
    pub async fn reviews_for(&self, rewrite_id: i64) -> ScrivenerResult<Vec<ReviewRecord>> {
        let mut reviews = self.reviews.list_reviews(rewrite_id).await?;
        reviews.reverse();
        Ok(reviews)
    }

    async fn mark_failed(&self, record: &mut ReviewRecord, err: &ScrivenerError) -> StepEvent {
        tracing::error!(review_id = record.id, error = %err, "Review failed");
        record.status = RecordStatus::Failed;
        record.error_message = Some(err.user_message());
        if let Err(e) = self.reviews.update_review(record).await {
            tracing::error!(review_id = record.id, error = %e, "Could not persist review failure");
        }
        StepEvent::error(err.user_message())
    }

    /// Run a review against an existing record.
    ///
    /// Events: `start`, `progress`, `content` deltas of the reviewer's
    /// reply, then `done`. A reply with no JSON verdict is kept on the
    /// record as `{error, raw}` feedback, the record is marked failed, and
    /// the stream ends with `error`.
    pub fn execute(&self, review_id: i64, style_summary: String) -> StepStream {
        let step = self.clone();
        Box::pin(async_stream::stream! {
            let mut record = match step.reviews.get_review(review_id).await {
                Ok(Some(record)) => record,
                Ok(None) => {
                    let err = ValidationError::new(ValidationErrorKind::ReviewNotFound(review_id));
                    yield StepEvent::error(err.kind.to_string());
                    return;
                }
                Err(e) => {
                    yield StepEvent::error(e.user_message());
                    return;
                }
            };

            yield StepEvent::Start { step: Step::Review, record_id: record.id };
            yield StepEvent::progress("review", "正在审核...");

            let request = ChatRequest::single(
                review_prompt(&style_summary, &record.content),
                Some(REVIEW_SYSTEM),
            );
            let mut fragments = match step.llm.chat_stream(&request).await {
                Ok(stream) => sanitized(stream),
                Err(e) => {
                    yield step.mark_failed(&mut record, &e).await;
                    return;
                }
            };

            let mut reply = String::new();
            let mut failure = None;
            while let Some(item) = fragments.next().await {
                match item {
                    Ok(delta) => {
                        reply.push_str(&delta);
                        yield StepEvent::content(delta);
                    }
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }
            if let Some(e) = failure {
                yield step.mark_failed(&mut record, &e).await;
                return;
            }

            let feedback = parse_review_feedback(&reply);
            if let ReviewFeedback::Unparsed { error, .. } = &feedback {
                let e = ScrivenerError::from(ModelError::new(ModelErrorKind::Deserialization(
                    format!("review reply: {error}"),
                )));
                record.feedback = Some(feedback.to_value());
                yield step.mark_failed(&mut record, &e).await;
                return;
            }
            let total_score = feedback.total_score();
            let ai_score = feedback.ai_score();
            let passed = feedback.passes(step.pass_threshold);
            if feedback.claims_pass() && !passed {
                tracing::info!(
                    review_id,
                    total_score,
                    threshold = step.pass_threshold,
                    "Score below threshold, overriding reviewer pass"
                );
            }

            record.feedback = Some(feedback.to_value());
            record.ai_score = Some(ai_score);
            record.total_score = Some(total_score);
            record.result = if passed { ReviewResult::Passed } else { ReviewResult::Failed };
            record.status = RecordStatus::Completed;
            if let Err(e) = step.reviews.update_review(&record).await {
                yield step.mark_failed(&mut record, &e).await;
                return;
            }
            tracing::info!(review_id, round = record.round, total_score, passed, "Review completed");

            yield StepEvent::Done(DonePayload::Review(ReviewDone {
                passed,
                total_score,
                ai_score,
                result: feedback.reason().unwrap_or("审核完成").to_string(),
            }));
        })
    }
}
