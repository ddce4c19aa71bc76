//! The workflow state machine.
//!
//! `rewrite → review → (rewrite | decision | end) → (manual_edit | cover) → cover → end`
//!
//! Every entry point drives the same loop; the run-to-completion forms
//! just drain the event stream and keep the last snapshot.

use crate::transition::{AfterReview, after_decision, after_review};
use crate::{
    InMemorySuspendedStore, ReviewStep, RewriteStep, StepStream, WorkflowStream,
    count_actual_words,
};
use futures_util::StreamExt;
use scrivener_config::{MAX_RETRY_CEILING, WorkflowConfig};
use scrivener_core::{
    DonePayload, HumanDecision, NewRewrite, RecordStatus, ReviewDone, ReviewOutcome, RewriteDone,
    Step, StepEvent, WorkflowEvent, WorkflowInput, WorkflowState, WorkflowStatus,
};
use scrivener_error::{
    BuilderError, BuilderErrorKind, ScrivenerError, ScrivenerResult, ValidationError,
    ValidationErrorKind, WorkflowError, WorkflowErrorKind,
};
use scrivener_interface::{
    ArticleFetcher, CoverGenerator, CoverRequest, Retrieval, ReviewRepository, RewriteRepository,
    Streaming, StyleRepository, SuspendedWorkflowStore,
};
use std::sync::Arc;

const COVER_TITLE_CHARS: usize = 100;

/// What a step stream ended with.
enum StepEnd<T> {
    Done(T),
    Failed(String),
}

/// Runs rewrite/review/decision workflows and resumes suspended ones.
///
/// # Example
///
/// ```no_run
/// use scrivener_core::{WorkflowInput, WorkflowStatus};
/// use scrivener_interface::Streaming;
/// use scrivener_workflow::{InMemoryRepository, WorkflowOrchestrator};
/// use std::sync::Arc;
///
/// # async fn demo(llm: Arc<dyn Streaming>) -> scrivener_error::ScrivenerResult<()> {
/// let repo = Arc::new(InMemoryRepository::new());
/// let orchestrator = WorkflowOrchestrator::new(llm, repo);
///
/// let input = WorkflowInput::builder()
///     .source_article("原文……")
///     .style_id(1)
///     .build()
///     .expect("valid input");
/// let state = orchestrator.run(&input).await?;
/// if state.status == WorkflowStatus::AwaitingDecision {
///     let rewrite_id = state.rewrite_id.expect("suspended run has a rewrite");
///     orchestrator.resume_skip_to_cover(rewrite_id).await?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct WorkflowOrchestrator {
    rewrite: RewriteStep,
    review: ReviewStep,
    rewrites: Arc<dyn RewriteRepository>,
    reviews: Arc<dyn ReviewRepository>,
    store: Arc<dyn SuspendedWorkflowStore>,
    covers: Option<Arc<dyn CoverGenerator>>,
    cover_size: String,
}

impl std::fmt::Debug for WorkflowOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowOrchestrator")
            .field("rewrite", &self.rewrite)
            .field("review", &self.review)
            .field("has_cover_generator", &self.covers.is_some())
            .field("cover_size", &self.cover_size)
            .finish()
    }
}

impl WorkflowOrchestrator {
    /// Create an orchestrator over one repository that stores styles,
    /// rewrites and reviews.
    pub fn new<R>(llm: Arc<dyn Streaming>, repository: Arc<R>) -> Self
    where
        R: StyleRepository + RewriteRepository + ReviewRepository + 'static,
    {
        let styles: Arc<dyn StyleRepository> = repository.clone();
        let rewrites: Arc<dyn RewriteRepository> = repository.clone();
        let reviews: Arc<dyn ReviewRepository> = repository;
        Self::from_steps(
            RewriteStep::new(llm.clone(), styles, rewrites.clone()),
            ReviewStep::new(llm, reviews.clone()),
            rewrites,
            reviews,
        )
    }

    /// Create an orchestrator from configured steps.
    pub fn from_steps(
        rewrite: RewriteStep,
        review: ReviewStep,
        rewrites: Arc<dyn RewriteRepository>,
        reviews: Arc<dyn ReviewRepository>,
    ) -> Self {
        Self {
            rewrite,
            review,
            rewrites,
            reviews,
            store: Arc::new(InMemorySuspendedStore::new()),
            covers: None,
            cover_size: "2k".to_string(),
        }
    }

    /// Apply workflow policy from configuration.
    pub fn with_config(mut self, config: &WorkflowConfig) -> Self {
        self.rewrite = self.rewrite.with_max_source_chars(*config.max_source_chars());
        self.review = self.review.with_pass_threshold(*config.pass_threshold());
        self
    }

    /// Keep suspended workflows in this store.
    pub fn with_store(mut self, store: Arc<dyn SuspendedWorkflowStore>) -> Self {
        self.store = store;
        self
    }

    /// Accept URL sources.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn ArticleFetcher>) -> Self {
        self.rewrite = self.rewrite.with_fetcher(fetcher);
        self
    }

    /// Retrieve materials for RAG-enabled runs.
    pub fn with_retrieval(mut self, retrieval: Arc<dyn Retrieval>) -> Self {
        self.rewrite = self.rewrite.with_retrieval(retrieval);
        self
    }

    /// Generate a cover in the cover step. Without one the step only marks
    /// the run complete.
    pub fn with_cover_generator(mut self, covers: Arc<dyn CoverGenerator>) -> Self {
        self.covers = Some(covers);
        self
    }

    /// Size label passed to the cover generator.
    pub fn with_cover_size(mut self, size: impl Into<String>) -> Self {
        self.cover_size = size.into();
        self
    }

    /// The rewrite step.
    pub fn rewrite_step(&self) -> &RewriteStep {
        &self.rewrite
    }

    /// The review step.
    pub fn review_step(&self) -> &ReviewStep {
        &self.review
    }

    /// The suspended-workflow store.
    pub fn store(&self) -> &Arc<dyn SuspendedWorkflowStore> {
        &self.store
    }

    /// Validate input and create the rewrite record, returning the initial state.
    #[tracing::instrument(skip(self, input), fields(style_id = input.style_id))]
    pub async fn prepare(&self, input: &WorkflowInput) -> ScrivenerResult<WorkflowState> {
        if input.max_retries > MAX_RETRY_CEILING {
            return Err(ValidationError::new(ValidationErrorKind::InvalidRetryCeiling {
                value: input.max_retries,
                max: MAX_RETRY_CEILING,
            })
            .into());
        }
        let record = self
            .rewrite
            .create(NewRewrite {
                source_article: input.source_article.clone(),
                style_id: input.style_id,
                target_words: input.target_words,
                enable_rag: input.enable_rag,
                rag_top_k: input.rag_top_k,
            })
            .await?;

        let mut state = WorkflowState::new(input);
        state.source_article = record.source_article;
        state.rewrite_id = Some(record.id);
        Ok(state)
    }

    /// Start a workflow and stream its events.
    ///
    /// # Errors
    ///
    /// Validation errors are returned here, before any step runs. Failures
    /// inside steps arrive as events and end the stream with a `Failed` state.
    pub async fn run_stream(&self, input: &WorkflowInput) -> ScrivenerResult<WorkflowStream> {
        let state = self.prepare(input).await?;
        let rewrite_id = required_rewrite_id(&state)?;
        tracing::info!(rewrite_id, max_retries = state.max_retries, "Starting workflow");
        Ok(self.drive(state, rewrite_id, Step::Rewrite))
    }

    /// Run a workflow until it ends or suspends, returning the last state.
    pub async fn run(&self, input: &WorkflowInput) -> ScrivenerResult<WorkflowState> {
        let stream = self.run_stream(input).await?;
        last_state(stream).await
    }

    /// Resume a suspended workflow and stream its events.
    ///
    /// A manual edit needs non-blank `edited` text. Pending decisions go to
    /// the cover step.
    ///
    /// # Errors
    ///
    /// A validation error for a blank manual edit; a not-found workflow
    /// error when nothing is suspended under `rewrite_id`.
    #[tracing::instrument(skip(self, edited))]
    pub async fn resume_stream(
        &self,
        rewrite_id: i64,
        decision: HumanDecision,
        edited: Option<String>,
    ) -> ScrivenerResult<WorkflowStream> {
        let edited = match decision {
            HumanDecision::ManualEdit => match edited {
                Some(text) if !text.trim().is_empty() => Some(text),
                _ => return Err(ValidationError::new(ValidationErrorKind::EmptyEdit).into()),
            },
            _ => None,
        };

        let mut state = self
            .store
            .take(rewrite_id)
            .await?
            .ok_or_else(|| WorkflowError::new(WorkflowErrorKind::NotSuspended(rewrite_id)))?;

        state.user_decision = decision;
        state.status = WorkflowStatus::Running;
        if let Some(text) = edited {
            state.manual_edit_content = text;
        }
        let next = after_decision(decision);
        tracing::info!(rewrite_id, %decision, next = %next, "Resuming workflow");
        Ok(self.drive(state, rewrite_id, next))
    }

    /// Resume with human-edited content and run to the end.
    pub async fn resume_with_manual_edit(
        &self,
        rewrite_id: i64,
        edited: impl Into<String>,
    ) -> ScrivenerResult<WorkflowState> {
        let stream = self
            .resume_stream(rewrite_id, HumanDecision::ManualEdit, Some(edited.into()))
            .await?;
        last_state(stream).await
    }

    /// Resume straight to the cover step and run to the end.
    pub async fn resume_skip_to_cover(&self, rewrite_id: i64) -> ScrivenerResult<WorkflowState> {
        let stream = self
            .resume_stream(rewrite_id, HumanDecision::SkipToCover, None)
            .await?;
        last_state(stream).await
    }

    /// Resume with a decision given as text. Unrecognized values go to the cover step.
    pub async fn resume_with_decision(
        &self,
        rewrite_id: i64,
        decision: &str,
        edited: Option<String>,
    ) -> ScrivenerResult<WorkflowState> {
        let stream = self
            .resume_stream(rewrite_id, HumanDecision::parse_lenient(decision), edited)
            .await?;
        last_state(stream).await
    }

    async fn apply_manual_edit(&self, rewrite_id: i64, edited: &str) -> ScrivenerResult<()> {
        let mut record = self.rewrites.get_rewrite(rewrite_id).await?.ok_or_else(|| {
            ScrivenerError::from(ValidationError::new(ValidationErrorKind::RewriteNotFound(
                rewrite_id,
            )))
        })?;
        record.final_content = edited.to_string();
        record.actual_words = count_actual_words(edited);
        record.status = RecordStatus::Completed;
        record.error_message = None;
        self.rewrites.update_rewrite(&record).await
    }

    async fn generate_cover(&self, state: &mut WorkflowState) -> ScrivenerResult<()> {
        let Some(covers) = &self.covers else {
            tracing::debug!("No cover generator configured, finishing without a cover");
            return Ok(());
        };
        let title: String = state
            .source_article
            .trim()
            .chars()
            .take(COVER_TITLE_CHARS)
            .collect();
        let request = CoverRequest::builder()
            .title(title)
            .content(state.rewritten_content.clone())
            .size(self.cover_size.clone())
            .build()
            .map_err(|e| BuilderError::new(BuilderErrorKind::ValidationFailed(e.to_string())))?;
        state.cover = Some(covers.generate_cover(&request).await?);
        Ok(())
    }

    async fn feedback_for(&self, review_id: i64) -> serde_json::Value {
        match self.reviews.get_review(review_id).await {
            Ok(Some(record)) => record.feedback.unwrap_or(serde_json::Value::Null),
            Ok(None) => serde_json::Value::Null,
            Err(e) => {
                tracing::warn!(review_id, error = %e, "Could not read back review feedback");
                serde_json::Value::Null
            }
        }
    }

    /// The state machine. Yields forwarded step events and a node snapshot
    /// after every step.
    fn drive(&self, state: WorkflowState, rewrite_id: i64, start: Step) -> WorkflowStream {
        let this = self.clone();
        Box::pin(async_stream::stream! {
            let mut state = state;
            let mut next = Some(start);

            while let Some(current) = next {
                state.current_step = Some(current);
                tracing::debug!(rewrite_id, step = %current, retry_count = state.retry_count, "Entering step");

                next = match current {
                    Step::Rewrite => {
                        let mut events = this.rewrite.execute(rewrite_id);
                        let mut end = None;
                        while let Some(event) = events.next().await {
                            if let Some(found) = rewrite_end(&event) {
                                end = Some(found);
                            }
                            yield WorkflowEvent::Step(event);
                        }
                        match end {
                            Some(StepEnd::Done(done)) => {
                                state.rewritten_content = done.final_content;
                                Some(Step::Review)
                            }
                            Some(StepEnd::Failed(message)) => {
                                state.fail(message);
                                None
                            }
                            None => {
                                state.fail("rewrite ended without a result");
                                None
                            }
                        }
                    }
                    Step::Review => 'review: {
                        let style = match this.rewrite.require_style(state.style_id).await {
                            Ok(style) => style,
                            Err(e) => {
                                state.fail(e.user_message());
                                break 'review None;
                            }
                        };
                        let record = match this
                            .review
                            .create_review(rewrite_id, &state.rewritten_content, state.retry_count)
                            .await
                        {
                            Ok(record) => record,
                            Err(e) => {
                                state.fail(e.user_message());
                                break 'review None;
                            }
                        };
                        state.review_id = Some(record.id);

                        let mut events = this.review.execute(record.id, style.to_summary());
                        let mut end = None;
                        while let Some(event) = events.next().await {
                            if let Some(found) = review_end(&event) {
                                end = Some(found);
                            }
                            yield WorkflowEvent::Step(event);
                        }
                        match end {
                            Some(StepEnd::Done(done)) => {
                                state.review_score = done.total_score;
                                state.review_outcome = if done.passed {
                                    ReviewOutcome::Passed
                                } else {
                                    ReviewOutcome::Failed
                                };
                                state.review_feedback = this.feedback_for(record.id).await;
                                match after_review(&mut state) {
                                    AfterReview::Retry => Some(Step::Rewrite),
                                    AfterReview::Decide => Some(Step::Decision),
                                    AfterReview::Exhausted => None,
                                }
                            }
                            Some(StepEnd::Failed(message)) => {
                                state.fail(message);
                                None
                            }
                            None => {
                                state.fail("review ended without a result");
                                None
                            }
                        }
                    }
                    Step::Decision => {
                        state.user_decision = HumanDecision::Pending;
                        state.status = WorkflowStatus::AwaitingDecision;
                        match this.store.put(rewrite_id, state.clone()).await {
                            Ok(()) => tracing::info!(rewrite_id, "Workflow suspended for a decision"),
                            Err(e) => state.fail(e.user_message()),
                        }
                        None
                    }
                    Step::ManualEdit => {
                        let edited = state.manual_edit_content.clone();
                        match this.apply_manual_edit(rewrite_id, &edited).await {
                            Ok(()) => {
                                state.rewritten_content = edited;
                                Some(Step::Cover)
                            }
                            Err(e) => {
                                state.fail(e.user_message());
                                None
                            }
                        }
                    }
                    Step::Cover => {
                        match this.generate_cover(&mut state).await {
                            Ok(()) => state.status = WorkflowStatus::Completed,
                            Err(e) => {
                                tracing::error!(rewrite_id, error = %e, "Cover generation failed");
                                state.fail(e.user_message());
                            }
                        }
                        None
                    }
                };

                yield WorkflowEvent::node(current, &state);
            }

            tracing::info!(rewrite_id, status = ?state.status, "Workflow stopped");
        })
    }
}

fn required_rewrite_id(state: &WorkflowState) -> ScrivenerResult<i64> {
    state.rewrite_id.ok_or_else(|| {
        WorkflowError::new(WorkflowErrorKind::InvalidState(
            "state has no rewrite record".to_string(),
        ))
        .into()
    })
}

fn rewrite_end(event: &StepEvent) -> Option<StepEnd<RewriteDone>> {
    match event {
        StepEvent::Done(DonePayload::Rewrite(done)) => Some(StepEnd::Done(done.clone())),
        StepEvent::Error { message } => Some(StepEnd::Failed(message.clone())),
        _ => None,
    }
}

fn review_end(event: &StepEvent) -> Option<StepEnd<ReviewDone>> {
    match event {
        StepEvent::Done(DonePayload::Review(done)) => Some(StepEnd::Done(done.clone())),
        StepEvent::Error { message } => Some(StepEnd::Failed(message.clone())),
        _ => None,
    }
}

/// Drain a workflow stream, keeping the last snapshot.
pub async fn last_state(mut stream: WorkflowStream) -> ScrivenerResult<WorkflowState> {
    let mut last = None;
    while let Some(event) = stream.next().await {
        if let WorkflowEvent::Node { state, .. } = event {
            last = Some(*state);
        }
    }
    last.ok_or_else(|| {
        WorkflowError::new(WorkflowErrorKind::InvalidState(
            "workflow produced no state".to_string(),
        ))
        .into()
    })
}

/// Drain a step stream into its events.
pub async fn collect_step(stream: StepStream) -> Vec<StepEvent> {
    stream.collect().await
}
