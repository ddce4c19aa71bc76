//! Workflow state threaded through every step of a rewrite run.

use serde::{Deserialize, Serialize};

/// The finite set of workflow steps.
///
/// # Examples
///
/// ```
/// use scrivener_core::Step;
///
/// assert_eq!(Step::ManualEdit.to_string(), "manual_edit");
/// assert_eq!("cover".parse::<Step>().unwrap(), Step::Cover);
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Step {
    /// Generate rewritten content
    Rewrite,
    /// Score the rewritten content
    Review,
    /// Suspend for a human decision
    Decision,
    /// Apply human-edited content
    ManualEdit,
    /// Produce the cover, terminal
    Cover,
}

/// Result of the most recent review.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewOutcome {
    /// No review has completed yet
    #[default]
    Unset,
    /// Review passed
    Passed,
    /// Review failed
    Failed,
}

/// The human choice made at the decision gate.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HumanDecision {
    /// No decision yet
    #[default]
    Pending,
    /// Replace the model output with edited text
    ManualEdit,
    /// Go straight to the cover step
    SkipToCover,
}

impl HumanDecision {
    /// Parse a decision, mapping anything unrecognized to [`HumanDecision::Pending`].
    ///
    /// ```
    /// use scrivener_core::HumanDecision;
    ///
    /// assert_eq!(HumanDecision::parse_lenient("manual_edit"), HumanDecision::ManualEdit);
    /// assert_eq!(HumanDecision::parse_lenient(" skip_to_cover "), HumanDecision::SkipToCover);
    /// assert_eq!(HumanDecision::parse_lenient("publish"), HumanDecision::Pending);
    /// ```
    pub fn parse_lenient(value: &str) -> Self {
        value.trim().parse().unwrap_or_default()
    }
}

/// Why a workflow run stopped, or that it is still going.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Steps are still executing
    #[default]
    Running,
    /// Suspended at the decision gate
    AwaitingDecision,
    /// Reached the cover step
    Completed,
    /// Review kept failing until the retry ceiling was hit
    RetriesExhausted,
    /// A step reported an error
    Failed,
}

impl WorkflowStatus {
    /// True once no further step will run without outside input.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkflowStatus::Running)
    }
}

/// A generated cover image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverReference {
    /// Where the image can be fetched
    pub image_url: String,
    /// Prompt the image was generated from
    pub prompt: String,
    /// Pixel size, e.g. `2048x2048`
    pub size: String,
}

/// Parameters for starting a workflow.
///
/// # Examples
///
/// ```
/// use scrivener_core::WorkflowInput;
///
/// let input = WorkflowInput::builder()
///     .source_article("原文")
///     .style_id(1)
///     .target_words(800u32)
///     .max_retries(2u32)
///     .build()
///     .unwrap();
///
/// assert_eq!(input.target_words, 800);
/// assert!(!input.enable_rag);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_builder::Builder)]
#[builder(setter(into))]
pub struct WorkflowInput {
    /// Source text, or an http(s) URL to fetch it from
    pub source_article: String,
    /// Target writing style
    pub style_id: i64,
    /// Desired length in characters
    #[builder(default = "1000")]
    pub target_words: u32,
    /// Whether to look up reference material
    #[builder(default)]
    pub enable_rag: bool,
    /// Number of snippets to retrieve
    #[builder(default = "3")]
    pub rag_top_k: usize,
    /// Retries allowed after the first failed review
    #[builder(default = "3")]
    pub max_retries: u32,
}

impl WorkflowInput {
    /// Creates a new input builder.
    pub fn builder() -> WorkflowInputBuilder {
        WorkflowInputBuilder::default()
    }
}

/// The single mutable record threaded through every step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    /// Source text (resolved from a URL when one was given)
    pub source_article: String,
    /// Target writing style
    pub style_id: i64,
    /// Desired length in characters
    pub target_words: u32,
    /// Whether retrieval is enabled
    pub enable_rag: bool,
    /// Number of snippets to retrieve
    pub rag_top_k: usize,
    /// Latest rewritten content
    pub rewritten_content: String,
    /// Outcome of the latest review
    pub review_outcome: ReviewOutcome,
    /// Latest review feedback, passed through opaquely
    pub review_feedback: serde_json::Value,
    /// Latest review total score
    pub review_score: i64,
    /// Persisted rewrite record
    pub rewrite_id: Option<i64>,
    /// Latest persisted review record
    pub review_id: Option<i64>,
    /// Decision supplied at the gate
    pub user_decision: HumanDecision,
    /// Human-edited replacement content
    pub manual_edit_content: String,
    /// Retries already granted
    pub retry_count: u32,
    /// Retry ceiling
    pub max_retries: u32,
    /// Last step that ran; `None` before the first
    pub current_step: Option<Step>,
    /// Run status
    pub status: WorkflowStatus,
    /// Message of the step error that ended the run
    pub error_message: Option<String>,
    /// Generated cover, when a generator is configured
    pub cover: Option<CoverReference>,
}

impl WorkflowState {
    /// Fresh state for a new run.
    pub fn new(input: &WorkflowInput) -> Self {
        Self {
            source_article: input.source_article.clone(),
            style_id: input.style_id,
            target_words: input.target_words,
            enable_rag: input.enable_rag,
            rag_top_k: input.rag_top_k,
            rewritten_content: String::new(),
            review_outcome: ReviewOutcome::Unset,
            review_feedback: serde_json::Value::Null,
            review_score: 0,
            rewrite_id: None,
            review_id: None,
            user_decision: HumanDecision::Pending,
            manual_edit_content: String::new(),
            retry_count: 0,
            max_retries: input.max_retries,
            current_step: None,
            status: WorkflowStatus::Running,
            error_message: None,
            cover: None,
        }
    }

    /// Whether another rewrite attempt is allowed after a failed review.
    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }

    /// Mark the run failed with a message.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = WorkflowStatus::Failed;
        self.error_message = Some(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn input() -> WorkflowInput {
        WorkflowInput::builder()
            .source_article("正文")
            .style_id(7)
            .max_retries(2u32)
            .build()
            .unwrap()
    }

    #[test]
    fn new_state_starts_unset() {
        let state = WorkflowState::new(&input());
        assert_eq!(state.current_step, None);
        assert_eq!(state.review_outcome, ReviewOutcome::Unset);
        assert_eq!(state.user_decision, HumanDecision::Pending);
        assert_eq!(state.status, WorkflowStatus::Running);
        assert_eq!(state.target_words, 1000);
        assert_eq!(state.rag_top_k, 3);
    }

    #[test]
    fn can_retry_is_exclusive_at_ceiling() {
        let mut state = WorkflowState::new(&input());
        assert!(state.can_retry());
        state.retry_count = 1;
        assert!(state.can_retry());
        state.retry_count = 2;
        assert!(!state.can_retry());
    }

    #[test]
    fn step_names_round_trip_through_strings() {
        for step in Step::iter() {
            assert_eq!(step.to_string().parse::<Step>().unwrap(), step);
        }
        assert!("decision_gate".parse::<Step>().is_err());
    }

    #[test]
    fn state_serializes_step_in_snake_case() {
        let mut state = WorkflowState::new(&input());
        state.current_step = Some(Step::ManualEdit);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["current_step"], "manual_edit");
        assert_eq!(json["user_decision"], "pending");
        assert_eq!(json["review_outcome"], "unset");
    }
}
