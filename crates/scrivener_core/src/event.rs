//! Events streamed to callers while a step or workflow runs.

use crate::{Step, WorkflowState};
use serde::{Deserialize, Serialize};

/// Final payload of a rewrite step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteDone {
    /// Sanitized, placeholder-normalized content
    pub final_content: String,
    /// Character count excluding placeholders and whitespace
    pub actual_words: usize,
}

/// Final payload of a review step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewDone {
    /// Outcome after the score floor
    pub passed: bool,
    /// Total out of 50
    pub total_score: i64,
    /// Authenticity sub-score
    pub ai_score: i64,
    /// Reviewer rationale
    pub result: String,
}

/// Final payload of a style extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleDone {
    /// Assigned style id
    pub id: i64,
    /// Style name
    pub name: String,
    /// Extracted style, as a JSON document
    pub style_description: String,
    /// Labels
    pub tags: Vec<String>,
}

/// Step-specific `done` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DonePayload {
    /// Rewrite finished
    Rewrite(RewriteDone),
    /// Review finished
    Review(ReviewDone),
    /// Style extraction finished
    Style(StyleDone),
}

/// One event of a step's stream, serialized as `{"type": ..., ...}`.
///
/// # Examples
///
/// ```
/// use scrivener_core::StepEvent;
///
/// let event = StepEvent::content("你好");
/// assert_eq!(event.to_json_line(), r#"{"type":"content","delta":"你好"}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepEvent {
    /// The step began work on a record
    Start {
        /// Step that started
        step: Step,
        /// Record the step writes to
        record_id: i64,
    },
    /// Coarse status
    Progress {
        /// Phase name, e.g. `rag` or `rewrite`
        step: String,
        /// Human-readable status
        message: String,
    },
    /// Incremental text
    Content {
        /// Text fragment
        delta: String,
    },
    /// The step finished
    Done(DonePayload),
    /// The step failed; terminal for the stream
    Error {
        /// Human-readable failure
        message: String,
    },
}

impl StepEvent {
    /// A progress event.
    pub fn progress(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Progress {
            step: step.into(),
            message: message.into(),
        }
    }

    /// A content delta.
    pub fn content(delta: impl Into<String>) -> Self {
        Self::Content {
            delta: delta.into(),
        }
    }

    /// An error event.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Whether this is an error event.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Single-line JSON form.
    pub fn to_json_line(&self) -> String {
        json_line(self)
    }
}

/// One event of a workflow stream: either a forwarded step event or a
/// step-completion snapshot serialized as `{"node": ..., "state": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkflowEvent {
    /// Forwarded from the running step
    Step(StepEvent),
    /// A step completed
    Node {
        /// The step that completed
        node: Step,
        /// State after the step
        state: Box<WorkflowState>,
    },
}

impl WorkflowEvent {
    /// A step-completion snapshot.
    pub fn node(node: Step, state: &WorkflowState) -> Self {
        Self::Node {
            node,
            state: Box::new(state.clone()),
        }
    }

    /// Single-line JSON form.
    pub fn to_json_line(&self) -> String {
        json_line(self)
    }
}

impl From<StepEvent> for WorkflowEvent {
    fn from(event: StepEvent) -> Self {
        Self::Step(event)
    }
}

fn json_line<T: Serialize>(value: &T) -> String {
    // Events contain only strings, numbers and maps with string keys.
    serde_json::to_string(value).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to serialize event");
        format!(r#"{{"type":"error","message":"{e}"}}"#)
    })
}
