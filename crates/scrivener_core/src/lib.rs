//! Core data types for the Scrivener rewriting workflow.
//!
//! This crate provides the plain data shared by every other Scrivener crate:
//! chat requests, persisted record shapes, the workflow state threaded through
//! each step, and the event types streamed to callers.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod event;
mod feedback;
mod message;
mod record;
mod request;
mod role;
mod snippet;
mod telemetry;
mod workflow;

pub use event::{DonePayload, ReviewDone, RewriteDone, StepEvent, StyleDone, WorkflowEvent};
pub use feedback::{AiDetection, QualityScores, ReviewFeedback, ReviewIssue, ReviewVerdict};
pub use message::Message;
pub use record::{
    NewReview, NewRewrite, RecordStatus, ReviewRecord, ReviewResult, RewriteRecord, WritingStyle,
};
pub use request::{ChatRequest, ChatRequestBuilder};
pub use role::Role;
pub use snippet::Snippet;
pub use telemetry::{TelemetryError, init_tracing, shutdown_tracing};
pub use workflow::{
    CoverReference, HumanDecision, ReviewOutcome, Step, WorkflowInput, WorkflowInputBuilder,
    WorkflowState, WorkflowStatus,
};
