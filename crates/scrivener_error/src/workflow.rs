//! Workflow orchestration error types.

/// Specific error conditions for workflow operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum WorkflowErrorKind {
    /// No workflow is suspended at the decision gate for this rewrite
    #[display("No suspended workflow for rewrite {}", _0)]
    NotSuspended(i64),
    /// A collaborator required by the requested operation was not configured
    #[display("Collaborator not configured: {}", _0)]
    MissingCollaborator(&'static str),
    /// The workflow state does not allow the requested transition
    #[display("Invalid workflow state: {}", _0)]
    InvalidState(String),
}

/// Error type for workflow operations.
///
/// # Examples
///
/// ```
/// use scrivener_error::{WorkflowError, WorkflowErrorKind};
///
/// let err = WorkflowError::new(WorkflowErrorKind::NotSuspended(42));
/// assert!(format!("{}", err).contains("42"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Workflow Error: {} at line {} in {}", kind, line, file)]
pub struct WorkflowError {
    /// The specific error condition
    pub kind: WorkflowErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl WorkflowError {
    /// Create a new WorkflowError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: WorkflowErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
