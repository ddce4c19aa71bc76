//! Validation errors surfaced before any workflow step executes.

/// Specific validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ValidationErrorKind {
    /// Source article is empty after trimming
    #[display("Source article is empty")]
    EmptySource,
    /// Target word count must be positive
    #[display("Target word count must be positive, got {}", _0)]
    InvalidTargetWords(u32),
    /// Retry ceiling outside the accepted range
    #[display("Retry ceiling must be at most {}, got {}", max, value)]
    InvalidRetryCeiling {
        /// Requested ceiling
        value: u32,
        /// Largest accepted ceiling
        max: u32,
    },
    /// Writing style does not exist
    #[display("Writing style not found: {}", _0)]
    StyleNotFound(i64),
    /// Rewrite record does not exist
    #[display("Rewrite record not found: {}", _0)]
    RewriteNotFound(i64),
    /// Review record does not exist
    #[display("Review record not found: {}", _0)]
    ReviewNotFound(i64),
    /// Content too short for the requested operation
    #[display("Content too short: need at least {} characters, got {}", min, actual)]
    ContentTooShort {
        /// Minimum accepted length
        min: usize,
        /// Actual length
        actual: usize,
    },
    /// Manual edit resumed without edited text
    #[display("Edited content is empty")]
    EmptyEdit,
    /// URL input could not be turned into article text
    #[display("Could not fetch article from URL: {}", _0)]
    UrlFetch(String),
    /// Style extraction was given no non-blank reference article
    #[display("At least one non-blank reference article is required")]
    NoReferenceArticles,
    /// Style name is blank
    #[display("Style name is empty")]
    EmptyStyleName,
}

/// Validation error with location tracking.
///
/// # Examples
///
/// ```
/// use scrivener_error::{ValidationError, ValidationErrorKind};
///
/// let err = ValidationError::new(ValidationErrorKind::StyleNotFound(3));
/// assert!(format!("{}", err).contains("Writing style not found: 3"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Validation Error: {} at line {} in {}", kind, line, file)]
pub struct ValidationError {
    /// The specific validation failure
    pub kind: ValidationErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl ValidationError {
    /// Create a new ValidationError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ValidationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Whether the failure names a missing entity.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.kind,
            ValidationErrorKind::StyleNotFound(_)
                | ValidationErrorKind::RewriteNotFound(_)
                | ValidationErrorKind::ReviewNotFound(_)
        )
    }
}
