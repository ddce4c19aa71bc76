//! Top-level error wrapper types.

use crate::{
    BuilderError, ConfigError, ModelError, StorageError, StorageErrorKind, ValidationError,
    WorkflowError, WorkflowErrorKind,
};

/// Every error condition a Scrivener crate can raise.
///
/// # Examples
///
/// ```
/// use scrivener_error::{ModelError, ModelErrorKind, ScrivenerError};
///
/// let model_err = ModelError::new(ModelErrorKind::Http("connection refused".to_string()));
/// let err: ScrivenerError = model_err.into();
/// assert!(format!("{}", err).contains("connection refused"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum ScrivenerErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Builder error
    #[from(BuilderError)]
    Builder(BuilderError),
    /// Storage error
    #[from(StorageError)]
    Storage(StorageError),
    /// Model client error
    #[from(ModelError)]
    Model(ModelError),
    /// Validation error
    #[from(ValidationError)]
    Validation(ValidationError),
    /// Workflow error
    #[from(WorkflowError)]
    Workflow(WorkflowError),
}

/// Scrivener error with kind discrimination.
///
/// # Examples
///
/// ```
/// use scrivener_error::{ScrivenerError, ScrivenerResult, ConfigError};
///
/// fn might_fail() -> ScrivenerResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Scrivener Error: {}", _0)]
pub struct ScrivenerError(Box<ScrivenerErrorKind>);

impl ScrivenerError {
    /// Create a new error from a kind.
    pub fn new(kind: ScrivenerErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ScrivenerErrorKind {
        &self.0
    }

    /// Whether this error rejects caller input rather than reporting a failure.
    pub fn is_validation(&self) -> bool {
        matches!(self.kind(), ScrivenerErrorKind::Validation(_))
    }

    /// Whether this error reports a missing entity or suspended workflow.
    ///
    /// # Examples
    ///
    /// ```
    /// use scrivener_error::{ScrivenerError, WorkflowError, WorkflowErrorKind};
    ///
    /// let err: ScrivenerError = WorkflowError::new(WorkflowErrorKind::NotSuspended(1)).into();
    /// assert!(err.is_not_found());
    /// ```
    pub fn is_not_found(&self) -> bool {
        match self.kind() {
            ScrivenerErrorKind::Validation(e) => e.is_not_found(),
            ScrivenerErrorKind::Storage(e) => matches!(e.kind, StorageErrorKind::NotFound { .. }),
            ScrivenerErrorKind::Workflow(e) => {
                matches!(e.kind, WorkflowErrorKind::NotSuspended(_))
            }
            _ => false,
        }
    }

    /// The innermost human-readable message, without location details.
    pub fn user_message(&self) -> String {
        match self.kind() {
            ScrivenerErrorKind::Config(e) => e.message.clone(),
            ScrivenerErrorKind::Builder(e) => e.kind().to_string(),
            ScrivenerErrorKind::Storage(e) => e.kind.to_string(),
            ScrivenerErrorKind::Model(e) => e.kind.to_string(),
            ScrivenerErrorKind::Validation(e) => e.kind.to_string(),
            ScrivenerErrorKind::Workflow(e) => e.kind.to_string(),
        }
    }
}

// Generic From implementation for any type that converts to ScrivenerErrorKind
impl<T> From<T> for ScrivenerError
where
    T: Into<ScrivenerErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Scrivener operations.
pub type ScrivenerResult<T> = std::result::Result<T, ScrivenerError>;
