//! Storage error types.

/// Kinds of storage errors raised by record repositories and workflow stores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// Record not found under the given identifier
    #[display("{} {} not found", entity, id)]
    NotFound {
        /// Entity name (e.g. "rewrite record")
        entity: &'static str,
        /// Identifier that was looked up
        id: i64,
    },
    /// Failed to write a record
    #[display("Failed to write {}: {}", entity, message)]
    Write {
        /// Entity name
        entity: &'static str,
        /// Error message
        message: String,
    },
    /// Storage backend is unavailable
    #[display("Storage unavailable: {}", _0)]
    Unavailable(String),
}

/// Storage error with location tracking.
///
/// # Examples
///
/// ```
/// use scrivener_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::NotFound { entity: "rewrite record", id: 7 });
/// assert!(format!("{}", err).contains("rewrite record 7 not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new storage error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for a not-found error.
    #[track_caller]
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::new(StorageErrorKind::NotFound { entity, id })
    }
}
