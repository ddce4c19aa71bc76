//! Error types for the Scrivener rewriting workflow.
//!
//! This crate provides the foundation error types used throughout the Scrivener workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use scrivener_error::{ScrivenerResult, ValidationError, ValidationErrorKind};
//!
//! fn check_words(target: u32) -> ScrivenerResult<u32> {
//!     if target == 0 {
//!         Err(ValidationError::new(ValidationErrorKind::InvalidTargetWords(target)))?
//!     }
//!     Ok(target)
//! }
//!
//! let err = check_words(0).unwrap_err();
//! assert!(err.is_validation());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod config;
mod error;
mod model;
mod storage;
mod validation;
mod workflow;

pub use builder::{BuilderError, BuilderErrorKind};
pub use config::ConfigError;
pub use error::{ScrivenerError, ScrivenerErrorKind, ScrivenerResult};
pub use model::{ModelError, ModelErrorKind};
pub use storage::{StorageError, StorageErrorKind};
pub use validation::{ValidationError, ValidationErrorKind};
pub use workflow::{WorkflowError, WorkflowErrorKind};
