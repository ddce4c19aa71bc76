//! Collaborator traits for the Scrivener rewriting workflow.
//!
//! The workflow engine talks to language models, retrieval, image
//! generation, article fetching and persistence only through the traits in
//! this crate.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod repository;
mod store;
mod traits;
mod types;

pub use repository::{ReviewRepository, RewriteRepository, StyleRepository};
pub use store::SuspendedWorkflowStore;
pub use traits::{
    ArticleFetcher, ChatDriver, CoverGenerator, ImageGeneration, Retrieval, Streaming, TextStream,
};
pub use types::{CoverRequest, CoverRequestBuilder, GeneratedImage};
